//! Scheduled interventions: requests, pending operations, and delivery records.
//!
//! Callers build an [`OperationRequest`]; the scheduler stamps it with a
//! [`SequenceId`] and stores it as an immutable [`PendingOperation`] until
//! it is flushed and delivered.
//!
//! # Ordering
//!
//! Operations due at the same instant execute in a fixed total order:
//! `(scheduled_time, priority, sequence_id)`, where priority is fixed by
//! kind (Seed=0, Washout=10, Feed=20, Treat=30; lower runs first).

use std::cmp::Ordering;
use std::fmt;

use crate::id::{CellLineId, CompoundId, SequenceId, VesselId};

/// The kind of an intervention. Determines its priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    /// Create the vessel's population.
    Seed,
    /// Remove compounds from the medium.
    Washout,
    /// Replace the medium's nutrients.
    Feed,
    /// Add a compound dose.
    Treat,
}

impl OperationKind {
    /// Fixed priority; lower executes first.
    pub const fn priority(self) -> u8 {
        match self {
            Self::Seed => 0,
            Self::Washout => 10,
            Self::Feed => 20,
            Self::Treat => 30,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Seed => "seed",
            Self::Washout => "washout",
            Self::Feed => "feed",
            Self::Treat => "treat",
        })
    }
}

/// What an operation does when delivered.
///
/// # Examples
///
/// ```
/// use vitro_core::{OperationKind, OperationPayload};
///
/// let feed = OperationPayload::Feed { glucose_mm: 25.0, glutamine_mm: 4.0 };
/// assert_eq!(feed.kind(), OperationKind::Feed);
/// assert_eq!(feed.kind().priority(), 20);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum OperationPayload {
    /// Seed `cell_count` cells of `cell_line`, of which `viability` are alive.
    Seed {
        /// Cell line to seed.
        cell_line: CellLineId,
        /// Total cells placed in the vessel.
        cell_count: f64,
        /// Fraction of seeded cells that are viable, in `(0, 1]`.
        viability: f64,
    },
    /// Add `dose_um` micromolar of `compound` to the medium.
    Treat {
        /// The compound.
        compound: CompoundId,
        /// Dose in micromolar.
        dose_um: f64,
    },
    /// Replace the medium's nutrients with fresh levels.
    Feed {
        /// Fresh glucose concentration in millimolar.
        glucose_mm: f64,
        /// Fresh glutamine concentration in millimolar.
        glutamine_mm: f64,
    },
    /// Remove one compound, or every compound when `None`.
    Washout {
        /// Compound to remove.
        compound: Option<CompoundId>,
    },
}

impl OperationPayload {
    /// The kind this payload belongs to.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Seed { .. } => OperationKind::Seed,
            Self::Treat { .. } => OperationKind::Treat,
            Self::Feed { .. } => OperationKind::Feed,
            Self::Washout { .. } => OperationKind::Washout,
        }
    }

    /// Structural validation performed at submission time.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Seed {
                cell_count,
                viability,
                ..
            } => {
                if !cell_count.is_finite() || *cell_count <= 0.0 {
                    return Err(format!("cell_count must be finite and > 0, got {cell_count}"));
                }
                if !viability.is_finite() || *viability <= 0.0 || *viability > 1.0 {
                    return Err(format!("viability must be in (0, 1], got {viability}"));
                }
            }
            Self::Treat { dose_um, .. } => {
                if !dose_um.is_finite() || *dose_um < 0.0 {
                    return Err(format!("dose_um must be finite and >= 0, got {dose_um}"));
                }
            }
            Self::Feed {
                glucose_mm,
                glutamine_mm,
            } => {
                for (name, v) in [("glucose_mm", glucose_mm), ("glutamine_mm", glutamine_mm)] {
                    if !v.is_finite() || *v < 0.0 {
                        return Err(format!("{name} must be finite and >= 0, got {v}"));
                    }
                }
            }
            Self::Washout { .. } => {}
        }
        Ok(())
    }
}

/// A not-yet-sequenced submission.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationRequest {
    /// Vessel the operation acts on.
    pub target_vessel: VesselId,
    /// Simulated hour at which the operation takes effect.
    pub scheduled_time: f64,
    /// The intervention.
    pub payload: OperationPayload,
}

/// An operation held by the scheduler. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingOperation {
    target_vessel: VesselId,
    scheduled_time: f64,
    sequence_id: SequenceId,
    payload: OperationPayload,
}

impl PendingOperation {
    /// Stamp a request with its submission sequence number.
    pub fn new(request: OperationRequest, sequence_id: SequenceId) -> Self {
        Self {
            target_vessel: request.target_vessel,
            scheduled_time: request.scheduled_time,
            sequence_id,
            payload: request.payload,
        }
    }

    /// Vessel the operation acts on.
    pub fn target_vessel(&self) -> VesselId {
        self.target_vessel
    }

    /// When the operation takes effect.
    pub fn scheduled_time(&self) -> f64 {
        self.scheduled_time
    }

    /// Submission counter, the final tie-break.
    pub fn sequence_id(&self) -> SequenceId {
        self.sequence_id
    }

    /// The intervention.
    pub fn payload(&self) -> &OperationPayload {
        &self.payload
    }

    /// Kind derived from the payload.
    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }

    /// Fixed priority of this operation's kind.
    pub fn priority(&self) -> u8 {
        self.kind().priority()
    }

    /// Total delivery order: `(scheduled_time, priority, sequence_id)`.
    pub fn delivery_cmp(&self, other: &Self) -> Ordering {
        self.scheduled_time
            .total_cmp(&other.scheduled_time)
            .then(self.priority().cmp(&other.priority()))
            .then(self.sequence_id.cmp(&other.sequence_id))
    }
}

/// Record of one delivered operation, in delivery order.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliveryRecord {
    /// The vessel acted on.
    pub vessel: VesselId,
    /// Kind of operation.
    pub kind: OperationKind,
    /// Submission counter of the operation.
    pub sequence_id: SequenceId,
    /// When it was scheduled.
    pub scheduled_time: f64,
    /// Start of the interval it was delivered in.
    pub delivered_at: f64,
    /// Viable cells removed instantly by this delivery.
    pub cells_killed: f64,
}
