//! Error taxonomy for the simulation kernel.
//!
//! Organised by the contract that was violated:
//!
//! - [`IntervalError`]: malformed time inputs (negative or non-finite `dt`).
//! - [`CausalityError`]: an effect before its cause (past scheduling,
//!   observations that precede their treatment).
//! - [`PhaseError`]: instantaneous kill or commit outside the allowed
//!   hazard phase.
//! - [`ConservationError`]: the death ledger would exceed the population
//!   or double count an interval.
//!
//! [`ParamsError`] is raised only while loading a parameter table.
//!
//! [`KernelError`] unifies the per-vessel contracts; [`StepError`] adds the
//! vessel and interval the violation happened in. None of these are
//! recoverable runtime conditions: the tick driver halts the session.

use crate::hazard::HazardPhase;
use crate::id::{DeathCause, OperationHandle, StressAxis, VesselId};
use crate::time::Interval;

/// Malformed time input.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum IntervalError {
    /// `dt` is negative, NaN, or infinite.
    #[error("dt must be finite and >= 0, got {dt}")]
    InvalidDt {
        /// The rejected step length.
        dt: f64,
    },
    /// The interval start is not finite.
    #[error("interval start must be finite, got {t0}")]
    InvalidStart {
        /// The rejected start time.
        t0: f64,
    },
    /// An interval was committed that does not start at the clock's `now`.
    #[error("clock at t={now} cannot commit an interval starting at t={t0}")]
    NotContiguous {
        /// Current clock time.
        now: f64,
        /// Start of the offending interval.
        t0: f64,
    },
}

/// An effect was requested before its cause.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CausalityError {
    /// An operation was scheduled earlier than the current clock time.
    #[error("cannot schedule at t={scheduled_time}: clock is already at t={now}")]
    ScheduledInPast {
        /// Requested delivery time.
        scheduled_time: f64,
        /// Current clock time.
        now: f64,
    },
    /// An observation record claims to precede the treatment it measures.
    #[error(
        "observation at t={observation_time} precedes its treatment start at t={treatment_start_time}"
    )]
    ObservationBeforeTreatment {
        /// When the observation was taken.
        observation_time: f64,
        /// When the causally related treatment began.
        treatment_start_time: f64,
    },
    /// A timestamp was NaN or infinite.
    #[error("timestamp must be finite, got {time}")]
    NonFiniteTime {
        /// The rejected timestamp.
        time: f64,
    },
}

/// Hazard phase ordering was violated.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PhaseError {
    /// An instantaneous kill was attempted while a propose/commit cycle was open.
    #[error("instant kill on {vessel} rejected: vessel is in phase {phase}")]
    InstantKillDuringHazardPhase {
        /// The vessel.
        vessel: VesselId,
        /// The phase the vessel was in.
        phase: HazardPhase,
    },
    /// A hazard cycle was opened on a vessel that is not idle.
    #[error("cannot open hazard cycle on {vessel}: vessel is in phase {phase}")]
    CycleAlreadyOpen {
        /// The vessel.
        vessel: VesselId,
        /// The phase the vessel was in.
        phase: HazardPhase,
    },
    /// Commit or finish was called on a vessel not in the matching phase.
    #[error("{vessel} is in phase {phase}, expected {expected}")]
    WrongPhase {
        /// The vessel.
        vessel: VesselId,
        /// The phase the vessel was in.
        phase: HazardPhase,
        /// The phase the caller required.
        expected: &'static str,
    },
}

/// The death ledger's conservation guarantees would be broken.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConservationError {
    /// Total dead fraction would exceed 1.0.
    #[error("{vessel}: total dead fraction {total_fraction} exceeds 1.0")]
    LedgerOverflow {
        /// The vessel.
        vessel: VesselId,
        /// The offending total.
        total_fraction: f64,
    },
    /// A kill would remove more cells than are viable.
    #[error("{vessel}: cannot kill {requested} cells, only {viable} viable")]
    KillExceedsViable {
        /// The vessel.
        vessel: VesselId,
        /// Cells the commit tried to remove.
        requested: f64,
        /// Viable cells available.
        viable: f64,
    },
    /// A commit overlaps an interval that has already been committed.
    #[error(
        "{vessel}: commit for interval starting t={t0} overlaps committed interval ending t={last_committed_t1}"
    )]
    OverlappingCommit {
        /// The vessel.
        vessel: VesselId,
        /// Start of the rejected interval.
        t0: f64,
        /// End of the most recent committed interval.
        last_committed_t1: f64,
    },
    /// A kill fraction outside `[0, 1]`.
    #[error("{vessel}: kill fraction {fraction} outside [0, 1]")]
    InvalidKillFraction {
        /// The vessel.
        vessel: VesselId,
        /// The rejected fraction.
        fraction: f64,
    },
    /// A ledger entry became negative or non-finite.
    #[error("{vessel}: ledger entry for {cause} is {count}")]
    CorruptEntry {
        /// The vessel.
        vessel: VesselId,
        /// The affected cause.
        cause: DeathCause,
        /// The invalid count.
        count: f64,
    },
}

/// Per-vessel kernel contract violations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum KernelError {
    /// See [`PhaseError`].
    #[error("phase ordering: {0}")]
    Phase(#[from] PhaseError),
    /// See [`ConservationError`].
    #[error("conservation: {0}")]
    Conservation(#[from] ConservationError),
    /// See [`CausalityError`].
    #[error("causality: {0}")]
    Causality(#[from] CausalityError),
    /// See [`IntervalError`].
    #[error("interval: {0}")]
    Interval(#[from] IntervalError),
    /// A proposed hazard rate was negative or non-finite.
    #[error("hazard rate {rate} for {cause} must be finite and >= 0")]
    InvalidHazardRate {
        /// The proposing cause.
        cause: DeathCause,
        /// The rejected rate (per hour).
        rate: f64,
    },
    /// A mechanism staged a latent value outside `[0, 1]`.
    #[error("latent axis {axis} staged value {value} outside [0, 1]")]
    LatentOutOfRange {
        /// The axis.
        axis: StressAxis,
        /// The rejected value.
        value: f64,
    },
    /// The parameter provider has no entry for an entity.
    #[error("no parameters for {entity}")]
    MissingParameters {
        /// Human-readable entity description (`cell line HepG2`, ...).
        entity: String,
    },
    /// An operation targeted a vessel that has not been seeded.
    #[error("{vessel} has not been seeded")]
    VesselNotSeeded {
        /// The vessel.
        vessel: VesselId,
    },
    /// A seed operation targeted a vessel that already exists.
    #[error("{vessel} is already seeded")]
    AlreadySeeded {
        /// The vessel.
        vessel: VesselId,
    },
    /// An operation payload is physically meaningless.
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// What is wrong with it.
        reason: String,
    },
}

impl KernelError {
    /// Short name of the violated contract, for diagnostics.
    pub fn contract(&self) -> &'static str {
        match self {
            Self::Phase(_) => "phase-ordering",
            Self::Conservation(_) => "conservation",
            Self::Causality(_) => "causality",
            Self::Interval(_) | Self::LatentOutOfRange { .. } => "numerical",
            Self::InvalidHazardRate { .. } => "hazard-proposal",
            Self::MissingParameters { .. } => "parameters",
            Self::VesselNotSeeded { .. }
            | Self::AlreadySeeded { .. }
            | Self::InvalidPayload { .. } => "delivery",
        }
    }
}

/// Failure inside a registered mechanism.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MechanismError {
    /// The mechanism could not run.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The mechanism produced a NaN or infinity.
    #[error("non-finite value for {quantity}")]
    NonFinite {
        /// Which quantity went non-finite.
        quantity: String,
    },
    /// A kernel contract was violated while the mechanism ran.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Failure loading a parameter table.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    /// The input is not a well-formed parameter table.
    #[error("malformed parameter JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A constant is non-finite or out of range.
    #[error("invalid parameters: {0}")]
    Invalid(String),
}

/// Rejections from the operation submission API.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SubmitError {
    /// Scheduled into the past, or a non-finite time.
    #[error(transparent)]
    Causality(#[from] CausalityError),
    /// The pending queue is at capacity.
    #[error("pending operation queue is full ({capacity})")]
    QueueFull {
        /// Configured capacity.
        capacity: usize,
    },
    /// The handle is not pending (never submitted, withdrawn, or delivered).
    #[error("{0} is not pending")]
    UnknownHandle(OperationHandle),
    /// The payload failed validation.
    #[error("invalid payload: {reason}")]
    InvalidPayload {
        /// What is wrong with it.
        reason: String,
    },
    /// The session halted after a contract violation.
    #[error("session halted after a contract violation")]
    Halted,
}

/// Fatal error from `advance_time`, naming the vessel, interval, and contract.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum StepError {
    /// A per-vessel kernel contract was violated.
    #[error("{vessel} over {interval} violated {}: {source}", .source.contract())]
    Vessel {
        /// The vessel being stepped.
        vessel: VesselId,
        /// The interval being stepped.
        interval: Interval,
        /// The violation.
        source: KernelError,
    },
    /// A mechanism failed.
    #[error("mechanism '{name}' failed on {vessel} over {interval}: {source}")]
    MechanismFailed {
        /// Mechanism name.
        name: String,
        /// The vessel being stepped.
        vessel: VesselId,
        /// The interval being stepped.
        interval: Interval,
        /// The failure.
        source: MechanismError,
    },
    /// The requested advance was malformed.
    #[error(transparent)]
    Interval(#[from] IntervalError),
    /// A previous contract violation halted the session.
    #[error("session halted at t={at} after a contract violation")]
    Halted {
        /// Clock time when the session halted.
        at: f64,
    },
}

impl StepError {
    /// Short name of the violated contract.
    pub fn contract(&self) -> &'static str {
        match self {
            Self::Vessel { source, .. } => source.contract(),
            Self::MechanismFailed { .. } => "mechanism",
            Self::Interval(_) => "numerical",
            Self::Halted { .. } => "halted",
        }
    }

    /// The vessel involved, if the failure was vessel-specific.
    pub fn vessel(&self) -> Option<VesselId> {
        match self {
            Self::Vessel { vessel, .. } | Self::MechanismFailed { vessel, .. } => Some(*vessel),
            Self::Interval(_) | Self::Halted { .. } => None,
        }
    }
}
