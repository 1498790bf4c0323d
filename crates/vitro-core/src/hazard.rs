//! Competing-risks hazard engine.
//!
//! One [`HazardCycle`] per vessel per interval. Mechanisms `propose`
//! `(cause, rate)` pairs independently and in any order; `commit` reduces
//! them deterministically into a single survival outcome:
//!
//! ```text
//! Λ        = Σ λ_i
//! P(death) = 1 − exp(−Λ·dt)
//! killed_i = viable · P(death) · λ_i / Λ
//! ```
//!
//! The cycle is a typestate (`Proposing` → `Committed`) so committing
//! twice or proposing after commit does not compile. The vessel carries a
//! runtime [`HazardPhase`] marker as well, which is what
//! [`VesselState::apply_instant_kill`] checks: the cycle does not borrow
//! the vessel, so mechanisms can read it while proposals accumulate.

use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

use crate::error::{ConservationError, KernelError, PhaseError};
use crate::id::{DeathCause, VesselId};
use crate::ledger::CONSERVATION_TOLERANCE;
use crate::time::Interval;
use crate::vessel::VesselState;

/// Per-vessel hazard phase marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HazardPhase {
    /// No cycle open; instantaneous kills are allowed.
    Idle,
    /// Proposals are being collected for the interval starting at `t0`.
    Proposing {
        /// Start of the interval being proposed for.
        t0: f64,
    },
    /// The interval starting at `t0` has been committed but not finished.
    Committed {
        /// Start of the committed interval.
        t0: f64,
    },
}

impl fmt::Display for HazardPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Proposing { t0 } => write!(f, "ProposingHazards(t0={t0})"),
            Self::Committed { t0 } => write!(f, "Committed(t0={t0})"),
        }
    }
}

/// One mechanism's hazard for the current interval.
#[derive(Clone, Debug, PartialEq)]
pub struct HazardProposal {
    /// Cause the resulting deaths are attributed to.
    pub cause: DeathCause,
    /// Instantaneous rate, per hour.
    pub rate_per_h: f64,
    /// The interval this proposal applies to.
    pub interval: Interval,
}

/// Result of one committed cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitRecord {
    /// The vessel.
    pub vessel: VesselId,
    /// The interval committed.
    pub interval: Interval,
    /// Combined hazard `Λ`, per hour.
    pub total_hazard_per_h: f64,
    /// `exp(−Λ·dt)`.
    pub survival_probability: f64,
    /// Cells removed by this commit.
    pub cells_killed: f64,
    /// Cells removed per cause, in cause order.
    pub by_cause: SmallVec<[(DeathCause, f64); 4]>,
}

/// Typestate: collecting proposals.
#[derive(Debug)]
pub struct Proposing {
    proposals: SmallVec<[HazardProposal; 8]>,
}

/// Typestate: outcome applied to the vessel, awaiting `finish`.
#[derive(Debug)]
pub struct Committed {
    record: CommitRecord,
}

/// A propose/commit cycle for one vessel over one interval.
#[derive(Debug)]
pub struct HazardCycle<S> {
    vessel: VesselId,
    interval: Interval,
    state: S,
}

impl<S> HazardCycle<S> {
    /// The vessel this cycle belongs to.
    pub fn vessel(&self) -> VesselId {
        self.vessel
    }

    /// The interval this cycle covers.
    pub fn interval(&self) -> Interval {
        self.interval
    }
}

impl HazardCycle<Proposing> {
    /// Open a cycle on `vessel` for `interval`.
    pub fn begin(vessel: &mut VesselState, interval: Interval) -> Result<Self, PhaseError> {
        if vessel.phase != HazardPhase::Idle {
            return Err(PhaseError::CycleAlreadyOpen {
                vessel: vessel.id(),
                phase: vessel.phase,
            });
        }
        vessel.phase = HazardPhase::Proposing { t0: interval.t0() };
        Ok(Self {
            vessel: vessel.id(),
            interval,
            state: Proposing {
                proposals: SmallVec::new(),
            },
        })
    }

    /// Record a hazard. Never touches the vessel.
    pub fn propose(&mut self, cause: DeathCause, rate_per_h: f64) -> Result<(), KernelError> {
        if !rate_per_h.is_finite() || rate_per_h < 0.0 {
            return Err(KernelError::InvalidHazardRate {
                cause,
                rate: rate_per_h,
            });
        }
        self.state.proposals.push(HazardProposal {
            cause,
            rate_per_h,
            interval: self.interval,
        });
        Ok(())
    }

    /// Proposals collected so far, in arrival order.
    pub fn proposals(&self) -> &[HazardProposal] {
        &self.state.proposals
    }

    /// Reduce the proposals and apply the outcome to `vessel`.
    ///
    /// On error the vessel's marker stays in `Proposing`; the vessel is
    /// poisoned and the session must halt.
    pub fn commit(self, vessel: &mut VesselState) -> Result<HazardCycle<Committed>, KernelError> {
        let t0 = self.interval.t0();
        let expected = HazardPhase::Proposing { t0 };
        if vessel.id() != self.vessel || !same_phase(vessel.phase, expected) {
            return Err(PhaseError::WrongPhase {
                vessel: vessel.id(),
                phase: vessel.phase,
                expected: "ProposingHazards",
            }
            .into());
        }
        if let Some(last_t1) = vessel.ledger().last_committed_t1() {
            if t0 < last_t1 {
                return Err(ConservationError::OverlappingCommit {
                    vessel: self.vessel,
                    t0,
                    last_committed_t1: last_t1,
                }
                .into());
            }
        }

        let by_rate = reduce(self.state.proposals);
        let total_hazard: f64 = by_rate.values().sum();
        let dt = self.interval.dt();
        let viable = vessel.viable_cells();
        let survival = (-total_hazard * dt).exp();
        let p_death = -(-total_hazard * dt).exp_m1();
        let killed = (viable * p_death).min(viable);

        // The last cause takes the remainder so the shares sum to `killed`
        // exactly, even when rounding is ulp-sized against a tiny `viable`.
        let mut by_cause: SmallVec<[(DeathCause, f64); 4]> = SmallVec::new();
        let mut allocated = 0.0;
        if killed > 0.0 {
            let last = by_rate.iter().rposition(|(_, rate)| *rate > 0.0);
            for (i, (cause, rate)) in by_rate.into_iter().enumerate() {
                let share = if Some(i) == last {
                    (killed - allocated).max(0.0)
                } else {
                    (killed * (rate / total_hazard)).min(killed - allocated)
                };
                if share > 0.0 {
                    allocated += share;
                    by_cause.push((cause, share));
                }
            }
        }
        if allocated > viable * (1.0 + CONSERVATION_TOLERANCE) {
            return Err(ConservationError::KillExceedsViable {
                vessel: self.vessel,
                requested: allocated,
                viable,
            }
            .into());
        }

        for (cause, share) in &by_cause {
            vessel
                .ledger_mut()
                .record(self.vessel, cause.clone(), *share)?;
        }
        vessel.kill_from_commit(allocated);
        vessel.ledger_mut().mark_committed(self.interval.t1());
        vessel.ledger().check(self.vessel, vessel.viable_cells())?;
        vessel.phase = HazardPhase::Committed { t0 };

        tracing::trace!(
            vessel = %self.vessel,
            interval = %self.interval,
            total_hazard,
            killed = allocated,
            "hazard cycle committed"
        );

        Ok(HazardCycle {
            vessel: self.vessel,
            interval: self.interval,
            state: Committed {
                record: CommitRecord {
                    vessel: self.vessel,
                    interval: self.interval,
                    total_hazard_per_h: total_hazard,
                    survival_probability: survival,
                    cells_killed: allocated,
                    by_cause,
                },
            },
        })
    }
}

impl HazardCycle<Committed> {
    /// The committed outcome.
    pub fn record(&self) -> &CommitRecord {
        &self.state.record
    }

    /// Close the cycle and return the vessel to `Idle`.
    pub fn finish(self, vessel: &mut VesselState) -> Result<CommitRecord, PhaseError> {
        let expected = HazardPhase::Committed {
            t0: self.interval.t0(),
        };
        if vessel.id() != self.vessel || !same_phase(vessel.phase, expected) {
            return Err(PhaseError::WrongPhase {
                vessel: vessel.id(),
                phase: vessel.phase,
                expected: "Committed",
            });
        }
        vessel.phase = HazardPhase::Idle;
        Ok(self.state.record)
    }
}

/// Sum rates per cause after a canonical sort, so the result depends only
/// on the multiset of `(cause, rate)` pairs.
fn reduce(mut proposals: SmallVec<[HazardProposal; 8]>) -> BTreeMap<DeathCause, f64> {
    proposals.sort_by(|a, b| {
        a.cause
            .cmp(&b.cause)
            .then_with(|| a.rate_per_h.to_bits().cmp(&b.rate_per_h.to_bits()))
    });
    let mut by_rate: BTreeMap<DeathCause, f64> = BTreeMap::new();
    for p in proposals {
        *by_rate.entry(p.cause).or_insert(0.0) += p.rate_per_h;
    }
    by_rate
}

fn same_phase(a: HazardPhase, b: HazardPhase) -> bool {
    match (a, b) {
        (HazardPhase::Idle, HazardPhase::Idle) => true,
        (HazardPhase::Proposing { t0: x }, HazardPhase::Proposing { t0: y })
        | (HazardPhase::Committed { t0: x }, HazardPhase::Committed { t0: y }) => {
            x.to_bits() == y.to_bits()
        }
        _ => false,
    }
}
