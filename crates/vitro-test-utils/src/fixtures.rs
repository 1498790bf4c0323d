//! Reusable mechanism fixtures.
//!
//! - [`ConstHazard`]: proposes a constant rate for one cause.
//! - [`AxisPin`]: pins one stress axis to a fixed value.
//! - [`FailingMechanism`]: fails deterministically after N proposals.

use std::sync::atomic::{AtomicUsize, Ordering};

use vitro_core::{DeathCause, HazardCycle, MechanismError, Proposing, StressAxis};
use vitro_mechanism::{LatentWrites, Mechanism, StepContext};

/// Proposes a constant hazard for one cause every interval.
pub struct ConstHazard {
    pub name: String,
    pub cause: DeathCause,
    pub rate_per_h: f64,
    pub max_dt: Option<f64>,
}

impl ConstHazard {
    pub fn new(name: impl Into<String>, cause: DeathCause, rate_per_h: f64) -> Self {
        Self {
            name: name.into(),
            cause,
            rate_per_h,
            max_dt: None,
        }
    }

    /// Constant [`DeathCause::Baseline`] hazard.
    pub fn baseline(name: impl Into<String>, rate_per_h: f64) -> Self {
        Self::new(name, DeathCause::Baseline, rate_per_h)
    }

    pub fn with_max_dt(mut self, max_dt: f64) -> Self {
        self.max_dt = Some(max_dt);
        self
    }
}

impl Mechanism for ConstHazard {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_dt(&self) -> Option<f64> {
        self.max_dt
    }

    fn propose(
        &self,
        _ctx: &StepContext<'_>,
        cycle: &mut HazardCycle<Proposing>,
    ) -> Result<(), MechanismError> {
        cycle.propose(self.cause.clone(), self.rate_per_h)?;
        Ok(())
    }
}

/// Stages the same value for one axis every interval.
///
/// A value outside `[0, 1]` exercises the stepper's latent range check.
pub struct AxisPin {
    pub name: String,
    pub axis: StressAxis,
    pub value: f64,
}

impl AxisPin {
    pub fn new(name: impl Into<String>, axis: StressAxis, value: f64) -> Self {
        Self {
            name: name.into(),
            axis,
            value,
        }
    }
}

impl Mechanism for AxisPin {
    fn name(&self) -> &str {
        &self.name
    }

    fn writes_axes(&self) -> Vec<StressAxis> {
        vec![self.axis]
    }

    fn advance(
        &self,
        _ctx: &StepContext<'_>,
        writes: &mut LatentWrites,
    ) -> Result<(), MechanismError> {
        writes.stage(self.axis, self.value)
    }
}

/// Fails deterministically after a configurable number of successful
/// `propose` calls.
///
/// Uses `AtomicUsize` for the call counter so it satisfies `Sync`.
pub struct FailingMechanism {
    pub name: String,
    pub succeed_count: usize,
    call_count: AtomicUsize,
}

impl FailingMechanism {
    /// Create a mechanism that succeeds `succeed_count` times then fails.
    pub fn new(name: impl Into<String>, succeed_count: usize) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            call_count: AtomicUsize::new(0),
        }
    }

    /// How many times `propose()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Mechanism for FailingMechanism {
    fn name(&self) -> &str {
        &self.name
    }

    fn propose(
        &self,
        _ctx: &StepContext<'_>,
        _cycle: &mut HazardCycle<Proposing>,
    ) -> Result<(), MechanismError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(MechanismError::ExecutionFailed {
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(())
    }
}
