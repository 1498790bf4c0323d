//! The [`Mechanism`] trait.

use vitro_core::{HazardCycle, MechanismError, Proposing, StressAxis};

use crate::context::StepContext;
use crate::writes::LatentWrites;

/// A modular, stateless source of dynamics or death pressure.
///
/// # Contract
///
/// - Both hooks MUST be deterministic: same context, same output.
/// - `&self`: mechanisms are stateless; all state lives on the vessel.
/// - `writes_axes()` is called once at registration, not per step.
/// - `propose` may be called in any order relative to other mechanisms;
///   only the multiset of `(cause, rate)` pairs affects the outcome.
///
/// # Object safety
///
/// The engine stores mechanisms as `Vec<Box<dyn Mechanism>>`.
///
/// # Examples
///
/// A mechanism proposing a fixed hazard:
///
/// ```
/// use vitro_core::{DeathCause, HazardCycle, MechanismError, Proposing};
/// use vitro_mechanism::{Mechanism, StepContext};
///
/// struct Background(f64);
///
/// impl Mechanism for Background {
///     fn name(&self) -> &str { "background" }
///
///     fn propose(
///         &self,
///         _ctx: &StepContext<'_>,
///         cycle: &mut HazardCycle<Proposing>,
///     ) -> Result<(), MechanismError> {
///         cycle.propose(DeathCause::Baseline, self.0)?;
///         Ok(())
///     }
/// }
///
/// assert_eq!(Background(0.01).name(), "background");
/// ```
pub trait Mechanism: Send + Sync + 'static {
    /// Human-readable name for error reporting and telemetry.
    fn name(&self) -> &str;

    /// Stress axes this mechanism writes during `advance`.
    ///
    /// Two mechanisms may not write the same axis.
    fn writes_axes(&self) -> Vec<StressAxis> {
        Vec::new()
    }

    /// Largest interval this mechanism integrates accurately, in hours.
    ///
    /// The tick driver subdivides steps to honor the tightest bound.
    fn max_dt(&self) -> Option<f64> {
        None
    }

    /// Integrate continuous dynamics over `ctx.interval()`.
    ///
    /// Reads the frozen interval-start vessel and stages new axis values.
    /// Not called for zero-length intervals.
    fn advance(
        &self,
        _ctx: &StepContext<'_>,
        _writes: &mut LatentWrites,
    ) -> Result<(), MechanismError> {
        Ok(())
    }

    /// Propose hazards for `ctx.interval()`.
    fn propose(
        &self,
        _ctx: &StepContext<'_>,
        _cycle: &mut HazardCycle<Proposing>,
    ) -> Result<(), MechanismError> {
        Ok(())
    }
}
