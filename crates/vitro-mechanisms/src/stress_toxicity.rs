//! Hazard from latent stress above its toxicity threshold.
//!
//! `λ = h_max · ((S − θ)/(1 − θ))⁺`, attributed to
//! [`DeathCause::Stress`]. An axis only contributes once it has been at or
//! above its onset threshold for `commitment_delay_h`, measured from the
//! onset marker to the interval start `t0`.

use smallvec::SmallVec;
use vitro_core::{DeathCause, HazardCycle, MechanismError, Proposing, StressAxis};
use vitro_mechanism::{Mechanism, StepContext};

use crate::kinetics::excess_over;

/// Proposes stress-driven hazards for the configured axes.
#[derive(Debug, Clone)]
pub struct StressToxicity {
    axes: SmallVec<[StressAxis; 5]>,
}

impl StressToxicity {
    /// Toxicity for every [`StressAxis`].
    pub fn all_axes() -> Self {
        Self::for_axes(StressAxis::ALL)
    }

    /// Toxicity for a subset of axes.
    pub fn for_axes(axes: impl IntoIterator<Item = StressAxis>) -> Self {
        let mut axes: SmallVec<[StressAxis; 5]> = axes.into_iter().collect();
        axes.sort();
        axes.dedup();
        Self { axes }
    }

    /// Hazard per hour from `axis` for the interval in `ctx`.
    pub fn hazard(ctx: &StepContext<'_>, axis: StressAxis) -> f64 {
        let Some(params) = ctx.params().stress_axis(axis) else {
            return 0.0;
        };
        let Some(onset) = ctx.vessel().stress_onset(axis) else {
            return 0.0;
        };
        if ctx.interval().elapsed_since(onset) < params.commitment_delay_h {
            return 0.0;
        }
        params.max_hazard_per_h * excess_over(ctx.vessel().stress(axis), params.toxicity_threshold)
    }
}

impl Mechanism for StressToxicity {
    fn name(&self) -> &str {
        "StressToxicity"
    }

    fn propose(
        &self,
        ctx: &StepContext<'_>,
        cycle: &mut HazardCycle<Proposing>,
    ) -> Result<(), MechanismError> {
        for &axis in &self.axes {
            let rate = Self::hazard(ctx, axis);
            if rate > 0.0 {
                cycle.propose(DeathCause::Stress(axis), rate)?;
            }
        }
        Ok(())
    }
}
