//! Nutrient starvation hazard: `λ = h_starve · (1 − glucose/g_crit)⁺`.

use vitro_core::{DeathCause, HazardCycle, MechanismError, Proposing};
use vitro_mechanism::{Mechanism, StepContext};

use crate::kinetics::shortfall_below;

/// Proposes [`DeathCause::Starvation`] when glucose is below critical.
#[derive(Debug, Clone, Copy, Default)]
pub struct NutrientStarvation;

impl Mechanism for NutrientStarvation {
    fn name(&self) -> &str {
        "NutrientStarvation"
    }

    fn propose(
        &self,
        ctx: &StepContext<'_>,
        cycle: &mut HazardCycle<Proposing>,
    ) -> Result<(), MechanismError> {
        let line = ctx.cell_line()?;
        let glucose = ctx.vessel().nutrients().glucose_mm;
        let rate =
            line.starvation_hazard_per_h * shortfall_below(glucose, line.starvation_glucose_mm);
        if rate > 0.0 {
            cycle.propose(DeathCause::Starvation, rate)?;
        }
        Ok(())
    }
}
