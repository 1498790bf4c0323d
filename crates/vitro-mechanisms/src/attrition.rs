//! Ongoing compound cytotoxicity: `λ = attrition_per_h · Hill(c)` per compound.

use vitro_core::{require_compound, DeathCause, HazardCycle, MechanismError, Proposing};
use vitro_mechanism::{Mechanism, StepContext};

/// Proposes [`DeathCause::Compound`] for each compound in the medium.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompoundAttrition;

impl Mechanism for CompoundAttrition {
    fn name(&self) -> &str {
        "CompoundAttrition"
    }

    fn propose(
        &self,
        ctx: &StepContext<'_>,
        cycle: &mut HazardCycle<Proposing>,
    ) -> Result<(), MechanismError> {
        for (id, exposure) in ctx.vessel().compounds() {
            let params = require_compound(ctx.params(), id)?;
            let rate = params.attrition_per_h * params.response(exposure.concentration_um);
            if rate > 0.0 {
                cycle.propose(DeathCause::Compound(id.clone()), rate)?;
            }
        }
        Ok(())
    }
}
