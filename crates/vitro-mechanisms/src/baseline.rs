//! Basal turnover hazard of the cell line.

use vitro_core::{DeathCause, HazardCycle, MechanismError, Proposing};
use vitro_mechanism::{Mechanism, StepContext};

/// Proposes [`DeathCause::Baseline`] at the cell line's basal rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineHazard;

impl Mechanism for BaselineHazard {
    fn name(&self) -> &str {
        "BaselineHazard"
    }

    fn propose(
        &self,
        ctx: &StepContext<'_>,
        cycle: &mut HazardCycle<Proposing>,
    ) -> Result<(), MechanismError> {
        let rate = ctx.cell_line()?.baseline_hazard_per_h;
        if rate > 0.0 {
            cycle.propose(DeathCause::Baseline, rate)?;
        }
        Ok(())
    }
}
