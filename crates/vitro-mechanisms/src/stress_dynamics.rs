//! Latent stress-axis dynamics.
//!
//! Each configured axis follows `dS/dt = k_on·f·(1 − S) − k_off·S`. The
//! stimulus `f` combines every compound targeting the axis,
//! `potency · Hill(c)`, with a saturating union. The `Nutrient` axis is
//! additionally driven by glucose shortfall below the cell line's
//! starvation threshold.
//!
//! The stimulus is evaluated at the frozen interval start and held
//! constant, and the ODE is solved exactly for that stimulus.

use smallvec::SmallVec;
use vitro_core::{require_compound, MechanismError, StressAxis};
use vitro_mechanism::{LatentWrites, Mechanism, StepContext};

use crate::kinetics::{combine_stimuli, relax_stress, shortfall_below};

/// Evolves the configured stress axes.
#[derive(Debug, Clone)]
pub struct StressDynamics {
    axes: SmallVec<[StressAxis; 5]>,
    max_dt: Option<f64>,
}

impl StressDynamics {
    /// Dynamics for every [`StressAxis`].
    pub fn all_axes() -> Self {
        Self::for_axes(StressAxis::ALL)
    }

    /// Dynamics for a subset of axes.
    pub fn for_axes(axes: impl IntoIterator<Item = StressAxis>) -> Self {
        let mut axes: SmallVec<[StressAxis; 5]> = axes.into_iter().collect();
        axes.sort();
        axes.dedup();
        Self { axes, max_dt: None }
    }

    /// Cap the interval length so time-varying stimuli are resolved.
    pub fn with_max_dt(mut self, max_dt: f64) -> Self {
        self.max_dt = Some(max_dt);
        self
    }

    /// Stimulus on `axis` at the interval start, in `[0, 1]`.
    pub fn stimulus(ctx: &StepContext<'_>, axis: StressAxis) -> Result<f64, MechanismError> {
        let vessel = ctx.vessel();
        let mut terms: SmallVec<[f64; 4]> = SmallVec::new();
        for (id, exposure) in vessel.compounds() {
            let compound = require_compound(ctx.params(), id)?;
            if compound.target_axis == Some(axis) {
                terms.push(compound.stress_potency * compound.response(exposure.concentration_um));
            }
        }
        if axis == StressAxis::Nutrient {
            let line = ctx.cell_line()?;
            terms.push(shortfall_below(
                vessel.nutrients().glucose_mm,
                line.starvation_glucose_mm,
            ));
        }
        let f = combine_stimuli(terms);
        if !f.is_finite() {
            return Err(MechanismError::NonFinite {
                quantity: format!("stimulus on {axis}"),
            });
        }
        Ok(f)
    }
}

impl Mechanism for StressDynamics {
    fn name(&self) -> &str {
        "StressDynamics"
    }

    fn writes_axes(&self) -> Vec<StressAxis> {
        self.axes.to_vec()
    }

    fn max_dt(&self) -> Option<f64> {
        self.max_dt
    }

    fn advance(
        &self,
        ctx: &StepContext<'_>,
        writes: &mut LatentWrites,
    ) -> Result<(), MechanismError> {
        for &axis in &self.axes {
            let Some(params) = ctx.params().stress_axis(axis) else {
                continue;
            };
            let f = Self::stimulus(ctx, axis)?;
            let s0 = ctx.vessel().stress(axis);
            let s1 = relax_stress(s0, f, params.k_on_per_h, params.k_off_per_h, ctx.dt());
            writes.stage(axis, s1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitro_core::{CompoundId, Interval, Nutrients, TickId, VesselId};
    use vitro_test_utils::{seeded_vessel, standard_params, MENADIONE, TUNICAMYCIN};

    fn advance(vessel: &vitro_core::VesselState, dt: f64) -> LatentWrites {
        let params = standard_params();
        let ctx = StepContext::new(vessel, &params, Interval::new(0.0, dt).unwrap(), TickId(0));
        let mech = StressDynamics::all_axes();
        let mut writes = LatentWrites::for_axes(mech.writes_axes());
        mech.advance(&ctx, &mut writes).unwrap();
        writes
    }

    #[test]
    fn targeted_axis_rises_others_stay_at_zero() {
        let mut v = seeded_vessel(VesselId(0), 1.0e6);
        v.add_compound(CompoundId::from(TUNICAMYCIN), 5.0, 0.0);
        let w = advance(&v, 6.0);
        assert!(w.get(StressAxis::ErStress).unwrap() > 0.3);
        assert_eq!(w.get(StressAxis::Oxidative), Some(0.0));
    }

    #[test]
    fn stimuli_from_two_compounds_only_hit_their_axes() {
        let mut v = seeded_vessel(VesselId(0), 1.0e6);
        v.add_compound(CompoundId::from(MENADIONE), 10.0, 0.0);
        let w = advance(&v, 2.0);
        assert!(w.get(StressAxis::Oxidative).unwrap() > 0.0);
        assert_eq!(w.get(StressAxis::ErStress), Some(0.0));
    }

    #[test]
    fn glucose_shortfall_drives_nutrient_axis() {
        let mut v = seeded_vessel(VesselId(0), 1.0e6);
        v.replace_nutrients(Nutrients {
            glucose_mm: 0.0,
            glutamine_mm: 0.0,
        })
        .unwrap();
        let w = advance(&v, 4.0);
        assert!(w.get(StressAxis::Nutrient).unwrap() > 0.0);
    }

    #[test]
    fn axes_without_params_are_not_written() {
        let v = seeded_vessel(VesselId(0), 1.0e6);
        let w = advance(&v, 1.0);
        assert_eq!(w.get(StressAxis::Mitochondrial), None);
    }

    #[test]
    fn unknown_compound_is_missing_parameters() {
        let mut v = seeded_vessel(VesselId(0), 1.0e6);
        v.add_compound(CompoundId::from("unlisted"), 1.0, 0.0);
        let params = standard_params();
        let ctx = StepContext::new(&v, &params, Interval::new(0.0, 1.0).unwrap(), TickId(0));
        let err = StressDynamics::stimulus(&ctx, StressAxis::ErStress).unwrap_err();
        assert!(err.to_string().contains("unlisted"), "{err}");
    }
}
