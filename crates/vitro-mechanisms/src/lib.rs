//! Reference mechanisms for the Vitro simulation kernel.
//!
//! - [`StressDynamics`]: latent stress-axis ODEs driven by compound exposure
//!   and glucose shortfall.
//! - [`StressToxicity`]: hazard from axes above their toxicity threshold,
//!   gated by a commitment delay after onset.
//! - [`NutrientStarvation`]: hazard from glucose below the critical level.
//! - [`CompoundAttrition`]: ongoing cytotoxic hazard per compound.
//! - [`BaselineHazard`]: basal turnover of the cell line.
//!
//! Parameters come from the session's
//! [`ParameterProvider`](vitro_core::ParameterProvider); none are
//! hardcoded here.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attrition;
pub mod baseline;
pub mod kinetics;
pub mod starvation;
pub mod stress_dynamics;
pub mod stress_toxicity;

pub use attrition::CompoundAttrition;
pub use baseline::BaselineHazard;
pub use starvation::NutrientStarvation;
pub use stress_dynamics::StressDynamics;
pub use stress_toxicity::StressToxicity;

use vitro_mechanism::Mechanism;

/// The full reference registry, in registration order.
pub fn reference_mechanisms() -> Vec<Box<dyn Mechanism>> {
    vec![
        Box::new(StressDynamics::all_axes()),
        Box::new(StressToxicity::all_axes()),
        Box::new(NutrientStarvation),
        Box::new(CompoundAttrition),
        Box::new(BaselineHazard),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitro_mechanism::validate_pipeline;

    #[test]
    fn reference_registry_validates() {
        let plan = validate_pipeline(&reference_mechanisms()).unwrap();
        assert_eq!(plan.max_dt(), None);
        assert_eq!(
            plan.writer_of(vitro_core::StressAxis::DnaDamage),
            Some(0)
        );
    }
}
