//! Test fixtures and parameter builders for Vitro development.
//!
//! [`standard_params`] loads a small, fixed parameter table covering one
//! cell line, three compounds, and three stress axes. Mechanism fixtures
//! live in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{AxisPin, ConstHazard, FailingMechanism};

use vitro_core::{
    CellLineId, DeathCause, HazardCycle, Interval, ParameterProvider,
    ParameterTable, TickId, VesselId, VesselState,
};
use vitro_mechanism::{Mechanism, StepContext};

pub const HEPG2: &str = "HepG2";
/// ER stress inducer; no direct cytotoxicity.
pub const TUNICAMYCIN: &str = "tunicamycin";
/// Direct cytotoxin with an instant-kill component and a half-life.
pub const STAUROSPORINE: &str = "staurosporine";
/// Oxidative stress inducer.
pub const MENADIONE: &str = "menadione";

pub const STANDARD_PARAMS_JSON: &str = r#"{
    "default_medium": { "glucose_mm": 25.0, "glutamine_mm": 4.0 },
    "cell_lines": {
        "HepG2": {
            "doubling_time_h": 24.0,
            "carrying_capacity": 1.0e7,
            "glucose_uptake_mm_per_mcell_h": 0.05,
            "glutamine_uptake_mm_per_mcell_h": 0.01,
            "growth_km_glucose_mm": 0.5,
            "baseline_hazard_per_h": 0.001,
            "starvation_hazard_per_h": 0.05,
            "starvation_glucose_mm": 2.0
        }
    },
    "compounds": {
        "tunicamycin": {
            "ec50_um": 1.0, "hill": 2.0,
            "target_axis": "er_stress", "stress_potency": 0.9
        },
        "staurosporine": {
            "ec50_um": 0.1, "hill": 1.5,
            "instant_kill_max": 0.3, "attrition_per_h": 0.05,
            "half_life_h": 12.0
        },
        "menadione": {
            "ec50_um": 5.0, "hill": 1.0,
            "target_axis": "oxidative", "stress_potency": 0.8,
            "half_life_h": 8.0
        }
    },
    "axes": {
        "er_stress": {
            "k_on_per_h": 0.4, "k_off_per_h": 0.05,
            "onset_threshold": 0.3, "toxicity_threshold": 0.6,
            "max_hazard_per_h": 0.08, "commitment_delay_h": 6.0
        },
        "oxidative": {
            "k_on_per_h": 0.8, "k_off_per_h": 0.2,
            "onset_threshold": 0.3, "toxicity_threshold": 0.5,
            "max_hazard_per_h": 0.1, "commitment_delay_h": 2.0
        },
        "nutrient": {
            "k_on_per_h": 0.5, "k_off_per_h": 0.5,
            "onset_threshold": 0.3, "toxicity_threshold": 0.7,
            "max_hazard_per_h": 0.05
        }
    }
}"#;

/// The standard fixture parameter table.
pub fn standard_params() -> ParameterTable {
    ParameterTable::from_json_str(STANDARD_PARAMS_JSON).expect("fixture parameters are valid")
}

/// A fully viable HepG2 vessel in default medium, seeded at t=0.
pub fn seeded_vessel(id: VesselId, cells: f64) -> VesselState {
    let params = standard_params();
    VesselState::seed(
        id,
        CellLineId::from(HEPG2),
        cells,
        1.0,
        params.default_medium(),
        0.0,
    )
    .expect("fixture seed is valid")
}

/// Run one mechanism's `propose` against `vessel` and return the
/// `(cause, rate)` pairs it produced.
///
/// The cycle is opened on a scratch clone, so `vessel` is left untouched.
pub fn propose_once(
    mechanism: &dyn Mechanism,
    vessel: &VesselState,
    params: &dyn ParameterProvider,
    interval: Interval,
) -> Vec<(DeathCause, f64)> {
    let mut scratch = vessel.clone();
    let mut cycle = HazardCycle::begin(&mut scratch, interval).expect("vessel is idle");
    let ctx = StepContext::new(vessel, params, interval, TickId(0));
    mechanism
        .propose(&ctx, &mut cycle)
        .expect("propose succeeds");
    cycle
        .proposals()
        .iter()
        .map(|p| (p.cause.clone(), p.rate_per_h))
        .collect()
}
