//! Parameter provider: opaque kinetic constants keyed by entity identity.
//!
//! The kernel never hardcodes biology. Everything it needs about a cell
//! line, compound, or stress axis comes through [`ParameterProvider`].
//! [`ParameterTable`] is the stock implementation and loads from JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, ParamsError};
use crate::id::{CellLineId, CompoundId, StressAxis};
use crate::vessel::Nutrients;

/// Growth, uptake, and basal death constants for one cell line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellLineParams {
    /// Unconstrained population doubling time in hours.
    pub doubling_time_h: f64,
    /// Population size at which growth stops (contact inhibition).
    pub carrying_capacity: f64,
    /// Glucose consumed per million cells per hour, in mM.
    pub glucose_uptake_mm_per_mcell_h: f64,
    /// Glutamine consumed per million cells per hour, in mM.
    pub glutamine_uptake_mm_per_mcell_h: f64,
    /// Glucose level giving half-maximal growth, in mM.
    pub growth_km_glucose_mm: f64,
    /// Basal death hazard per hour.
    pub baseline_hazard_per_h: f64,
    /// Maximum starvation hazard per hour, reached at zero glucose.
    pub starvation_hazard_per_h: f64,
    /// Glucose level below which starvation hazard engages, in mM.
    pub starvation_glucose_mm: f64,
}

impl CellLineParams {
    /// Unconstrained specific growth rate `ln 2 / doubling_time`.
    pub fn max_growth_rate(&self) -> f64 {
        std::f64::consts::LN_2 / self.doubling_time_h
    }

    fn validate(&self) -> Result<(), String> {
        positive("doubling_time_h", self.doubling_time_h)?;
        positive("carrying_capacity", self.carrying_capacity)?;
        non_negative(
            "glucose_uptake_mm_per_mcell_h",
            self.glucose_uptake_mm_per_mcell_h,
        )?;
        non_negative(
            "glutamine_uptake_mm_per_mcell_h",
            self.glutamine_uptake_mm_per_mcell_h,
        )?;
        non_negative("growth_km_glucose_mm", self.growth_km_glucose_mm)?;
        non_negative("baseline_hazard_per_h", self.baseline_hazard_per_h)?;
        non_negative("starvation_hazard_per_h", self.starvation_hazard_per_h)?;
        non_negative("starvation_glucose_mm", self.starvation_glucose_mm)
    }
}

/// Dose-response and stress coupling for one compound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundParams {
    /// Concentration giving half-maximal response, in µM.
    pub ec50_um: f64,
    /// Hill coefficient of the dose-response curve.
    pub hill: f64,
    /// Fraction of viable cells killed instantly at saturating dose.
    #[serde(default)]
    pub instant_kill_max: f64,
    /// Maximum ongoing cytotoxic hazard per hour.
    #[serde(default)]
    pub attrition_per_h: f64,
    /// Medium half-life in hours; `None` means the compound is stable.
    #[serde(default)]
    pub half_life_h: Option<f64>,
    /// Stress axis this compound drives, if any.
    #[serde(default)]
    pub target_axis: Option<StressAxis>,
    /// Maximum stimulus delivered to `target_axis`, in `[0, 1]`.
    #[serde(default)]
    pub stress_potency: f64,
}

impl CompoundParams {
    /// Fractional response in `[0, 1]` at concentration `conc_um`.
    ///
    /// `c^n / (ec50^n + c^n)`; zero for non-positive concentrations.
    pub fn response(&self, conc_um: f64) -> f64 {
        if conc_um <= 0.0 {
            return 0.0;
        }
        let cn = conc_um.powf(self.hill);
        let kn = self.ec50_um.powf(self.hill);
        cn / (kn + cn)
    }

    fn validate(&self) -> Result<(), String> {
        positive("ec50_um", self.ec50_um)?;
        positive("hill", self.hill)?;
        unit("instant_kill_max", self.instant_kill_max)?;
        non_negative("attrition_per_h", self.attrition_per_h)?;
        if let Some(h) = self.half_life_h {
            positive("half_life_h", h)?;
        }
        unit("stress_potency", self.stress_potency)
    }
}

/// ODE and toxicity constants for one latent stress axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisParams {
    /// Induction rate constant per hour.
    pub k_on_per_h: f64,
    /// Recovery rate constant per hour.
    pub k_off_per_h: f64,
    /// Level at which the axis is considered "on" (onset marker set).
    pub onset_threshold: f64,
    /// Level above which the axis contributes a death hazard.
    pub toxicity_threshold: f64,
    /// Hazard per hour at a fully saturated axis.
    pub max_hazard_per_h: f64,
    /// Hours after onset before toxicity engages (commitment latency).
    #[serde(default)]
    pub commitment_delay_h: f64,
}

impl AxisParams {
    fn validate(&self) -> Result<(), String> {
        non_negative("k_on_per_h", self.k_on_per_h)?;
        non_negative("k_off_per_h", self.k_off_per_h)?;
        unit("onset_threshold", self.onset_threshold)?;
        unit("toxicity_threshold", self.toxicity_threshold)?;
        if self.toxicity_threshold >= 1.0 {
            return Err("toxicity_threshold must be < 1".to_string());
        }
        non_negative("max_hazard_per_h", self.max_hazard_per_h)?;
        non_negative("commitment_delay_h", self.commitment_delay_h)
    }
}

/// Source of per-entity kinetic constants.
///
/// Object-safe; the engine holds a `Box<dyn ParameterProvider>`.
pub trait ParameterProvider: Send + Sync + 'static {
    /// Constants for a cell line.
    fn cell_line(&self, id: &CellLineId) -> Option<&CellLineParams>;

    /// Constants for a compound.
    fn compound(&self, id: &CompoundId) -> Option<&CompoundParams>;

    /// Constants for a stress axis. Axes without parameters are inert.
    fn stress_axis(&self, axis: StressAxis) -> Option<&AxisParams>;

    /// Nutrient levels of fresh medium at seeding.
    fn default_medium(&self) -> Nutrients;
}

/// Look up a cell line, mapping absence to [`KernelError::MissingParameters`].
pub fn require_cell_line<'p>(
    params: &'p dyn ParameterProvider,
    id: &CellLineId,
) -> Result<&'p CellLineParams, KernelError> {
    params
        .cell_line(id)
        .ok_or_else(|| KernelError::MissingParameters {
            entity: format!("cell line {id}"),
        })
}

/// Look up a compound, mapping absence to [`KernelError::MissingParameters`].
pub fn require_compound<'p>(
    params: &'p dyn ParameterProvider,
    id: &CompoundId,
) -> Result<&'p CompoundParams, KernelError> {
    params
        .compound(id)
        .ok_or_else(|| KernelError::MissingParameters {
            entity: format!("compound {id}"),
        })
}

/// In-memory parameter table, loadable from JSON.
///
/// # Examples
///
/// ```
/// use vitro_core::{ParameterProvider, ParameterTable, StressAxis};
///
/// let table = ParameterTable::from_json_str(r#"{
///     "default_medium": { "glucose_mm": 25.0, "glutamine_mm": 4.0 },
///     "axes": {
///         "er_stress": {
///             "k_on_per_h": 0.5, "k_off_per_h": 0.05,
///             "onset_threshold": 0.3, "toxicity_threshold": 0.6,
///             "max_hazard_per_h": 0.08
///         }
///     }
/// }"#).unwrap();
/// assert!(table.stress_axis(StressAxis::ErStress).is_some());
/// assert!(table.stress_axis(StressAxis::Oxidative).is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterTable {
    /// Cell line constants.
    #[serde(default)]
    pub cell_lines: BTreeMap<CellLineId, CellLineParams>,
    /// Compound constants.
    #[serde(default)]
    pub compounds: BTreeMap<CompoundId, CompoundParams>,
    /// Stress axis constants.
    #[serde(default)]
    pub axes: BTreeMap<StressAxis, AxisParams>,
    /// Fresh medium composition.
    pub default_medium: Nutrients,
}

impl ParameterTable {
    /// Parse and validate a JSON parameter table.
    pub fn from_json_str(json: &str) -> Result<Self, ParamsError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Check every constant is finite and in range.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (id, p) in &self.cell_lines {
            p.validate()
                .map_err(|e| ParamsError::Invalid(format!("cell line {id}: {e}")))?;
        }
        for (id, p) in &self.compounds {
            p.validate()
                .map_err(|e| ParamsError::Invalid(format!("compound {id}: {e}")))?;
        }
        for (axis, p) in &self.axes {
            p.validate()
                .map_err(|e| ParamsError::Invalid(format!("axis {axis}: {e}")))?;
        }
        non_negative("default_medium.glucose_mm", self.default_medium.glucose_mm)
            .and_then(|()| {
                non_negative(
                    "default_medium.glutamine_mm",
                    self.default_medium.glutamine_mm,
                )
            })
            .map_err(ParamsError::Invalid)
    }
}

impl ParameterProvider for ParameterTable {
    fn cell_line(&self, id: &CellLineId) -> Option<&CellLineParams> {
        self.cell_lines.get(id)
    }

    fn compound(&self, id: &CompoundId) -> Option<&CompoundParams> {
        self.compounds.get(id)
    }

    fn stress_axis(&self, axis: StressAxis) -> Option<&AxisParams> {
        self.axes.get(&axis)
    }

    fn default_medium(&self) -> Nutrients {
        self.default_medium
    }
}

fn positive(name: &str, v: f64) -> Result<(), String> {
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("{name} must be finite and > 0, got {v}"));
    }
    Ok(())
}

fn non_negative(name: &str, v: f64) -> Result<(), String> {
    if !v.is_finite() || v < 0.0 {
        return Err(format!("{name} must be finite and >= 0, got {v}"));
    }
    Ok(())
}

fn unit(name: &str, v: f64) -> Result<(), String> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(format!("{name} must be in [0, 1], got {v}"));
    }
    Ok(())
}
