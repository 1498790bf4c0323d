//! Standard assays.
//!
//! | Assay | Reads | Unit | Default noise |
//! |-------|-------|------|---------------|
//! | [`CellCountAssay`] | viable cells | `cells` | cv 5%, floor 500 |
//! | [`ViabilityAssay`] | viable fraction | `fraction` | cv 2%, floor 0.01 |
//! | [`StressReporterAssay`] | one stress axis | `fraction` | floor 0.02 |
//! | [`NutrientAssay`] | glucose or glutamine | `mM` | cv 3% |

use vitro_core::{StressAxis, VesselSnapshot};

use crate::assay::{Assay, NoiseModel};

// ── Cell count ──────────────────────────────────────────────────

/// Counts viable cells (dye-exclusion counter).
#[derive(Clone, Debug, PartialEq)]
pub struct CellCountAssay {
    noise: NoiseModel,
}

impl CellCountAssay {
    /// Default counter noise.
    pub fn new() -> Self {
        Self {
            noise: NoiseModel {
                cv: 0.05,
                floor: 500.0,
            },
        }
    }

    /// Override the noise model.
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }
}

impl Default for CellCountAssay {
    fn default() -> Self {
        Self::new()
    }
}

impl Assay for CellCountAssay {
    fn name(&self) -> &str {
        "cell_count"
    }

    fn unit(&self) -> &str {
        "cells"
    }

    fn true_value(&self, snapshot: &VesselSnapshot) -> f64 {
        snapshot.viable_cells
    }

    fn noise(&self) -> NoiseModel {
        self.noise
    }
}

// ── Viability ───────────────────────────────────────────────────

/// Live fraction of all cells ever present.
#[derive(Clone, Debug, PartialEq)]
pub struct ViabilityAssay {
    noise: NoiseModel,
}

impl ViabilityAssay {
    /// Default viability-stain noise.
    pub fn new() -> Self {
        Self {
            noise: NoiseModel {
                cv: 0.02,
                floor: 0.01,
            },
        }
    }

    /// Override the noise model.
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }
}

impl Default for ViabilityAssay {
    fn default() -> Self {
        Self::new()
    }
}

impl Assay for ViabilityAssay {
    fn name(&self) -> &str {
        "viability"
    }

    fn unit(&self) -> &str {
        "fraction"
    }

    fn true_value(&self, snapshot: &VesselSnapshot) -> f64 {
        snapshot.viability
    }

    fn noise(&self) -> NoiseModel {
        self.noise
    }

    fn bounds(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

// ── Stress reporter ─────────────────────────────────────────────

/// Fluorescent reporter for one latent stress axis.
///
/// An axis the vessel has never accumulated reads as zero.
#[derive(Clone, Debug, PartialEq)]
pub struct StressReporterAssay {
    axis: StressAxis,
    name: String,
    noise: NoiseModel,
}

impl StressReporterAssay {
    /// Reporter for `axis`, named `<axis>_reporter`.
    pub fn new(axis: StressAxis) -> Self {
        Self {
            axis,
            name: format!("{axis}_reporter"),
            noise: NoiseModel {
                cv: 0.0,
                floor: 0.02,
            },
        }
    }

    /// Override the noise model.
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }

    /// The reported axis.
    pub fn axis(&self) -> StressAxis {
        self.axis
    }
}

impl Assay for StressReporterAssay {
    fn name(&self) -> &str {
        &self.name
    }

    fn unit(&self) -> &str {
        "fraction"
    }

    fn true_value(&self, snapshot: &VesselSnapshot) -> f64 {
        snapshot.stress.get(&self.axis).copied().unwrap_or(0.0)
    }

    fn noise(&self) -> NoiseModel {
        self.noise
    }

    fn bounds(&self) -> (f64, f64) {
        (0.0, 1.0)
    }
}

// ── Nutrients ───────────────────────────────────────────────────

/// A medium nutrient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nutrient {
    /// Glucose.
    Glucose,
    /// Glutamine.
    Glutamine,
}

/// Medium nutrient concentration (metabolite analyser).
#[derive(Clone, Debug, PartialEq)]
pub struct NutrientAssay {
    nutrient: Nutrient,
    noise: NoiseModel,
}

impl NutrientAssay {
    /// Analyser for `nutrient` with default noise.
    pub fn new(nutrient: Nutrient) -> Self {
        Self {
            nutrient,
            noise: NoiseModel {
                cv: 0.03,
                floor: 0.0,
            },
        }
    }

    /// Override the noise model.
    pub fn with_noise(mut self, noise: NoiseModel) -> Self {
        self.noise = noise;
        self
    }
}

impl Assay for NutrientAssay {
    fn name(&self) -> &str {
        match self.nutrient {
            Nutrient::Glucose => "glucose",
            Nutrient::Glutamine => "glutamine",
        }
    }

    fn unit(&self) -> &str {
        "mM"
    }

    fn true_value(&self, snapshot: &VesselSnapshot) -> f64 {
        match self.nutrient {
            Nutrient::Glucose => snapshot.nutrients.glucose_mm,
            Nutrient::Glutamine => snapshot.nutrients.glutamine_mm,
        }
    }

    fn noise(&self) -> NoiseModel {
        self.noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitro_core::VesselId;
    use vitro_test_utils::seeded_vessel;

    fn snapshot() -> VesselSnapshot {
        let mut v = seeded_vessel(VesselId(0), 1.0e6);
        v.set_stress(StressAxis::Oxidative, 0.4).unwrap();
        VesselSnapshot::capture(&v, 0.0)
    }

    #[test]
    fn true_values_read_the_snapshot() {
        let s = snapshot();
        assert_eq!(CellCountAssay::new().true_value(&s), 1.0e6);
        assert_eq!(ViabilityAssay::new().true_value(&s), 1.0);
        assert_eq!(
            StressReporterAssay::new(StressAxis::Oxidative).true_value(&s),
            0.4
        );
        assert_eq!(NutrientAssay::new(Nutrient::Glucose).true_value(&s), 25.0);
        assert_eq!(NutrientAssay::new(Nutrient::Glutamine).true_value(&s), 4.0);
    }

    #[test]
    fn unaccumulated_axis_reads_zero() {
        let s = snapshot();
        assert_eq!(
            StressReporterAssay::new(StressAxis::DnaDamage).true_value(&s),
            0.0
        );
    }

    #[test]
    fn reporter_name_includes_axis() {
        let a = StressReporterAssay::new(StressAxis::ErStress);
        assert_eq!(a.name(), format!("{}_reporter", StressAxis::ErStress));
        assert_eq!(a.axis(), StressAxis::ErStress);
    }

    #[test]
    fn fraction_assays_are_bounded() {
        assert_eq!(ViabilityAssay::new().bounds(), (0.0, 1.0));
        assert_eq!(
            StressReporterAssay::new(StressAxis::Nutrient).bounds(),
            (0.0, 1.0)
        );
        assert_eq!(CellCountAssay::new().bounds().0, 0.0);
    }
}
