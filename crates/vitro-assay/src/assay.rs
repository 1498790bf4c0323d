//! The [`Assay`] trait and its noise model.

use vitro_core::VesselSnapshot;

use crate::error::AssayError;

/// Measurement noise applied on top of the true value.
///
/// A reading is `true · (1 + cv·z₁) + floor·z₂` with independent standard
/// normals `z₁, z₂`, clamped to the assay's bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseModel {
    /// Multiplicative coefficient of variation.
    pub cv: f64,
    /// Additive standard deviation, in the assay's unit.
    pub floor: f64,
}

impl NoiseModel {
    /// No noise: readings equal the true value.
    pub const EXACT: NoiseModel = NoiseModel {
        cv: 0.0,
        floor: 0.0,
    };

    /// Whether this model adds no noise at all.
    pub fn is_exact(&self) -> bool {
        self.cv == 0.0 && self.floor == 0.0
    }

    /// Check both parameters are finite and non-negative.
    pub fn validate(&self, assay: &str) -> Result<(), AssayError> {
        for (name, value) in [("cv", self.cv), ("floor", self.floor)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AssayError::InvalidNoise {
                    assay: assay.to_string(),
                    name,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::EXACT
    }
}

/// A measurement taken from a vessel snapshot.
///
/// Implementations compute the *true* value only; noise is applied by the
/// [`AssayRunner`](crate::AssayRunner) so that every assay shares one
/// reproducible random stream.
pub trait Assay: Send + Sync {
    /// Name recorded on each observation.
    fn name(&self) -> &str;

    /// Unit label recorded on each observation.
    fn unit(&self) -> &str;

    /// The noiseless value for `snapshot`.
    fn true_value(&self, snapshot: &VesselSnapshot) -> f64;

    /// Noise applied to each reading.
    fn noise(&self) -> NoiseModel {
        NoiseModel::EXACT
    }

    /// Physical range readings are clamped to.
    fn bounds(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }
}
