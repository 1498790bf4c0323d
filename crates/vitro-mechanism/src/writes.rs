//! Staged latent axis writes.

use indexmap::IndexMap;
use vitro_core::{MechanismError, StressAxis};

/// Buffer of new stress-axis values staged by one mechanism's `advance`.
///
/// Writes are restricted to the axes the mechanism declared; the stepper
/// validates ranges and applies them after every mechanism has run.
#[derive(Debug, Default)]
pub struct LatentWrites {
    allowed: Vec<StressAxis>,
    staged: IndexMap<StressAxis, f64>,
}

impl LatentWrites {
    /// Empty buffer accepting writes to `allowed`.
    pub fn for_axes(allowed: Vec<StressAxis>) -> Self {
        Self {
            allowed,
            staged: IndexMap::new(),
        }
    }

    /// Stage `value` for `axis`. A second write to the same axis replaces
    /// the first.
    pub fn stage(&mut self, axis: StressAxis, value: f64) -> Result<(), MechanismError> {
        if !self.allowed.contains(&axis) {
            return Err(MechanismError::ExecutionFailed {
                reason: format!("write to undeclared axis {axis}"),
            });
        }
        if !value.is_finite() {
            return Err(MechanismError::NonFinite {
                quantity: format!("stress axis {axis}"),
            });
        }
        self.staged.insert(axis, value);
        Ok(())
    }

    /// Staged value for `axis`.
    pub fn get(&self, axis: StressAxis) -> Option<f64> {
        self.staged.get(&axis).copied()
    }

    /// Staged values in write order.
    pub fn iter(&self) -> impl Iterator<Item = (StressAxis, f64)> + '_ {
        self.staged.iter().map(|(&a, &v)| (a, v))
    }

    /// Number of staged axes.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// Whether nothing was staged.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}
