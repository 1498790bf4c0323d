//! Mechanism registry validation.
//!
//! [`validate_pipeline`] runs once at session construction and rejects
//! registries the stepper could not execute deterministically.

use indexmap::IndexMap;
use vitro_core::StressAxis;

use crate::mechanism::Mechanism;

/// Two mechanisms declared writes to the same axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteConflict {
    /// The contested axis.
    pub axis: StressAxis,
    /// Earlier writer in registration order.
    pub first_writer: String,
    /// Later writer.
    pub second_writer: String,
}

/// Errors from registry validation (construction time, not per step).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// No mechanisms registered.
    #[error("mechanism registry is empty")]
    EmptyPipeline,
    /// Two mechanisms share a name.
    #[error("mechanism name '{name}' registered twice")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },
    /// Two or more mechanisms write the same axis.
    #[error("write-write conflicts: {}", format_conflicts(.0))]
    WriteConflict(Vec<WriteConflict>),
    /// A mechanism's `max_dt()` is non-finite or non-positive.
    #[error("mechanism '{mechanism}' returned invalid max_dt {value} (must be finite and > 0)")]
    InvalidMaxDt {
        /// Which mechanism.
        mechanism: String,
        /// The invalid value.
        value: f64,
    },
}

fn format_conflicts(conflicts: &[WriteConflict]) -> String {
    conflicts
        .iter()
        .map(|c| {
            format!(
                "axis {} written by '{}' and '{}'",
                c.axis, c.first_writer, c.second_writer
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct PipelinePlan {
    writers: IndexMap<StressAxis, usize>,
    max_dt: Option<(f64, String)>,
}

impl PipelinePlan {
    /// Index of the mechanism writing `axis`.
    pub fn writer_of(&self, axis: StressAxis) -> Option<usize> {
        self.writers.get(&axis).copied()
    }

    /// Tightest `max_dt` across mechanisms, and who imposes it.
    pub fn max_dt(&self) -> Option<(f64, &str)> {
        self.max_dt.as_ref().map(|(dt, name)| (*dt, name.as_str()))
    }
}

/// Validate a mechanism registry.
///
/// Checks:
///
/// 1. The registry is non-empty.
/// 2. Names are unique.
/// 3. No two mechanisms write the same axis.
/// 4. Every `max_dt()` is finite and positive.
pub fn validate_pipeline(mechanisms: &[Box<dyn Mechanism>]) -> Result<PipelinePlan, PipelineError> {
    if mechanisms.is_empty() {
        return Err(PipelineError::EmptyPipeline);
    }

    let mut names: IndexMap<&str, usize> = IndexMap::new();
    for (i, m) in mechanisms.iter().enumerate() {
        if names.insert(m.name(), i).is_some() {
            return Err(PipelineError::DuplicateName {
                name: m.name().to_string(),
            });
        }
    }

    let mut writers: IndexMap<StressAxis, usize> = IndexMap::new();
    let mut conflicts = Vec::new();
    for (i, m) in mechanisms.iter().enumerate() {
        for axis in m.writes_axes() {
            if let Some(&j) = writers.get(&axis) {
                conflicts.push(WriteConflict {
                    axis,
                    first_writer: mechanisms[j].name().to_string(),
                    second_writer: m.name().to_string(),
                });
            } else {
                writers.insert(axis, i);
            }
        }
    }
    if !conflicts.is_empty() {
        return Err(PipelineError::WriteConflict(conflicts));
    }

    let mut max_dt: Option<(f64, String)> = None;
    for m in mechanisms {
        if let Some(value) = m.max_dt() {
            if !value.is_finite() || value <= 0.0 {
                return Err(PipelineError::InvalidMaxDt {
                    mechanism: m.name().to_string(),
                    value,
                });
            }
            if max_dt.as_ref().is_none_or(|(best, _)| value < *best) {
                max_dt = Some((value, m.name().to_string()));
            }
        }
    }

    Ok(PipelinePlan { writers, max_dt })
}
