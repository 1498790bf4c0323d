//! Error types for the assay layer.

use vitro_core::{CausalityError, KernelError};

/// Failure producing an observation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AssayError {
    /// The vessel could not be read (usually: not seeded).
    #[error("read failed: {0}")]
    Read(#[from] KernelError),
    /// The record would precede the treatment it reflects.
    #[error(transparent)]
    Causality(#[from] CausalityError),
    /// A noise model parameter is negative or non-finite.
    #[error("assay '{assay}': noise parameter {name} must be finite and >= 0, got {value}")]
    InvalidNoise {
        /// Assay name.
        assay: String,
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// The assay produced a non-finite reading.
    #[error("assay '{assay}' produced a non-finite reading")]
    NonFinite {
        /// Assay name.
        assay: String,
    },
}
