//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the builder input for a [`TickEngine`](crate::TickEngine).
//! [`validate()`](SessionConfig::validate) checks structural invariants
//! at startup; the engine constructor then calls
//! [`validate_pipeline()`](vitro_mechanism::validate_pipeline) to obtain
//! the [`PipelinePlan`](vitro_mechanism::PipelinePlan).

use vitro_core::ParameterProvider;
use vitro_mechanism::{validate_pipeline, Mechanism, PipelineError};

use crate::resource::IntegrationScheme;

/// Default bound on pending operations.
pub const DEFAULT_MAX_PENDING_OPERATIONS: usize = 4096;

/// Default upper bound on a single sub-interval, in hours.
pub const DEFAULT_MAX_SUBSTEP_H: f64 = 1.0;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`].
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Mechanism pipeline validation failed.
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),
    /// Pending operation capacity is zero.
    #[error("max_pending_operations must be at least 1")]
    QueueCapacityZero,
    /// `max_substep_h` is NaN, infinite, zero, or negative.
    #[error("max_substep_h must be finite and positive, got {value}")]
    InvalidSubstep {
        /// The invalid value.
        value: f64,
    },
    /// `start_time` is not finite.
    #[error("start_time must be finite, got {value}")]
    InvalidStartTime {
        /// The invalid value.
        value: f64,
    },
}

// ── SessionConfig ──────────────────────────────────────────────────

/// Complete configuration for a simulation session.
///
/// Consumed by [`TickEngine::new()`](crate::TickEngine::new) and
/// [`LabSession::new()`](crate::LabSession::new).
pub struct SessionConfig {
    /// Kinetic constants for cell lines, compounds, and stress axes.
    pub params: Box<dyn ParameterProvider>,
    /// Registered mechanisms, in stepping order.
    pub mechanisms: Vec<Box<dyn Mechanism>>,
    /// Bound on pending (undelivered) operations.
    pub max_pending_operations: usize,
    /// Longest sub-interval the tick driver will step, in hours.
    ///
    /// A mechanism's own `max_dt` tightens this further.
    pub max_substep_h: f64,
    /// Clock reading when the session starts.
    pub start_time: f64,
    /// How resource consumption averages the population over a step.
    pub integration: IntegrationScheme,
}

impl SessionConfig {
    /// Configuration with default queue capacity, substep, and start time.
    pub fn new(params: impl ParameterProvider, mechanisms: Vec<Box<dyn Mechanism>>) -> Self {
        Self {
            params: Box::new(params),
            mechanisms,
            max_pending_operations: DEFAULT_MAX_PENDING_OPERATIONS,
            max_substep_h: DEFAULT_MAX_SUBSTEP_H,
            start_time: 0.0,
            integration: IntegrationScheme::Trapezoid,
        }
    }

    /// Override the substep bound.
    pub fn with_max_substep(mut self, hours: f64) -> Self {
        self.max_substep_h = hours;
        self
    }

    /// Override the pending operation capacity.
    pub fn with_max_pending_operations(mut self, capacity: usize) -> Self {
        self.max_pending_operations = capacity;
        self
    }

    /// Override the start time.
    pub fn with_start_time(mut self, t: f64) -> Self {
        self.start_time = t;
        self
    }

    /// Override the resource averaging scheme.
    pub fn with_integration(mut self, scheme: IntegrationScheme) -> Self {
        self.integration = scheme;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pipeline(&self.mechanisms)?;
        if self.max_pending_operations == 0 {
            return Err(ConfigError::QueueCapacityZero);
        }
        if !self.max_substep_h.is_finite() || self.max_substep_h <= 0.0 {
            return Err(ConfigError::InvalidSubstep {
                value: self.max_substep_h,
            });
        }
        if !self.start_time.is_finite() {
            return Err(ConfigError::InvalidStartTime {
                value: self.start_time,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.mechanisms.iter().map(|m| m.name()).collect();
        f.debug_struct("SessionConfig")
            .field("mechanisms", &names)
            .field("max_pending_operations", &self.max_pending_operations)
            .field("max_substep_h", &self.max_substep_h)
            .field("start_time", &self.start_time)
            .field("integration", &self.integration)
            .finish_non_exhaustive()
    }
}
