//! Simulation engine for the Vitro kernel.
//!
//! [`LabSession`] is the user-facing API: submit operations, advance time,
//! read vessels. Underneath, the [`TickEngine`] drives each
//! `advance_time` call: scheduler flush, per-vessel interval stepping
//! (delivery, latent dynamics, hazard propose/commit, resource
//! integration), then clock advance.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod delivery;
pub mod hash;
pub mod metrics;
pub mod resource;
pub mod scheduler;
pub mod session;
pub mod stepper;
pub mod tick;

pub use config::{ConfigError, SessionConfig};
pub use hash::state_hash;
pub use metrics::StepMetrics;
pub use resource::{IntegrationScheme, ResourceIntegrator, ResourceUpdate};
pub use scheduler::OperationScheduler;
pub use session::LabSession;
pub use stepper::{IntervalStepper, VesselStepReport};
pub use tick::{TickEngine, TickResult};
