//! Mechanism trait and step context for Vitro simulations.
//!
//! A mechanism is one registered source of continuous dynamics or death
//! pressure. The interval stepper calls every mechanism's `advance` against
//! a frozen view of the vessel, applies the staged latent writes, then
//! opens a hazard cycle and calls every mechanism's `propose`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod mechanism;
pub mod pipeline;
pub mod writes;

pub use context::StepContext;
pub use mechanism::Mechanism;
pub use pipeline::{validate_pipeline, PipelineError, PipelinePlan, WriteConflict};
pub use writes::LatentWrites;
