//! Measurement layer for Vitro sessions.
//!
//! Assays consume the read-only [`VesselSnapshot`](vitro_core::VesselSnapshot)
//! returned by [`LabSession::read`](vitro_engine::LabSession::read), apply
//! seeded measurement noise, and emit
//! [`ObservationRecord`](vitro_core::ObservationRecord)s that carry the
//! start time of the treatment they may reflect. Nothing here can reach
//! the vessel state mutably.
//!
//! - [`Assay`]: what is measured and how noisy it is.
//! - [`AssayRunner`]: owns the ChaCha8 stream and produces records.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod assay;
pub mod assays;
pub mod error;
pub mod runner;

pub use assay::{Assay, NoiseModel};
pub use assays::{CellCountAssay, Nutrient, NutrientAssay, StressReporterAssay, ViabilityAssay};
pub use error::AssayError;
pub use runner::AssayRunner;
