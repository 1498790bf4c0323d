//! Vitro: a deterministic simulation kernel for cell-culture experiments.
//!
//! This is the facade crate that re-exports the public API from every
//! Vitro sub-crate. Most users only need `vitro` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use vitro::prelude::*;
//! use vitro_test_utils::{standard_params, HEPG2, TUNICAMYCIN};
//!
//! let config = SessionConfig::new(standard_params(), reference_mechanisms());
//! let mut lab = LabSession::new(config).unwrap();
//!
//! lab.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 0.95).unwrap();
//! lab.submit_treat(VesselId(0), 6.0, CompoundId::from(TUNICAMYCIN), 2.0).unwrap();
//! lab.advance_time(48.0).unwrap();
//!
//! let mut runner = AssayRunner::new(42);
//! let record = runner.measure(&lab, VesselId(0), &ViabilityAssay::new()).unwrap();
//! assert_eq!(record.observation_time(), 48.0);
//! assert_eq!(record.treatment_start_time(), Some(6.0));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vitro-core` | IDs, clock, operations, vessel state, death ledger, hazard cycle, errors |
//! | [`mechanism`] | `vitro-mechanism` | `Mechanism` trait and pipeline validation |
//! | [`mechanisms`] | `vitro-mechanisms` | Reference stress dynamics and hazard mechanisms |
//! | [`engine`] | `vitro-engine` | Scheduler, interval stepper, tick engine, `LabSession` |
//! | [`assay`] | `vitro-assay` | Seeded assays producing observation records |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, the time contract, and the hazard cycle (`vitro-core`).
pub use vitro_core as types;

/// The [`mechanism::Mechanism`] extension point (`vitro-mechanism`).
pub use vitro_mechanism as mechanism;

/// Reference mechanisms (`vitro-mechanisms`).
///
/// [`mechanisms::reference_mechanisms`] returns the full registry.
pub use vitro_mechanisms as mechanisms;

/// Scheduling, stepping, and the session API (`vitro-engine`).
pub use vitro_engine as engine;

/// Measurement layer (`vitro-assay`).
pub use vitro_assay as assay;

/// Common imports for typical Vitro usage.
///
/// ```rust
/// use vitro::prelude::*;
/// ```
pub mod prelude {
    // Identifiers and operations
    pub use vitro_core::{
        CellLineId, CompoundId, DeathCause, OperationHandle, OperationPayload, OperationRequest,
        StressAxis, TickId, VesselId,
    };

    // State and records
    pub use vitro_core::{
        CommitRecord, DeliveryRecord, Interval, ObservationRecord, ParameterProvider,
        ParameterTable, VesselSnapshot,
    };

    // Errors
    pub use vitro_core::{KernelError, MechanismError, ParamsError, StepError, SubmitError};

    // Mechanisms
    pub use vitro_mechanism::{LatentWrites, Mechanism, StepContext};
    pub use vitro_mechanisms::reference_mechanisms;

    // Engine
    pub use vitro_engine::{
        IntegrationScheme, LabSession, SessionConfig, StepMetrics, TickResult,
    };

    // Assays
    pub use vitro_assay::{
        Assay, AssayRunner, CellCountAssay, NoiseModel, Nutrient, NutrientAssay,
        StressReporterAssay, ViabilityAssay,
    };
}
