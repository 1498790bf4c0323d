//! Core types for the Vitro simulation kernel.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! time contract, identifiers, operations, per-vessel state, the death
//! ledger, the competing-risks hazard cycle, the parameter provider
//! interface, and the error taxonomy shared by every other crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod hazard;
pub mod id;
pub mod ledger;
pub mod observation;
pub mod operation;
pub mod params;
pub mod snapshot;
pub mod time;
pub mod vessel;

pub use error::{
    CausalityError, ConservationError, IntervalError, KernelError, MechanismError, ParamsError,
    PhaseError, StepError, SubmitError,
};
pub use hazard::{CommitRecord, Committed, HazardCycle, HazardPhase, HazardProposal, Proposing};
pub use id::{
    CellLineId, CompoundId, DeathCause, OperationHandle, SequenceId, StressAxis, TickId, VesselId,
};
pub use ledger::{DeathLedger, CONSERVATION_TOLERANCE};
pub use observation::ObservationRecord;
pub use operation::{
    DeliveryRecord, OperationKind, OperationPayload, OperationRequest, PendingOperation,
};
pub use params::{
    require_cell_line, require_compound, AxisParams, CellLineParams, CompoundParams,
    ParameterProvider, ParameterTable,
};
pub use snapshot::VesselSnapshot;
pub use time::{Interval, SimClock};
pub use vessel::{Exposure, Nutrients, VesselState};
