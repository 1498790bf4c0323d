//! User-facing simulation session.
//!
//! [`LabSession`] is the primary API: submit interventions, advance
//! time, read vessels. It wraps a [`TickEngine`] and adds the typed
//! submission helpers and the non-mutating read projection.
//!
//! # Ownership model
//!
//! `LabSession` is [`Send`] but every mutating method takes `&mut self`.
//! [`read()`](LabSession::read) takes `&self` and returns an owned
//! [`VesselSnapshot`], so a read can never alter biology or advance
//! the clock, and holding a snapshot never blocks stepping.

use vitro_core::{
    CellLineId, CompoundId, KernelError, OperationHandle, OperationPayload, OperationRequest,
    PendingOperation, StepError, SubmitError, TickId, VesselId, VesselSnapshot, VesselState,
};

use crate::config::{ConfigError, SessionConfig};
use crate::hash::state_hash;
use crate::metrics::StepMetrics;
use crate::tick::{TickEngine, TickResult};

// Compile-time assertion: LabSession can move between threads.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<LabSession>();
    }
};

/// A simulated laboratory session.
///
/// # Example
///
/// ```
/// use vitro_core::{CellLineId, VesselId};
/// use vitro_engine::{LabSession, SessionConfig};
/// use vitro_test_utils::{standard_params, ConstHazard, HEPG2};
///
/// let config = SessionConfig::new(
///     standard_params(),
///     vec![Box::new(ConstHazard::baseline("basal", 0.001))],
/// );
/// let mut lab = LabSession::new(config).unwrap();
/// lab.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 0.95).unwrap();
/// lab.advance_time(24.0).unwrap();
///
/// let snap = lab.read(VesselId(0)).unwrap();
/// assert_eq!(snap.observed_at, 24.0);
/// assert!(snap.viable_cells > 0.0);
/// ```
pub struct LabSession {
    engine: TickEngine,
}

impl LabSession {
    /// Create a session from a validated configuration.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let mechanisms = config.mechanisms.len();
        let start = config.start_time;
        let engine = TickEngine::new(config)?;
        tracing::info!(
            mechanisms,
            start_time = start,
            substep_h = engine.substep_h(),
            "lab session created"
        );
        Ok(Self { engine })
    }

    // ── Submission ───────────────────────────────────────────────

    /// Queue an arbitrary operation.
    pub fn submit(&mut self, request: OperationRequest) -> Result<OperationHandle, SubmitError> {
        self.engine.submit(request)
    }

    /// Seed `cell_count` cells of `cell_line` at `time`.
    pub fn submit_seed(
        &mut self,
        vessel: VesselId,
        time: f64,
        cell_line: CellLineId,
        cell_count: f64,
        viability: f64,
    ) -> Result<OperationHandle, SubmitError> {
        self.submit(OperationRequest {
            target_vessel: vessel,
            scheduled_time: time,
            payload: OperationPayload::Seed {
                cell_line,
                cell_count,
                viability,
            },
        })
    }

    /// Dose `dose_um` micromolar of `compound` at `time`.
    pub fn submit_treat(
        &mut self,
        vessel: VesselId,
        time: f64,
        compound: CompoundId,
        dose_um: f64,
    ) -> Result<OperationHandle, SubmitError> {
        self.submit(OperationRequest {
            target_vessel: vessel,
            scheduled_time: time,
            payload: OperationPayload::Treat { compound, dose_um },
        })
    }

    /// Replace the medium's nutrients at `time`.
    pub fn submit_feed(
        &mut self,
        vessel: VesselId,
        time: f64,
        glucose_mm: f64,
        glutamine_mm: f64,
    ) -> Result<OperationHandle, SubmitError> {
        self.submit(OperationRequest {
            target_vessel: vessel,
            scheduled_time: time,
            payload: OperationPayload::Feed {
                glucose_mm,
                glutamine_mm,
            },
        })
    }

    /// Remove `compound` (or every compound when `None`) at `time`.
    pub fn submit_washout(
        &mut self,
        vessel: VesselId,
        time: f64,
        compound: Option<CompoundId>,
    ) -> Result<OperationHandle, SubmitError> {
        self.submit(OperationRequest {
            target_vessel: vessel,
            scheduled_time: time,
            payload: OperationPayload::Washout { compound },
        })
    }

    /// Withdraw a pending operation before it is delivered.
    pub fn withdraw(&mut self, handle: OperationHandle) -> Result<PendingOperation, SubmitError> {
        self.engine.withdraw(handle)
    }

    // ── Stepping ─────────────────────────────────────────────────

    /// Advance simulated time by `dt` hours. See [`TickEngine::advance_time`].
    pub fn advance_time(&mut self, dt: f64) -> Result<TickResult, StepError> {
        self.engine.advance_time(dt)
    }

    // ── Reading ──────────────────────────────────────────────────

    /// Project `vessel` at the current clock time.
    ///
    /// Pure: any number of calls at the same clock time return equal
    /// snapshots and leave the session bit-identical.
    pub fn read(&self, vessel: VesselId) -> Result<VesselSnapshot, KernelError> {
        self.engine
            .vessel(vessel)
            .map(|v| VesselSnapshot::capture(v, self.engine.now()))
            .ok_or(KernelError::VesselNotSeeded { vessel })
    }

    /// Seeded vessel ids, ascending.
    pub fn vessel_ids(&self) -> impl Iterator<Item = VesselId> + '_ {
        self.engine.vessels().keys().copied()
    }

    /// Direct view of one vessel's state.
    pub fn vessel(&self, vessel: VesselId) -> Option<&VesselState> {
        self.engine.vessel(vessel)
    }

    /// FNV-1a fingerprint of every vessel's state.
    pub fn state_hash(&self) -> u64 {
        state_hash(self.engine.vessels().values())
    }

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.engine.now()
    }

    /// Completed ticks.
    pub fn current_tick(&self) -> TickId {
        self.engine.current_tick()
    }

    /// Whether a contract violation halted the session.
    pub fn is_halted(&self) -> bool {
        self.engine.is_halted()
    }

    /// Metrics from the most recent successful tick.
    pub fn last_metrics(&self) -> &StepMetrics {
        self.engine.last_metrics()
    }

    /// The underlying engine.
    pub fn engine(&self) -> &TickEngine {
        &self.engine
    }
}

impl std::fmt::Debug for LabSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabSession")
            .field("engine", &self.engine)
            .finish()
    }
}
