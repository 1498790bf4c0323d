//! Tick engine: the single-threaded `advance_time` loop.
//!
//! [`TickEngine`] wires the scheduler, the interval stepper, and the
//! clock into a deterministic tick with rollback atomicity. A tick:
//!
//! 1. splits `[now, now + dt)` at every pending operation time inside
//!    it and at the substep bound;
//! 2. for each sub-interval, flushes operations due at its `t0` and
//!    steps every vessel in ascending id order;
//! 3. advances the clock to the sub-interval's `t1`.
//!
//! All of this runs against staged copies. A contract violation
//! discards the staging, halts the engine, and reaches the caller as a
//! [`StepError`]; nothing of the failed tick is ever visible.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use smallvec::SmallVec;
use vitro_core::{
    CommitRecord, DeliveryRecord, Interval, OperationHandle, OperationRequest, PendingOperation,
    SimClock, StepError, SubmitError, TickId, VesselId, VesselState,
};
use vitro_mechanism::validate_pipeline;

use crate::config::{ConfigError, SessionConfig};
use crate::metrics::StepMetrics;
use crate::resource::ResourceIntegrator;
use crate::scheduler::OperationScheduler;
use crate::stepper::IntervalStepper;

// ── TickResult ───────────────────────────────────────────────────

/// Result of a successful `advance_time`.
#[derive(Clone, Debug, PartialEq)]
pub struct TickResult {
    /// The tick that ran.
    pub tick: TickId,
    /// The full interval advanced over.
    pub interval: Interval,
    /// Every delivered operation, in delivery order.
    pub deliveries: Vec<DeliveryRecord>,
    /// Every hazard commit, in sub-interval then vessel order.
    pub commits: Vec<CommitRecord>,
    /// Performance metrics for this tick.
    pub metrics: StepMetrics,
}

/// Mutable state a tick works on. Cloned at tick start, swapped in on
/// success.
#[derive(Clone)]
struct Staged {
    vessels: BTreeMap<VesselId, VesselState>,
    scheduler: OperationScheduler,
    clock: SimClock,
}

// ── TickEngine ───────────────────────────────────────────────────

/// Single-threaded simulation engine.
///
/// Owns all vessel state. Each [`advance_time()`](Self::advance_time)
/// runs to completion before returning.
pub struct TickEngine {
    stepper: IntervalStepper,
    state: Staged,
    substep_h: f64,
    current_tick: TickId,
    halted: bool,
    last_metrics: StepMetrics,
    queue_full_rejections: u64,
    causality_rejections: u64,
}

impl TickEngine {
    /// Construct an engine from a [`SessionConfig`].
    ///
    /// Validates the configuration and derives the effective substep
    /// from `max_substep_h` and the tightest mechanism `max_dt`.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let plan = validate_pipeline(&config.mechanisms)?;
        let substep_h = match plan.max_dt() {
            Some((limit, name)) if limit < config.max_substep_h => {
                tracing::debug!(mechanism = name, limit, "substep bounded by mechanism");
                limit
            }
            _ => config.max_substep_h,
        };
        let clock = SimClock::new(config.start_time).map_err(|_| ConfigError::InvalidStartTime {
            value: config.start_time,
        })?;

        Ok(Self {
            stepper: IntervalStepper::new(
                config.params,
                config.mechanisms,
                ResourceIntegrator::new(config.integration),
            ),
            state: Staged {
                vessels: BTreeMap::new(),
                scheduler: OperationScheduler::new(config.max_pending_operations),
                clock,
            },
            substep_h,
            current_tick: TickId(0),
            halted: false,
            last_metrics: StepMetrics::default(),
            queue_full_rejections: 0,
            causality_rejections: 0,
        })
    }

    /// Queue an operation. Never touches vessel state.
    pub fn submit(&mut self, request: OperationRequest) -> Result<OperationHandle, SubmitError> {
        if self.halted {
            return Err(SubmitError::Halted);
        }
        let target = request.target_vessel;
        let time = request.scheduled_time;
        let kind = request.payload.kind();
        match self.state.scheduler.submit(request, self.state.clock.now()) {
            Ok(handle) => {
                tracing::debug!(vessel = %target, %kind, time, %handle, "operation submitted");
                Ok(handle)
            }
            Err(e) => {
                match e {
                    SubmitError::QueueFull { .. } => self.queue_full_rejections += 1,
                    SubmitError::Causality(_) => self.causality_rejections += 1,
                    _ => {}
                }
                tracing::warn!(vessel = %target, %kind, time, error = %e, "submission rejected");
                Err(e)
            }
        }
    }

    /// Withdraw a pending operation.
    pub fn withdraw(&mut self, handle: OperationHandle) -> Result<PendingOperation, SubmitError> {
        if self.halted {
            return Err(SubmitError::Halted);
        }
        self.state.scheduler.withdraw(handle)
    }

    /// Advance simulated time by `dt` hours.
    ///
    /// `dt = 0` delivers operations due now and performs no integration.
    ///
    /// # Errors
    ///
    /// - [`StepError::Interval`] for a negative or non-finite `dt`; the
    ///   engine is left untouched.
    /// - [`StepError::Halted`] once a previous tick failed.
    /// - Any other variant is a contract violation: the tick is rolled
    ///   back and the engine halts.
    pub fn advance_time(&mut self, dt: f64) -> Result<TickResult, StepError> {
        let tick_start = Instant::now();
        if self.halted {
            return Err(StepError::Halted {
                at: self.state.clock.now(),
            });
        }
        let span = self.state.clock.interval(dt)?;
        let tick = TickId(self.current_tick.0 + 1);

        let mut staged = self.state.clone();
        let mut metrics = StepMetrics {
            mechanism_us: self
                .stepper
                .mechanisms()
                .iter()
                .map(|m| (m.name().to_string(), 0))
                .collect(),
            ..StepMetrics::default()
        };
        let mut deliveries = Vec::new();
        let mut commits = Vec::new();

        let outcome = self.run(
            &mut staged,
            span,
            tick,
            &mut metrics,
            &mut deliveries,
            &mut commits,
        );
        if let Err(e) = outcome {
            self.halted = true;
            tracing::error!(
                tick = tick.0,
                %span,
                vessel = ?e.vessel(),
                contract = e.contract(),
                error = %e,
                "contract violation; session halted"
            );
            return Err(e);
        }

        self.state = staged;
        self.current_tick = tick;
        metrics.vessel_count = self.state.vessels.len() as u32;
        metrics.pending_operations = self.state.scheduler.len() as u32;
        metrics.queue_full_rejections = self.queue_full_rejections;
        metrics.causality_rejections = self.causality_rejections;
        metrics.total_us = tick_start.elapsed().as_micros() as u64;
        self.last_metrics = metrics.clone();

        tracing::debug!(
            tick = tick.0,
            %span,
            sub_intervals = metrics.sub_intervals,
            deliveries = metrics.deliveries,
            commits = metrics.commits,
            "tick complete"
        );

        Ok(TickResult {
            tick,
            interval: span,
            deliveries,
            commits,
            metrics,
        })
    }

    fn run(
        &self,
        staged: &mut Staged,
        span: Interval,
        tick: TickId,
        metrics: &mut StepMetrics,
        deliveries: &mut Vec<DeliveryRecord>,
        commits: &mut Vec<CommitRecord>,
    ) -> Result<(), StepError> {
        let end = span.t1();
        let mut t = span.t0();
        loop {
            let mut seg_end = end;
            if let Some(next) = staged.scheduler.next_due_after(t) {
                seg_end = seg_end.min(next);
            }
            let capped = t + self.substep_h;
            if capped > t && capped < seg_end {
                seg_end = capped;
            }
            let segment = Interval::between(t, seg_end)?;

            let flush_start = Instant::now();
            let due = staged.scheduler.flush(segment.t0());
            let mut by_vessel: BTreeMap<VesselId, SmallVec<[&PendingOperation; 4]>> =
                BTreeMap::new();
            for op in &due {
                by_vessel.entry(op.target_vessel()).or_default().push(op);
            }
            metrics.flush_us += flush_start.elapsed().as_micros() as u64;

            let step_start = Instant::now();
            let ids: BTreeSet<VesselId> = staged
                .vessels
                .keys()
                .chain(by_vessel.keys())
                .copied()
                .collect();
            for id in ids {
                let ops = by_vessel.get(&id).map_or(&[][..], |v| v.as_slice());
                let report = self
                    .stepper
                    .step(&mut staged.vessels, id, ops, segment, tick)?;
                for (slot, us) in metrics.mechanism_us.iter_mut().zip(&report.mechanism_us) {
                    slot.1 += us;
                }
                for d in &report.deliveries {
                    metrics.cells_killed += d.cells_killed;
                }
                metrics.deliveries += report.deliveries.len() as u32;
                deliveries.extend(report.deliveries);
                if let Some(c) = report.commit {
                    metrics.cells_killed += c.cells_killed;
                    metrics.commits += 1;
                    commits.push(c);
                }
            }
            metrics.stepping_us += step_start.elapsed().as_micros() as u64;

            staged.clock.commit(segment)?;
            metrics.sub_intervals += 1;
            t = seg_end;
            if t >= end {
                return Ok(());
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.state.clock.now()
    }

    /// One vessel's state, if seeded.
    pub fn vessel(&self, id: VesselId) -> Option<&VesselState> {
        self.state.vessels.get(&id)
    }

    /// Every vessel, in ascending id order.
    pub fn vessels(&self) -> &BTreeMap<VesselId, VesselState> {
        &self.state.vessels
    }

    /// The pending-operation queue.
    pub fn scheduler(&self) -> &OperationScheduler {
        &self.state.scheduler
    }

    /// The stepper (mechanisms and parameters).
    pub fn stepper(&self) -> &IntervalStepper {
        &self.stepper
    }

    /// Number of completed ticks.
    pub fn current_tick(&self) -> TickId {
        self.current_tick
    }

    /// Effective sub-interval bound, in hours.
    pub fn substep_h(&self) -> f64 {
        self.substep_h
    }

    /// Whether a contract violation has halted the engine.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Metrics from the most recent successful tick.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }
}

impl std::fmt::Debug for TickEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickEngine")
            .field("now", &self.now())
            .field("current_tick", &self.current_tick)
            .field("vessels", &self.state.vessels.len())
            .field("pending", &self.state.scheduler.len())
            .field("halted", &self.halted)
            .finish_non_exhaustive()
    }
}
