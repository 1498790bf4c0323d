//! Per-vessel stepping over one half-open interval.
//!
//! [`IntervalStepper::step`] runs a fixed phase order for one vessel:
//!
//! 1. deliver operations due at `t0` (instantaneous effects);
//! 2. if `dt > 0`, every mechanism's `advance` against the frozen `t0`
//!    view, then apply the staged latent writes and onset markers;
//! 3. open a hazard cycle and collect every mechanism's proposals;
//! 4. commit and close the cycle;
//! 5. integrate resources, apply growth, decay compounds;
//! 6. stamp `last_update_time = t1`.
//!
//! A zero-length interval stops after phase 1.

use std::collections::BTreeMap;
use std::time::Instant;

use smallvec::SmallVec;
use vitro_core::{
    require_cell_line, CommitRecord, DeliveryRecord, HazardCycle, Interval, KernelError,
    MechanismError, ParameterProvider, PendingOperation, StepError, StressAxis, TickId, VesselId,
    VesselState,
};
use vitro_mechanism::{LatentWrites, Mechanism, StepContext};

use crate::delivery::deliver;
use crate::resource::{decay_compounds, ResourceIntegrator, ResourceUpdate};

/// What happened to one vessel over one interval.
#[derive(Clone, Debug, PartialEq)]
pub struct VesselStepReport {
    /// The vessel.
    pub vessel: VesselId,
    /// Operations delivered, in delivery order.
    pub deliveries: Vec<DeliveryRecord>,
    /// Hazard outcome, absent for zero-length intervals.
    pub commit: Option<CommitRecord>,
    /// Resource outcome, absent for zero-length intervals.
    pub resources: Option<ResourceUpdate>,
    /// Microseconds spent in each mechanism, in registration order.
    pub mechanism_us: SmallVec<[u64; 8]>,
}

impl VesselStepReport {
    fn new(vessel: VesselId, mechanisms: usize) -> Self {
        Self {
            vessel,
            deliveries: Vec::new(),
            commit: None,
            resources: None,
            mechanism_us: SmallVec::from_elem(0, mechanisms),
        }
    }
}

/// Owns the mechanism registry and kinetic constants; steps one vessel
/// at a time.
pub struct IntervalStepper {
    params: Box<dyn ParameterProvider>,
    mechanisms: Vec<Box<dyn Mechanism>>,
    write_axes: Vec<Vec<StressAxis>>,
    integrator: ResourceIntegrator,
}

impl IntervalStepper {
    /// Build a stepper. The registry should already be validated.
    pub fn new(
        params: Box<dyn ParameterProvider>,
        mechanisms: Vec<Box<dyn Mechanism>>,
        integrator: ResourceIntegrator,
    ) -> Self {
        let write_axes = mechanisms.iter().map(|m| m.writes_axes()).collect();
        Self {
            params,
            mechanisms,
            write_axes,
            integrator,
        }
    }

    /// Kinetic constants.
    pub fn params(&self) -> &dyn ParameterProvider {
        &*self.params
    }

    /// Registered mechanisms, in stepping order.
    pub fn mechanisms(&self) -> &[Box<dyn Mechanism>] {
        &self.mechanisms
    }

    /// The resource integrator in use.
    pub fn integrator(&self) -> ResourceIntegrator {
        self.integrator
    }

    /// Step vessel `id` over `interval`, delivering `ops` first.
    ///
    /// `ops` must already be in delivery order and all target `id`. A
    /// vessel that does not exist after delivery is skipped.
    pub fn step(
        &self,
        vessels: &mut BTreeMap<VesselId, VesselState>,
        id: VesselId,
        ops: &[&PendingOperation],
        interval: Interval,
        tick: TickId,
    ) -> Result<VesselStepReport, StepError> {
        let mut report = VesselStepReport::new(id, self.mechanisms.len());
        let violation = |source: KernelError| StepError::Vessel {
            vessel: id,
            interval,
            source,
        };

        // Phase 1: deliver.
        for op in ops {
            let record = deliver(vessels, op, &*self.params, interval.t0()).map_err(violation)?;
            report.deliveries.push(record);
        }

        let Some(vessel) = vessels.get_mut(&id) else {
            return Ok(report);
        };
        if interval.is_empty() {
            return Ok(report);
        }

        // Phase 2: latent dynamics.
        self.advance_latents(vessel, interval, tick, &mut report)?;

        // Phases 3-4: hazards.
        let record = self.commit_hazards(vessel, interval, tick, &mut report)?;
        report.commit = Some(record);

        // Phase 5: resources.
        let update = self.integrate_resources(vessel, interval).map_err(violation)?;
        report.resources = Some(update);

        // Phase 6.
        vessel.set_last_update_time(interval.t1());
        Ok(report)
    }

    fn advance_latents(
        &self,
        vessel: &mut VesselState,
        interval: Interval,
        tick: TickId,
        report: &mut VesselStepReport,
    ) -> Result<(), StepError> {
        let id = vessel.id();
        let mut staged = Vec::with_capacity(self.mechanisms.len());
        {
            let ctx = StepContext::new(&*vessel, &*self.params, interval, tick);
            for (i, m) in self.mechanisms.iter().enumerate() {
                let start = Instant::now();
                let mut writes = LatentWrites::for_axes(self.write_axes[i].clone());
                m.advance(&ctx, &mut writes)
                    .map_err(|e| mechanism_failure(m.name(), id, interval, e))?;
                report.mechanism_us[i] += start.elapsed().as_micros() as u64;
                staged.push(writes);
            }
        }

        for writes in &staged {
            for (axis, value) in writes.iter() {
                vessel
                    .set_stress(axis, value)
                    .map_err(|source| StepError::Vessel {
                        vessel: id,
                        interval,
                        source,
                    })?;
            }
        }
        for axis in StressAxis::ALL {
            if let Some(p) = self.params.stress_axis(axis) {
                vessel.update_onset(axis, p.onset_threshold, interval.t0());
            }
        }
        Ok(())
    }

    fn commit_hazards(
        &self,
        vessel: &mut VesselState,
        interval: Interval,
        tick: TickId,
        report: &mut VesselStepReport,
    ) -> Result<CommitRecord, StepError> {
        let id = vessel.id();
        let violation = |source: KernelError| StepError::Vessel {
            vessel: id,
            interval,
            source,
        };

        let mut cycle =
            HazardCycle::begin(vessel, interval).map_err(|e| violation(e.into()))?;
        {
            let ctx = StepContext::new(&*vessel, &*self.params, interval, tick);
            for (i, m) in self.mechanisms.iter().enumerate() {
                let start = Instant::now();
                m.propose(&ctx, &mut cycle)
                    .map_err(|e| mechanism_failure(m.name(), id, interval, e))?;
                report.mechanism_us[i] += start.elapsed().as_micros() as u64;
            }
        }
        cycle
            .commit(vessel)
            .map_err(violation)?
            .finish(vessel)
            .map_err(|e| violation(e.into()))
    }

    fn integrate_resources(
        &self,
        vessel: &mut VesselState,
        interval: Interval,
    ) -> Result<ResourceUpdate, KernelError> {
        let line = require_cell_line(&*self.params, vessel.cell_line())?;
        let update =
            self.integrator
                .integrate(line, vessel.viable_cells(), vessel.nutrients(), interval.dt());
        vessel.set_nutrients(update.nutrients)?;
        vessel.set_grown_population(update.viable_end)?;
        decay_compounds(vessel, &*self.params, interval.dt())?;
        Ok(update)
    }
}

impl std::fmt::Debug for IntervalStepper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.mechanisms.iter().map(|m| m.name()).collect();
        f.debug_struct("IntervalStepper")
            .field("mechanisms", &names)
            .field("integrator", &self.integrator)
            .finish_non_exhaustive()
    }
}

/// Kernel violations raised inside a mechanism keep their contract; any
/// other failure is attributed to the mechanism.
fn mechanism_failure(
    name: &str,
    vessel: VesselId,
    interval: Interval,
    err: MechanismError,
) -> StepError {
    match err {
        MechanismError::Kernel(source) => StepError::Vessel {
            vessel,
            interval,
            source,
        },
        other => StepError::MechanismFailed {
            name: name.to_string(),
            vessel,
            interval,
            source: other,
        },
    }
}
