//! Execution context passed to mechanisms.

use vitro_core::{
    require_cell_line, CellLineParams, Interval, KernelError, ParameterProvider, TickId,
    VesselState,
};

/// Read-only view handed to [`Mechanism`](crate::Mechanism) calls.
///
/// `vessel()` is the state at the interval start. During `advance` every
/// mechanism sees the same frozen view regardless of what others staged
/// (Jacobi style). During `propose` it reflects the applied latent writes.
pub struct StepContext<'a> {
    vessel: &'a VesselState,
    params: &'a dyn ParameterProvider,
    interval: Interval,
    tick_id: TickId,
}

impl<'a> StepContext<'a> {
    /// Construct a new step context.
    ///
    /// Typically called by the engine; tests build one directly.
    pub fn new(
        vessel: &'a VesselState,
        params: &'a dyn ParameterProvider,
        interval: Interval,
        tick_id: TickId,
    ) -> Self {
        Self {
            vessel,
            params,
            interval,
            tick_id,
        }
    }

    /// The vessel being stepped.
    pub fn vessel(&self) -> &VesselState {
        self.vessel
    }

    /// Kinetic constants.
    pub fn params(&self) -> &dyn ParameterProvider {
        self.params
    }

    /// Constants for this vessel's cell line.
    pub fn cell_line(&self) -> Result<&CellLineParams, KernelError> {
        require_cell_line(self.params, self.vessel.cell_line())
    }

    /// The interval being stepped.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Frozen interval start; the temporal reference for onset logic.
    pub fn t0(&self) -> f64 {
        self.interval.t0()
    }

    /// Interval length in hours.
    pub fn dt(&self) -> f64 {
        self.interval.dt()
    }

    /// Tick that requested this step.
    pub fn tick_id(&self) -> TickId {
        self.tick_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitro_core::{StressAxis, VesselId};
    use vitro_test_utils::{seeded_vessel, standard_params, HEPG2};

    #[test]
    fn context_exposes_frozen_interval_and_params() {
        let params = standard_params();
        let vessel = seeded_vessel(VesselId(2), 1.0e5);
        let ctx = StepContext::new(
            &vessel,
            &params,
            Interval::new(6.0, 2.0).unwrap(),
            TickId(3),
        );
        assert_eq!(ctx.t0(), 6.0);
        assert_eq!(ctx.dt(), 2.0);
        assert_eq!(ctx.tick_id(), TickId(3));
        assert_eq!(ctx.vessel().cell_line().as_str(), HEPG2);
        assert!(ctx.cell_line().is_ok());
        assert!(ctx.params().stress_axis(StressAxis::ErStress).is_some());
    }
}
