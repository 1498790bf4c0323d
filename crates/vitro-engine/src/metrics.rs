//! Per-tick metrics for the simulation engine.
//!
//! [`StepMetrics`] captures timing and counts for a single
//! `advance_time` call.

/// Timing and count metrics collected during a single tick.
///
/// All durations are in microseconds. The engine fills these in after
/// each `advance_time()`; cumulative counters carry across ticks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire tick, in microseconds.
    pub total_us: u64,
    /// Time spent flushing the scheduler, in microseconds.
    pub flush_us: u64,
    /// Time spent in the interval stepper, deliveries included.
    pub stepping_us: u64,
    /// Per-mechanism time across all sub-intervals: `(name, microseconds)`.
    pub mechanism_us: Vec<(String, u64)>,
    /// Number of sub-intervals the tick was split into.
    pub sub_intervals: u32,
    /// Operations delivered this tick.
    pub deliveries: u32,
    /// Hazard commits performed this tick.
    pub commits: u32,
    /// Viable cells removed this tick, instant kills included.
    pub cells_killed: f64,
    /// Vessels alive at the end of the tick.
    pub vessel_count: u32,
    /// Operations still pending after the tick.
    pub pending_operations: u32,
    /// Cumulative number of submissions rejected because the queue was full.
    pub queue_full_rejections: u64,
    /// Cumulative number of submissions rejected for causality.
    pub causality_rejections: u64,
}
