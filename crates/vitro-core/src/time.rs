//! Simulated time: the [`SimClock`] and the half-open [`Interval`] contract.
//!
//! Every stepping function receives an explicit [`Interval`] value instead
//! of reading a global "current time". Physics for an interval is computed
//! against its frozen start `t0`; results are valid as of `t1`.
//!
//! Time is measured in simulated hours.

use std::fmt;

use crate::error::IntervalError;

/// The half-open interval `[t0, t1)`.
///
/// Both endpoints are stored, so splitting an interval at a scheduled
/// operation time lands exactly on that time. `dt` may be zero (a
/// flush-only step) but never negative or non-finite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    t0: f64,
    t1: f64,
}

impl Interval {
    /// Construct `[t0, t0 + dt)`.
    ///
    /// # Errors
    ///
    /// Returns [`IntervalError::InvalidStart`] if `t0` is not finite and
    /// [`IntervalError::InvalidDt`] if `dt` is negative, NaN, or infinite.
    pub fn new(t0: f64, dt: f64) -> Result<Self, IntervalError> {
        if !t0.is_finite() {
            return Err(IntervalError::InvalidStart { t0 });
        }
        if !dt.is_finite() || dt < 0.0 || !(t0 + dt).is_finite() {
            return Err(IntervalError::InvalidDt { dt });
        }
        Ok(Self { t0, t1: t0 + dt })
    }

    /// Construct the interval `[t0, t1)` with both endpoints exact.
    pub fn between(t0: f64, t1: f64) -> Result<Self, IntervalError> {
        if !t0.is_finite() {
            return Err(IntervalError::InvalidStart { t0 });
        }
        let dt = t1 - t0;
        if !t1.is_finite() || dt < 0.0 {
            return Err(IntervalError::InvalidDt { dt });
        }
        Ok(Self { t0, t1 })
    }

    /// Frozen start of the interval. All "time since X" logic uses this.
    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Length of the interval in hours.
    pub fn dt(&self) -> f64 {
        self.t1 - self.t0
    }

    /// Exclusive end of the interval; the timestamp results are valid at.
    pub fn t1(&self) -> f64 {
        self.t1
    }

    /// Whether this is a zero-length (flush-only) interval.
    pub fn is_empty(&self) -> bool {
        self.t1 <= self.t0
    }

    /// Half-open membership: `t0 <= t < t1`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t0 && t < self.t1
    }

    /// Time elapsed between `since` and the start of this interval.
    ///
    /// Measured against `t0`, never `t1`.
    pub fn elapsed_since(&self, since: f64) -> f64 {
        self.t0 - since
    }

    /// Split this interval at `at`, returning `([t0, at), [at, t1))`.
    ///
    /// Returns `None` when `at` is not strictly inside the interval.
    pub fn split_at(&self, at: f64) -> Option<(Interval, Interval)> {
        if !self.contains(at) || at <= self.t0 {
            return None;
        }
        Some((
            Interval {
                t0: self.t0,
                t1: at,
            },
            Interval { t0: at, t1: self.t1 },
        ))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.t0, self.t1)
    }
}

/// The single, monotonically non-decreasing simulation clock.
///
/// `now` only moves when a completed interval is committed through
/// [`SimClock::commit`]; vessel code never reads it mid-step.
#[derive(Clone, Debug, PartialEq)]
pub struct SimClock {
    now: f64,
}

impl SimClock {
    /// Create a clock starting at `start` hours.
    pub fn new(start: f64) -> Result<Self, IntervalError> {
        if !start.is_finite() {
            return Err(IntervalError::InvalidStart { t0: start });
        }
        Ok(Self { now: start })
    }

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// The interval `[now, now + dt)`.
    pub fn interval(&self, dt: f64) -> Result<Interval, IntervalError> {
        Interval::new(self.now, dt)
    }

    /// Advance to `interval.t1()` once its effects are fully committed.
    ///
    /// The interval must start exactly at `now`; anything else means an
    /// interval was skipped or replayed.
    pub fn commit(&mut self, interval: Interval) -> Result<(), IntervalError> {
        if interval.t0().to_bits() != self.now.to_bits() {
            return Err(IntervalError::NotContiguous {
                now: self.now,
                t0: interval.t0(),
            });
        }
        self.now = interval.t1();
        Ok(())
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self { now: 0.0 }
    }
}
