//! Death ledger: the single record of how many cells died of what.
//!
//! The ledger stores dead cell *counts* keyed by [`DeathCause`]. Fractions
//! are derived against the total population ever present
//! (`viable + total_dead`), so they sum with viability to exactly one and
//! can never exceed it while `viable >= 0`.

use std::collections::BTreeMap;

use crate::error::ConservationError;
use crate::id::{DeathCause, VesselId};

/// Relative slack allowed on the conservation check.
pub const CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Cumulative dead cell counts by cause.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeathLedger {
    counts: BTreeMap<DeathCause, f64>,
    total_dead: f64,
    last_committed_t1: Option<f64>,
}

impl DeathLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dead cells attributed to `cause`.
    pub fn count(&self, cause: &DeathCause) -> f64 {
        self.counts.get(cause).copied().unwrap_or(0.0)
    }

    /// All dead cells, over every cause.
    pub fn total_dead(&self) -> f64 {
        self.total_dead
    }

    /// Entries in cause order.
    pub fn iter(&self) -> impl Iterator<Item = (&DeathCause, f64)> {
        self.counts.iter().map(|(c, n)| (c, *n))
    }

    /// Number of distinct causes recorded.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether nothing has died yet.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fraction of the total population dead of each cause.
    ///
    /// `viable` is the current viable count; the denominator is every cell
    /// ever present. An empty vessel yields an empty map.
    pub fn fractions(&self, viable: f64) -> BTreeMap<DeathCause, f64> {
        let total = viable + self.total_dead;
        if total <= 0.0 {
            return BTreeMap::new();
        }
        self.counts
            .iter()
            .map(|(c, n)| (c.clone(), n / total))
            .collect()
    }

    /// Total dead fraction against `viable` survivors.
    pub fn dead_fraction(&self, viable: f64) -> f64 {
        let total = viable + self.total_dead;
        if total <= 0.0 {
            0.0
        } else {
            self.total_dead / total
        }
    }

    /// End of the most recently committed hazard interval.
    pub fn last_committed_t1(&self) -> Option<f64> {
        self.last_committed_t1
    }

    /// Add `cells` to `cause`. Zero is a no-op and leaves no entry.
    pub(crate) fn record(
        &mut self,
        vessel: VesselId,
        cause: DeathCause,
        cells: f64,
    ) -> Result<(), ConservationError> {
        if !cells.is_finite() || cells < 0.0 {
            return Err(ConservationError::CorruptEntry {
                vessel,
                cause,
                count: cells,
            });
        }
        if cells == 0.0 {
            return Ok(());
        }
        *self.counts.entry(cause).or_insert(0.0) += cells;
        self.total_dead += cells;
        Ok(())
    }

    pub(crate) fn mark_committed(&mut self, t1: f64) {
        self.last_committed_t1 = Some(t1);
    }

    /// Verify every entry is finite and non-negative and that the dead
    /// fraction does not exceed one.
    pub fn check(&self, vessel: VesselId, viable: f64) -> Result<(), ConservationError> {
        for (cause, &count) in &self.counts {
            if !count.is_finite() || count < 0.0 {
                return Err(ConservationError::CorruptEntry {
                    vessel,
                    cause: cause.clone(),
                    count,
                });
            }
        }
        let total_fraction: f64 = self.fractions(viable).values().sum();
        if viable.is_nan() || viable < 0.0 || total_fraction > 1.0 + CONSERVATION_TOLERANCE {
            return Err(ConservationError::LedgerOverflow {
                vessel,
                total_fraction,
            });
        }
        Ok(())
    }
}
