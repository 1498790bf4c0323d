//! Read-only projection of a vessel, handed to assays.

use std::collections::BTreeMap;

use crate::id::{CellLineId, CompoundId, DeathCause, StressAxis, VesselId};
use crate::vessel::{Exposure, Nutrients, VesselState};

/// Owned copy of a vessel's biology at one clock time.
///
/// Captured from a `&VesselState`, so taking one cannot mutate the vessel.
#[derive(Clone, Debug, PartialEq)]
pub struct VesselSnapshot {
    /// The vessel.
    pub vessel: VesselId,
    /// Clock time the snapshot was taken at.
    pub observed_at: f64,
    /// Seeded cell line.
    pub cell_line: CellLineId,
    /// Live cells.
    pub viable_cells: f64,
    /// Dead cells, all causes.
    pub dead_cells: f64,
    /// Live fraction of all cells ever present.
    pub viability: f64,
    /// Stress axis levels.
    pub stress: BTreeMap<StressAxis, f64>,
    /// Medium nutrients.
    pub nutrients: Nutrients,
    /// Compounds present.
    pub compounds: BTreeMap<CompoundId, Exposure>,
    /// First dose time of every compound ever delivered.
    pub first_dosed: BTreeMap<CompoundId, f64>,
    /// Dead fraction per cause.
    pub death_fractions: BTreeMap<DeathCause, f64>,
    /// Seeding time.
    pub seeded_at: f64,
    /// End of the last stepped interval.
    pub last_update_time: f64,
}

impl VesselSnapshot {
    /// Copy `vessel`'s state, stamped at `now`.
    pub fn capture(vessel: &VesselState, now: f64) -> Self {
        Self {
            vessel: vessel.id(),
            observed_at: now,
            cell_line: vessel.cell_line().clone(),
            viable_cells: vessel.viable_cells(),
            dead_cells: vessel.ledger().total_dead(),
            viability: vessel.viability(),
            stress: vessel.stress_levels().clone(),
            nutrients: vessel.nutrients(),
            compounds: vessel.compounds().clone(),
            first_dosed: vessel.first_dosed().clone(),
            death_fractions: vessel.ledger().fractions(vessel.viable_cells()),
            seeded_at: vessel.seeded_at(),
            last_update_time: vessel.last_update_time(),
        }
    }

    /// Total cells ever present.
    pub fn total_cells(&self) -> f64 {
        self.viable_cells + self.dead_cells
    }

    /// Earliest treatment the vessel has received, washed out or not.
    pub fn treatment_start_time(&self) -> Option<f64> {
        self.first_dosed.values().copied().min_by(f64::total_cmp)
    }
}
