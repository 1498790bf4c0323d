//! Per-vessel state record.
//!
//! A [`VesselState`] is created when a seed operation is delivered and is
//! mutated only by the interval stepper and the hazard cycle. Assays see it
//! through [`crate::VesselSnapshot`], never directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConservationError, KernelError, PhaseError};
use crate::hazard::HazardPhase;
use crate::id::{CellLineId, CompoundId, DeathCause, StressAxis, VesselId};
use crate::ledger::{DeathLedger, CONSERVATION_TOLERANCE};

/// Medium nutrient levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    /// Glucose, mM.
    pub glucose_mm: f64,
    /// Glutamine, mM.
    pub glutamine_mm: f64,
}

impl Nutrients {
    fn is_valid(&self) -> bool {
        self.glucose_mm.is_finite()
            && self.glucose_mm >= 0.0
            && self.glutamine_mm.is_finite()
            && self.glutamine_mm >= 0.0
    }
}

/// A compound present in the medium.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    /// Current concentration, µM.
    pub concentration_um: f64,
    /// Delivery time of the first dose still present.
    pub treatment_start_time: f64,
}

/// Mutable state of one vessel.
#[derive(Clone, Debug, PartialEq)]
pub struct VesselState {
    id: VesselId,
    cell_line: CellLineId,
    viable_cells: f64,
    stress: BTreeMap<StressAxis, f64>,
    stress_onset: BTreeMap<StressAxis, f64>,
    nutrients: Nutrients,
    compounds: BTreeMap<CompoundId, Exposure>,
    first_dosed: BTreeMap<CompoundId, f64>,
    ledger: DeathLedger,
    seeded_at: f64,
    last_update_time: f64,
    pub(crate) phase: HazardPhase,
}

impl VesselState {
    /// Create a vessel from a seed delivery.
    ///
    /// `cell_count · (1 − viability)` cells enter the ledger under
    /// [`DeathCause::Seeding`]. Every stress axis starts at zero.
    pub fn seed(
        id: VesselId,
        cell_line: CellLineId,
        cell_count: f64,
        viability: f64,
        medium: Nutrients,
        at: f64,
    ) -> Result<Self, KernelError> {
        if !cell_count.is_finite() || cell_count <= 0.0 {
            return Err(KernelError::InvalidPayload {
                reason: format!("cell_count must be finite and > 0, got {cell_count}"),
            });
        }
        if !viability.is_finite() || viability <= 0.0 || viability > 1.0 {
            return Err(KernelError::InvalidPayload {
                reason: format!("viability must be in (0, 1], got {viability}"),
            });
        }
        if !medium.is_valid() {
            return Err(KernelError::InvalidPayload {
                reason: format!("medium levels must be finite and >= 0, got {medium:?}"),
            });
        }
        let viable = cell_count * viability;
        let mut ledger = DeathLedger::new();
        ledger.record(id, DeathCause::Seeding, cell_count - viable)?;
        let stress = StressAxis::ALL.iter().map(|&a| (a, 0.0)).collect();
        Ok(Self {
            id,
            cell_line,
            viable_cells: viable,
            stress,
            stress_onset: BTreeMap::new(),
            nutrients: medium,
            compounds: BTreeMap::new(),
            first_dosed: BTreeMap::new(),
            ledger,
            seeded_at: at,
            last_update_time: at,
            phase: HazardPhase::Idle,
        })
    }

    // ── Accessors ───────────────────────────────────────────────

    /// Vessel identity.
    pub fn id(&self) -> VesselId {
        self.id
    }

    /// Seeded cell line.
    pub fn cell_line(&self) -> &CellLineId {
        &self.cell_line
    }

    /// Live cells.
    pub fn viable_cells(&self) -> f64 {
        self.viable_cells
    }

    /// `viable / (viable + dead)`, derived from the ledger.
    pub fn viability(&self) -> f64 {
        1.0 - self.ledger.dead_fraction(self.viable_cells)
    }

    /// Level of one stress axis, in `[0, 1]`.
    pub fn stress(&self, axis: StressAxis) -> f64 {
        self.stress.get(&axis).copied().unwrap_or(0.0)
    }

    /// All stress axes.
    pub fn stress_levels(&self) -> &BTreeMap<StressAxis, f64> {
        &self.stress
    }

    /// Interval start at which `axis` last crossed its onset threshold.
    pub fn stress_onset(&self, axis: StressAxis) -> Option<f64> {
        self.stress_onset.get(&axis).copied()
    }

    /// All onset markers.
    pub fn stress_onsets(&self) -> &BTreeMap<StressAxis, f64> {
        &self.stress_onset
    }

    /// Current medium nutrients.
    pub fn nutrients(&self) -> Nutrients {
        self.nutrients
    }

    /// Compounds present in the medium.
    pub fn compounds(&self) -> &BTreeMap<CompoundId, Exposure> {
        &self.compounds
    }

    /// Concentration of one compound, zero if absent.
    pub fn concentration(&self, compound: &CompoundId) -> f64 {
        self.compounds
            .get(compound)
            .map_or(0.0, |e| e.concentration_um)
    }

    /// First delivery time of every compound ever dosed, including
    /// compounds since washed out.
    pub fn first_dosed(&self) -> &BTreeMap<CompoundId, f64> {
        &self.first_dosed
    }

    /// Earliest treatment this vessel has received.
    ///
    /// Washout does not reset it: deaths and stress a compound caused
    /// outlive its presence in the medium.
    pub fn earliest_treatment_start(&self) -> Option<f64> {
        self.first_dosed.values().copied().min_by(f64::total_cmp)
    }

    /// The death ledger.
    pub fn ledger(&self) -> &DeathLedger {
        &self.ledger
    }

    /// Seeding time.
    pub fn seeded_at(&self) -> f64 {
        self.seeded_at
    }

    /// End of the last interval this vessel was stepped over.
    pub fn last_update_time(&self) -> f64 {
        self.last_update_time
    }

    /// Hazard phase marker.
    pub fn phase(&self) -> HazardPhase {
        self.phase
    }

    /// Whether a hazard cycle was opened and never finished.
    pub fn is_poisoned(&self) -> bool {
        self.phase != HazardPhase::Idle
    }

    // ── Instantaneous effects ───────────────────────────────────

    /// Kill `fraction` of viable cells immediately, attributing them to `cause`.
    ///
    /// Only permitted while no hazard cycle is open on this vessel.
    /// Returns the number of cells killed.
    pub fn apply_instant_kill(
        &mut self,
        cause: DeathCause,
        fraction: f64,
    ) -> Result<f64, KernelError> {
        if self.phase != HazardPhase::Idle {
            return Err(PhaseError::InstantKillDuringHazardPhase {
                vessel: self.id,
                phase: self.phase,
            }
            .into());
        }
        if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
            return Err(ConservationError::InvalidKillFraction {
                vessel: self.id,
                fraction,
            }
            .into());
        }
        let killed = self.viable_cells * fraction;
        self.ledger.record(self.id, cause, killed)?;
        self.viable_cells -= killed;
        self.ledger.check(self.id, self.viable_cells)?;
        Ok(killed)
    }

    /// Add `dose_um` of `compound`. Re-dosing keeps the original start time.
    pub fn add_compound(&mut self, compound: CompoundId, dose_um: f64, at: f64) {
        self.first_dosed.entry(compound.clone()).or_insert(at);
        self.compounds
            .entry(compound)
            .and_modify(|e| e.concentration_um += dose_um)
            .or_insert(Exposure {
                concentration_um: dose_um,
                treatment_start_time: at,
            });
    }

    /// Remove one compound, or every compound when `None`. Returns how
    /// many exposures were removed.
    pub fn remove_compounds(&mut self, compound: Option<&CompoundId>) -> usize {
        match compound {
            Some(id) => usize::from(self.compounds.remove(id).is_some()),
            None => {
                let n = self.compounds.len();
                self.compounds.clear();
                n
            }
        }
    }

    /// Replace the medium's nutrients.
    pub fn replace_nutrients(&mut self, fresh: Nutrients) -> Result<(), KernelError> {
        if !fresh.is_valid() {
            return Err(KernelError::InvalidPayload {
                reason: format!("nutrient levels must be finite and >= 0, got {fresh:?}"),
            });
        }
        self.nutrients = fresh;
        Ok(())
    }

    // ── Continuous updates (interval stepper) ───────────────────

    /// Store a new stress level. Values outside `[0, 1]` are rejected.
    pub fn set_stress(&mut self, axis: StressAxis, value: f64) -> Result<(), KernelError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(KernelError::LatentOutOfRange { axis, value });
        }
        self.stress.insert(axis, value);
        Ok(())
    }

    /// Maintain the onset marker for `axis` against `threshold`.
    ///
    /// The marker is set to `t0` on the first interval the axis is at or
    /// above threshold and cleared once it falls back below.
    pub fn update_onset(&mut self, axis: StressAxis, threshold: f64, t0: f64) {
        if self.stress(axis) >= threshold {
            self.stress_onset.entry(axis).or_insert(t0);
        } else {
            self.stress_onset.remove(&axis);
        }
    }

    /// Store the end-of-interval viable population predicted by growth.
    ///
    /// Growth never touches the ledger; it only adds live cells.
    pub fn set_grown_population(&mut self, viable: f64) -> Result<(), KernelError> {
        if !viable.is_finite() || viable < self.viable_cells * (1.0 - CONSERVATION_TOLERANCE) {
            return Err(ConservationError::KillExceedsViable {
                vessel: self.id,
                requested: self.viable_cells - viable,
                viable: self.viable_cells,
            }
            .into());
        }
        self.viable_cells = viable.max(self.viable_cells);
        Ok(())
    }

    /// Store nutrient levels after consumption.
    pub fn set_nutrients(&mut self, levels: Nutrients) -> Result<(), KernelError> {
        self.replace_nutrients(levels)
    }

    /// Mutable access to exposures for concentration decay.
    pub fn exposures_mut(&mut self) -> impl Iterator<Item = (&CompoundId, &mut Exposure)> {
        self.compounds.iter_mut()
    }

    /// Stamp the end of the interval just stepped.
    pub fn set_last_update_time(&mut self, t1: f64) {
        self.last_update_time = t1;
    }

    pub(crate) fn kill_from_commit(&mut self, killed: f64) {
        self.viable_cells = (self.viable_cells - killed).max(0.0);
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut DeathLedger {
        &mut self.ledger
    }
}
