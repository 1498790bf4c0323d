//! Strongly-typed identifiers for vessels, operations, and the entities
//! the parameter provider is keyed by.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a vessel (well or flask) within a simulation session.
///
/// Vessels are stepped in ascending `VesselId` order, so the id also fixes
/// the per-tick processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VesselId(pub u32);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vessel#{}", self.0)
    }
}

impl From<u32> for VesselId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonic submission counter assigned by the scheduler.
///
/// Used only as the final tie-break when ordering operations that share
/// a due time and priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SequenceId(pub u64);

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Handle returned by a successful submission.
///
/// Can be passed back to the scheduler to withdraw the operation before
/// it is flushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationHandle(pub SequenceId);

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// Counts completed `advance_time` calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identity of a cell line (e.g. `"HepG2"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellLineId(pub String);

impl CellLineId {
    /// Borrow the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellLineId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

/// Identity of a compound (e.g. `"tunicamycin"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompoundId(pub String);

impl CompoundId {
    /// Borrow the raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompoundId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

/// A latent, continuous stress variable evolved by an ODE.
///
/// Every axis value lives in `[0, 1]`. The variant order is the iteration
/// order used everywhere determinism matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressAxis {
    /// Unfolded protein response / ER stress.
    ErStress,
    /// Mitochondrial dysfunction.
    Mitochondrial,
    /// Reactive oxygen species load.
    Oxidative,
    /// Accumulated DNA damage.
    DnaDamage,
    /// Nutrient deprivation signalling.
    Nutrient,
}

impl StressAxis {
    /// Every axis, in iteration order.
    pub const ALL: [StressAxis; 5] = [
        StressAxis::ErStress,
        StressAxis::Mitochondrial,
        StressAxis::Oxidative,
        StressAxis::DnaDamage,
        StressAxis::Nutrient,
    ];

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ErStress => "er_stress",
            Self::Mitochondrial => "mitochondrial",
            Self::Oxidative => "oxidative",
            Self::DnaDamage => "dna_damage",
            Self::Nutrient => "nutrient",
        }
    }
}

impl fmt::Display for StressAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cause of cell death, as recorded in the death ledger.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Basal turnover of the cell line.
    Baseline,
    /// Nutrient exhaustion.
    Starvation,
    /// Direct compound cytotoxicity (instant kill or attrition).
    Compound(CompoundId),
    /// Toxicity driven by a latent stress axis.
    Stress(StressAxis),
    /// Cells that were already non-viable when the vessel was seeded.
    Seeding,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => f.write_str("baseline"),
            Self::Starvation => f.write_str("starvation"),
            Self::Compound(c) => write!(f, "compound:{c}"),
            Self::Stress(axis) => write!(f, "stress:{axis}"),
            Self::Seeding => f.write_str("seeding"),
        }
    }
}
