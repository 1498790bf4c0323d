//! State hashing for determinism checks.
//!
//! Uses FNV-1a over the bit patterns of every vessel field. Two sessions
//! fed the same operations produce the same hash regardless of how many
//! reads happened in between. Not cryptographically secure.

use vitro_core::{DeathCause, StressAxis, VesselState};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

#[inline]
fn fnv1a_u32(hash: u64, v: u32) -> u64 {
    fnv1a_bytes(hash, &v.to_le_bytes())
}

#[inline]
fn fnv1a_f64(hash: u64, v: f64) -> u64 {
    fnv1a_bytes(hash, &v.to_bits().to_le_bytes())
}

/// Length-prefixed so adjacent strings cannot alias.
#[inline]
fn fnv1a_str(hash: u64, s: &str) -> u64 {
    fnv1a_bytes(fnv1a_u32(hash, s.len() as u32), s.as_bytes())
}

fn axis_tag(axis: StressAxis) -> u32 {
    StressAxis::ALL
        .iter()
        .position(|&a| a == axis)
        .map_or(u32::MAX, |i| i as u32)
}

fn fold_cause(hash: u64, cause: &DeathCause) -> u64 {
    match cause {
        DeathCause::Baseline => fnv1a_u32(hash, 0),
        DeathCause::Starvation => fnv1a_u32(hash, 1),
        DeathCause::Compound(c) => fnv1a_str(fnv1a_u32(hash, 2), c.as_str()),
        DeathCause::Stress(axis) => fnv1a_u32(fnv1a_u32(hash, 3), axis_tag(*axis)),
        DeathCause::Seeding => fnv1a_u32(hash, 4),
    }
}

/// Fold one vessel into `hash`.
fn fold_vessel(mut hash: u64, v: &VesselState) -> u64 {
    hash = fnv1a_u32(hash, v.id().0);
    hash = fnv1a_str(hash, v.cell_line().as_str());
    hash = fnv1a_f64(hash, v.viable_cells());
    for (&axis, &level) in v.stress_levels() {
        hash = fnv1a_u32(hash, axis_tag(axis));
        hash = fnv1a_f64(hash, level);
    }
    hash = fnv1a_u32(hash, v.stress_onsets().len() as u32);
    for (&axis, &onset) in v.stress_onsets() {
        hash = fnv1a_u32(hash, axis_tag(axis));
        hash = fnv1a_f64(hash, onset);
    }
    let n = v.nutrients();
    hash = fnv1a_f64(hash, n.glucose_mm);
    hash = fnv1a_f64(hash, n.glutamine_mm);
    hash = fnv1a_u32(hash, v.compounds().len() as u32);
    for (id, exposure) in v.compounds() {
        hash = fnv1a_str(hash, id.as_str());
        hash = fnv1a_f64(hash, exposure.concentration_um);
        hash = fnv1a_f64(hash, exposure.treatment_start_time);
    }
    hash = fnv1a_u32(hash, v.first_dosed().len() as u32);
    for (id, &at) in v.first_dosed() {
        hash = fnv1a_str(hash, id.as_str());
        hash = fnv1a_f64(hash, at);
    }
    hash = fnv1a_u32(hash, v.ledger().len() as u32);
    for (cause, count) in v.ledger().iter() {
        hash = fold_cause(hash, cause);
        hash = fnv1a_f64(hash, count);
    }
    hash = fnv1a_f64(hash, v.seeded_at());
    fnv1a_f64(hash, v.last_update_time())
}

/// Hash every vessel, in iteration order.
///
/// Callers pass vessels in ascending id order (a `BTreeMap` does this),
/// so the result is independent of insertion history. Returns the FNV
/// offset basis for an empty session.
pub fn state_hash<'a>(vessels: impl IntoIterator<Item = &'a VesselState>) -> u64 {
    vessels.into_iter().fold(FNV_OFFSET, fold_vessel)
}
