//! Seeded assay execution.
//!
//! [`AssayRunner`] owns one ChaCha8 stream. Two runners built with the
//! same seed and asked for the same readings in the same order produce
//! bit-identical records. The stream is separate from the session, so
//! measuring never perturbs the biology and never consumes randomness
//! the kernel depends on.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vitro_core::{ObservationRecord, VesselId, VesselSnapshot};
use vitro_engine::LabSession;

use crate::assay::Assay;
use crate::error::AssayError;

/// Runs assays against session reads, applying seeded noise.
///
/// # Example
///
/// ```
/// use vitro_assay::{AssayRunner, ViabilityAssay};
/// use vitro_core::{CellLineId, VesselId};
/// use vitro_engine::{LabSession, SessionConfig};
/// use vitro_test_utils::{standard_params, ConstHazard, HEPG2};
///
/// let mut lab = LabSession::new(SessionConfig::new(
///     standard_params(),
///     vec![Box::new(ConstHazard::baseline("basal", 0.01))],
/// ))
/// .unwrap();
/// lab.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0).unwrap();
/// lab.advance_time(12.0).unwrap();
///
/// let mut runner = AssayRunner::new(7);
/// let record = runner.measure(&lab, VesselId(0), &ViabilityAssay::new()).unwrap();
/// assert_eq!(record.observation_time(), 12.0);
/// assert!((0.0..=1.0).contains(&record.value()));
/// ```
#[derive(Clone, Debug)]
pub struct AssayRunner {
    seed: u64,
    rng: ChaCha8Rng,
    readings: u64,
}

impl AssayRunner {
    /// A runner whose noise stream is fixed by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            readings: 0,
        }
    }

    /// The construction seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Readings taken so far.
    pub fn readings(&self) -> u64 {
        self.readings
    }

    /// Restart the noise stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.readings = 0;
    }

    /// Read `vessel` from `session` and measure it with `assay`.
    pub fn measure(
        &mut self,
        session: &LabSession,
        vessel: VesselId,
        assay: &dyn Assay,
    ) -> Result<ObservationRecord, AssayError> {
        let snapshot = session.read(vessel)?;
        self.measure_snapshot(&snapshot, assay)
    }

    /// Measure `vessel` with every assay in `panel`, in order, from one read.
    pub fn measure_panel(
        &mut self,
        session: &LabSession,
        vessel: VesselId,
        panel: &[Box<dyn Assay>],
    ) -> Result<Vec<ObservationRecord>, AssayError> {
        let snapshot = session.read(vessel)?;
        panel
            .iter()
            .map(|assay| self.measure_snapshot(&snapshot, assay.as_ref()))
            .collect()
    }

    /// Measure an already-captured snapshot.
    ///
    /// The record is stamped with the snapshot's clock time and the
    /// vessel's earliest treatment, including compounds since washed out.
    pub fn measure_snapshot(
        &mut self,
        snapshot: &VesselSnapshot,
        assay: &dyn Assay,
    ) -> Result<ObservationRecord, AssayError> {
        let noise = assay.noise();
        noise.validate(assay.name())?;

        let truth = assay.true_value(snapshot);
        let mut value = truth;
        if !noise.is_exact() {
            let z1 = gaussian(&mut self.rng);
            let z2 = gaussian(&mut self.rng);
            value = truth * (1.0 + noise.cv * z1) + noise.floor * z2;
        }
        if !value.is_finite() {
            return Err(AssayError::NonFinite {
                assay: assay.name().to_string(),
            });
        }
        let (lo, hi) = assay.bounds();
        let value = value.clamp(lo, hi);
        self.readings += 1;

        let record = ObservationRecord::new(
            snapshot.vessel,
            assay.name(),
            snapshot.observed_at,
            snapshot.treatment_start_time(),
            value,
            assay.unit(),
        )?;
        tracing::trace!(
            vessel = %snapshot.vessel,
            assay = assay.name(),
            t = snapshot.observed_at,
            truth,
            value,
            "observation recorded"
        );
        Ok(record)
    }
}

/// Standard normal sample via the Box-Muller transform.
fn gaussian(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assay::NoiseModel;
    use crate::assays::{CellCountAssay, ViabilityAssay};
    use vitro_core::CompoundId;
    use vitro_test_utils::seeded_vessel;

    fn snapshot(at: f64) -> VesselSnapshot {
        VesselSnapshot::capture(&seeded_vessel(VesselId(3), 1.0e6), at)
    }

    #[test]
    fn same_seed_same_readings() {
        let s = snapshot(4.0);
        let assay = CellCountAssay::new();
        let mut a = AssayRunner::new(42);
        let mut b = AssayRunner::new(42);
        for _ in 0..20 {
            assert_eq!(
                a.measure_snapshot(&s, &assay).unwrap(),
                b.measure_snapshot(&s, &assay).unwrap()
            );
        }
        assert_eq!(a.readings(), 20);
    }

    #[test]
    fn different_seeds_diverge() {
        let s = snapshot(4.0);
        let assay = CellCountAssay::new();
        let x = AssayRunner::new(1).measure_snapshot(&s, &assay).unwrap();
        let y = AssayRunner::new(2).measure_snapshot(&s, &assay).unwrap();
        assert_ne!(x.value(), y.value());
    }

    #[test]
    fn reseed_restarts_stream() {
        let s = snapshot(0.0);
        let assay = CellCountAssay::new();
        let mut r = AssayRunner::new(9);
        let first = r.measure_snapshot(&s, &assay).unwrap();
        r.measure_snapshot(&s, &assay).unwrap();
        r.reseed(9);
        assert_eq!(r.readings(), 0);
        assert_eq!(r.measure_snapshot(&s, &assay).unwrap(), first);
    }

    #[test]
    fn exact_noise_returns_truth() {
        let s = snapshot(2.0);
        let mut r = AssayRunner::new(0);
        let rec = r
            .measure_snapshot(&s, &CellCountAssay::new().with_noise(NoiseModel::EXACT))
            .unwrap();
        assert_eq!(rec.value(), 1.0e6);
        assert_eq!(rec.unit(), "cells");
        assert_eq!(rec.assay(), "cell_count");
        assert_eq!(rec.vessel(), VesselId(3));
        assert_eq!(rec.observation_time(), 2.0);
        assert_eq!(rec.treatment_start_time(), None);
    }

    #[test]
    fn noisy_viability_stays_in_unit_interval() {
        let s = snapshot(1.0);
        let assay = ViabilityAssay::new().with_noise(NoiseModel { cv: 0.5, floor: 0.5 });
        let mut r = AssayRunner::new(5);
        for _ in 0..200 {
            let v = r.measure_snapshot(&s, &assay).unwrap().value();
            assert!((0.0..=1.0).contains(&v), "{v}");
        }
    }

    #[test]
    fn noise_mean_is_close_to_truth() {
        let s = snapshot(1.0);
        let assay = CellCountAssay::new().with_noise(NoiseModel { cv: 0.05, floor: 0.0 });
        let mut r = AssayRunner::new(11);
        let n = 2000;
        let mean: f64 = (0..n)
            .map(|_| r.measure_snapshot(&s, &assay).unwrap().value())
            .sum::<f64>()
            / n as f64;
        // Standard error is 0.05·1e6/√2000 ≈ 1.1e3.
        assert!((mean - 1.0e6).abs() < 1.0e4, "{mean}");
    }

    #[test]
    fn invalid_noise_rejected() {
        let s = snapshot(0.0);
        let assay = CellCountAssay::new().with_noise(NoiseModel {
            cv: -0.1,
            floor: 0.0,
        });
        let err = AssayRunner::new(0).measure_snapshot(&s, &assay).unwrap_err();
        assert!(matches!(err, AssayError::InvalidNoise { name: "cv", .. }));
    }

    #[test]
    fn record_carries_earliest_treatment_start() {
        let mut v = seeded_vessel(VesselId(0), 1.0e6);
        v.add_compound(CompoundId::from("a"), 1.0, 6.0);
        v.add_compound(CompoundId::from("b"), 1.0, 3.0);
        let s = VesselSnapshot::capture(&v, 8.0);
        let rec = AssayRunner::new(0)
            .measure_snapshot(&s, &ViabilityAssay::new())
            .unwrap();
        assert_eq!(rec.treatment_start_time(), Some(3.0));
        assert_eq!(rec.time_since_treatment(), Some(5.0));
    }
}
