//! Integration test: bounded step-size sensitivity of resource depletion.
//!
//! A growing HepG2 population is advanced over 48 h in `k` equal steps.
//! Glucose consumption is compared against a fine-step reference. The
//! trapezoid scheme's error must shrink as `k` grows and stay within a
//! documented bound; boundary (left-endpoint) sampling is shown to be
//! markedly worse at coarse steps.

use vitro_core::{CellLineId, VesselId};
use vitro_engine::{IntegrationScheme, LabSession, SessionConfig};
use vitro_mechanisms::BaselineHazard;
use vitro_test_utils::{standard_params, HEPG2};

const HORIZON_H: f64 = 48.0;
const REFERENCE_STEPS: u32 = 256;

/// Final glucose and viable count after `steps` equal advances.
fn run(steps: u32, scheme: IntegrationScheme) -> (f64, f64) {
    // Large substep so each advance is a single integration step.
    let config = SessionConfig::new(standard_params(), vec![Box::new(BaselineHazard)])
        .with_max_substep(1000.0)
        .with_integration(scheme);
    let mut lab = LabSession::new(config).unwrap();
    lab.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0)
        .unwrap();
    lab.advance_time(0.0).unwrap();
    let dt = HORIZON_H / f64::from(steps);
    for _ in 0..steps {
        lab.advance_time(dt).unwrap();
    }
    let snap = lab.read(VesselId(0)).unwrap();
    (snap.nutrients.glucose_mm, snap.viable_cells)
}

/// Glucose error relative to the reference amount consumed.
fn consumption_error(steps: u32, scheme: IntegrationScheme, reference: f64) -> f64 {
    let initial = standard_params().default_medium.glucose_mm;
    let (glucose, _) = run(steps, scheme);
    (glucose - reference).abs() / (initial - reference)
}

#[test]
fn trapezoid_error_shrinks_with_step_count() {
    let (reference, _) = run(REFERENCE_STEPS, IntegrationScheme::Trapezoid);
    let errors: Vec<f64> = [1, 2, 4, 8, 16]
        .iter()
        .map(|&k| consumption_error(k, IntegrationScheme::Trapezoid, reference))
        .collect();

    for pair in errors.windows(2) {
        assert!(pair[1] < pair[0], "error did not shrink: {errors:?}");
    }
    // Documented bound: a single 48 h step is within 25% of the
    // reference consumption, sixteen 3 h steps within 1%.
    assert!(errors[0] < 0.25, "k=1 error {}", errors[0]);
    assert!(errors[4] < 0.01, "k=16 error {}", errors[4]);
}

#[test]
fn one_long_step_close_to_two_half_steps() {
    let (one, _) = run(1, IntegrationScheme::Trapezoid);
    let (two, _) = run(2, IntegrationScheme::Trapezoid);
    let (reference, _) = run(REFERENCE_STEPS, IntegrationScheme::Trapezoid);
    let consumed = standard_params().default_medium.glucose_mm - reference;
    assert!((one - two).abs() / consumed < 0.2);
}

#[test]
fn boundary_sampling_is_worse_at_coarse_steps() {
    let (reference, _) = run(REFERENCE_STEPS, IntegrationScheme::Trapezoid);
    for k in [1, 2, 4] {
        let trap = consumption_error(k, IntegrationScheme::Trapezoid, reference);
        let left = consumption_error(k, IntegrationScheme::LeftEndpoint, reference);
        assert!(left > 2.0 * trap, "k={k}: left {left} vs trapezoid {trap}");
    }
}

#[test]
fn flush_only_advances_consume_nothing() {
    let config = SessionConfig::new(standard_params(), vec![Box::new(BaselineHazard)]);
    let mut lab = LabSession::new(config).unwrap();
    lab.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0)
        .unwrap();
    lab.advance_time(0.0).unwrap();
    let before = lab.read(VesselId(0)).unwrap();
    for _ in 0..10 {
        lab.advance_time(0.0).unwrap();
    }
    let after = lab.read(VesselId(0)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn substep_split_matches_explicit_steps() {
    // advance(6) with a 1 h substep equals six advance(1) calls.
    let seeded = || {
        let config = SessionConfig::new(standard_params(), vec![Box::new(BaselineHazard)]);
        let mut lab = LabSession::new(config).unwrap();
        lab.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0)
            .unwrap();
        lab
    };
    let mut a = seeded();
    a.advance_time(6.0).unwrap();
    let mut b = seeded();
    for _ in 0..6 {
        b.advance_time(1.0).unwrap();
    }
    assert_eq!(a.state_hash(), b.state_hash());
}
