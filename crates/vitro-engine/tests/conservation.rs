//! Integration test: death-ledger conservation under arbitrary schedules.
//!
//! Drives sessions with random treatments, feeds, and advance lengths
//! through the reference mechanisms plus aggressive constant hazards,
//! and checks after every tick that dead fractions never exceed one,
//! that every cell is accounted for, and that no commit revisits an
//! interval a previous commit already covered.

use std::collections::BTreeMap;

use proptest::prelude::*;
use vitro_core::{
    CellLineId, CompoundId, DeathCause, StressAxis, VesselId, CONSERVATION_TOLERANCE,
};
use vitro_engine::{LabSession, SessionConfig};
use vitro_mechanism::Mechanism;
use vitro_mechanisms::reference_mechanisms;
use vitro_test_utils::{
    standard_params, ConstHazard, HEPG2, MENADIONE, STAUROSPORINE, TUNICAMYCIN,
};

const COMPOUNDS: [&str; 3] = [TUNICAMYCIN, STAUROSPORINE, MENADIONE];

fn lab(extra_rate: f64) -> LabSession {
    let mut mechanisms: Vec<Box<dyn Mechanism>> = reference_mechanisms();
    mechanisms.push(Box::new(ConstHazard::new(
        "extra",
        DeathCause::Stress(StressAxis::DnaDamage),
        extra_rate,
    )));
    LabSession::new(SessionConfig::new(standard_params(), mechanisms)).unwrap()
}

#[derive(Clone, Debug)]
struct Step {
    vessel: u32,
    compound: usize,
    dose: f64,
    feed: Option<f64>,
    dt: f64,
}

fn step() -> impl Strategy<Value = Step> {
    (
        0u32..3,
        0usize..3,
        0.0f64..50.0,
        prop::option::of(0.0f64..25.0),
        prop_oneof![Just(0.0), 0.01f64..30.0],
    )
        .prop_map(|(vessel, compound, dose, feed, dt)| Step {
            vessel,
            compound,
            dose,
            feed,
            dt,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ledger_never_exceeds_population(
        extra_rate in 0.0f64..20.0,
        viability in 0.5f64..=1.0,
        steps in prop::collection::vec(step(), 1..16),
    ) {
        let mut l = lab(extra_rate);
        for v in 0..3 {
            l.submit_seed(VesselId(v), 0.0, CellLineId::from(HEPG2), 1.0e6, viability)
                .unwrap();
        }
        let mut last_t1: BTreeMap<VesselId, f64> = BTreeMap::new();

        for s in &steps {
            let now = l.now();
            let compound = CompoundId::from(COMPOUNDS[s.compound]);
            l.submit_treat(VesselId(s.vessel), now, compound, s.dose).unwrap();
            if let Some(g) = s.feed {
                l.submit_feed(VesselId(s.vessel), now, g, 2.0).unwrap();
            }
            let result = l.advance_time(s.dt).unwrap();

            for c in &result.commits {
                if let Some(prev) = last_t1.get(&c.vessel) {
                    prop_assert!(
                        c.interval.t0() >= *prev,
                        "commit {} overlaps {}",
                        c.interval,
                        prev
                    );
                }
                last_t1.insert(c.vessel, c.interval.t1());
                prop_assert!(c.cells_killed >= 0.0);
                let attributed: f64 = c.by_cause.iter().map(|(_, n)| n).sum();
                prop_assert!((attributed - c.cells_killed).abs() <= 1e-6 * c.cells_killed.max(1.0));
            }

            for id in l.vessel_ids().collect::<Vec<_>>() {
                let snap = l.read(id).unwrap();
                let total: f64 = snap.death_fractions.values().sum();
                prop_assert!(total <= 1.0 + CONSERVATION_TOLERANCE, "dead fraction {}", total);
                prop_assert!(snap.viable_cells >= 0.0);
                prop_assert!((0.0..=1.0).contains(&snap.viability));
                let vessel = l.vessel(id).unwrap();
                prop_assert!(vessel.ledger().check(id, vessel.viable_cells()).is_ok());
                prop_assert!(!vessel.is_poisoned());
            }
        }
    }
}

#[test]
fn seeding_loss_is_recorded_once() {
    let mut l = lab(0.0);
    l.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 0.8)
        .unwrap();
    l.advance_time(0.0).unwrap();
    let v = l.vessel(VesselId(0)).unwrap();
    assert!((v.ledger().count(&DeathCause::Seeding) - 2.0e5).abs() < 1e-6);
    l.advance_time(10.0).unwrap();
    let v = l.vessel(VesselId(0)).unwrap();
    assert!((v.ledger().count(&DeathCause::Seeding) - 2.0e5).abs() < 1e-6);
}

#[test]
fn overwhelming_hazard_kills_at_most_everyone() {
    let mut l = lab(1.0e6);
    l.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0)
        .unwrap();
    l.advance_time(5.0).unwrap();
    let snap = l.read(VesselId(0)).unwrap();
    assert!(snap.viable_cells >= 0.0);
    assert!(snap.viable_cells < 1.0);
    let total: f64 = snap.death_fractions.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn repeated_instant_kills_compose_multiplicatively() {
    let params = standard_params();
    let sts = &params.compounds[&CompoundId::from(STAUROSPORINE)];
    let f = sts.instant_kill_max * sts.response(0.1);

    let mut l = lab(0.0);
    l.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0)
        .unwrap();
    l.submit_treat(VesselId(0), 0.0, CompoundId::from(STAUROSPORINE), 0.1)
        .unwrap();
    l.submit_treat(VesselId(0), 0.0, CompoundId::from(STAUROSPORINE), 0.1)
        .unwrap();
    let r = l.advance_time(0.0).unwrap();
    let killed: Vec<f64> = r.deliveries.iter().skip(1).map(|d| d.cells_killed).collect();
    assert!((killed[0] - 1.0e6 * f).abs() < 1e-6);
    assert!((killed[1] - 1.0e6 * (1.0 - f) * f).abs() < 1e-6);
}

#[test]
fn competing_hazards_decay_through_subnormals() {
    let mechanisms: Vec<Box<dyn Mechanism>> = vec![
        Box::new(ConstHazard::baseline("bg", 23.1)),
        Box::new(ConstHazard::new(
            "dna",
            DeathCause::Stress(StressAxis::DnaDamage),
            9.1,
        )),
    ];
    let mut l = LabSession::new(SessionConfig::new(standard_params(), mechanisms)).unwrap();
    l.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0)
        .unwrap();
    l.advance_time(200.0).unwrap();
    assert!(!l.is_halted());
    assert_eq!(l.now(), 200.0);

    let v = l.vessel(VesselId(0)).unwrap();
    v.ledger().check(VesselId(0), v.viable_cells()).unwrap();
    let total: f64 = l.read(VesselId(0)).unwrap().death_fractions.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
}
