//! Integration test: operation scheduling through a full session.
//!
//! Covers order invariance across submission interleavings, the
//! no-eager-mutation guarantee, past-scheduling rejection, and the
//! Feed-before-Treat scenario with reversed submission order.

use proptest::prelude::*;
use vitro_core::{
    CausalityError, CellLineId, CompoundId, OperationKind, OperationPayload, OperationRequest,
    SubmitError, VesselId,
};
use vitro_engine::{LabSession, SessionConfig};
use vitro_mechanisms::reference_mechanisms;
use vitro_test_utils::{standard_params, HEPG2, MENADIONE, STAUROSPORINE, TUNICAMYCIN};

fn lab() -> LabSession {
    LabSession::new(SessionConfig::new(standard_params(), reference_mechanisms())).unwrap()
}

fn seeded_lab(vessels: &[u32]) -> LabSession {
    let mut l = lab();
    for &v in vessels {
        l.submit_seed(VesselId(v), 0.0, CellLineId::from(HEPG2), 1.0e6, 0.98)
            .unwrap();
    }
    l.advance_time(1.0).unwrap();
    l
}

// ── Example scenario ───────────────────────────────────────────────

fn scenario(treat_first: bool) -> LabSession {
    let mut l = lab();
    l.submit_seed(VesselId(0), 0.0, CellLineId::from(HEPG2), 1.0e6, 1.0)
        .unwrap();
    if treat_first {
        l.submit_treat(VesselId(0), 0.0, CompoundId::from(STAUROSPORINE), 0.05)
            .unwrap();
        l.submit_feed(VesselId(0), 0.0, 20.0, 3.0).unwrap();
    } else {
        l.submit_feed(VesselId(0), 0.0, 20.0, 3.0).unwrap();
        l.submit_treat(VesselId(0), 0.0, CompoundId::from(STAUROSPORINE), 0.05)
            .unwrap();
    }
    l
}

#[test]
fn feed_delivered_before_treat_regardless_of_submission_order() {
    let mut a = scenario(true);
    let mut b = scenario(false);
    let ra = a.advance_time(12.0).unwrap();
    let rb = b.advance_time(12.0).unwrap();

    let kinds = |r: &vitro_engine::TickResult| -> Vec<OperationKind> {
        r.deliveries.iter().map(|d| d.kind).collect()
    };
    let expected = [OperationKind::Seed, OperationKind::Feed, OperationKind::Treat];
    assert_eq!(kinds(&ra), expected);
    assert_eq!(kinds(&rb), expected);
    assert!(!kinds(&ra).contains(&OperationKind::Washout));

    let sa = a.read(VesselId(0)).unwrap();
    let sb = b.read(VesselId(0)).unwrap();
    assert_eq!(sa.compounds, sb.compounds);
    assert_eq!(sa.nutrients, sb.nutrients);
    assert_eq!(a.state_hash(), b.state_hash());
}

// ── No eager mutation ──────────────────────────────────────────────

#[test]
fn submission_leaves_biology_untouched_until_delivery() {
    let mut l = seeded_lab(&[0]);
    let before = l.read(VesselId(0)).unwrap();

    l.submit_treat(VesselId(0), 2.0, CompoundId::from(TUNICAMYCIN), 4.0)
        .unwrap();
    l.submit_washout(VesselId(0), 1.0, None).unwrap();
    l.submit_feed(VesselId(0), 1.5, 5.0, 1.0).unwrap();
    assert_eq!(l.read(VesselId(0)).unwrap(), before);

    // Advancing to just before the treat delivers only the earlier ops.
    l.advance_time(1.0).unwrap();
    let mid = l.read(VesselId(0)).unwrap();
    assert!(mid.compounds.is_empty());
    l.advance_time(0.0).unwrap();
    assert_eq!(
        l.read(VesselId(0)).unwrap().compounds[&CompoundId::from(TUNICAMYCIN)].concentration_um,
        4.0
    );
}

// ── Causality at submission ────────────────────────────────────────

#[test]
fn scheduling_into_the_past_is_rejected() {
    let mut l = seeded_lab(&[0]);
    let err = l
        .submit_treat(VesselId(0), 0.5, CompoundId::from(TUNICAMYCIN), 1.0)
        .unwrap_err();
    assert_eq!(
        err,
        SubmitError::Causality(CausalityError::ScheduledInPast {
            scheduled_time: 0.5,
            now: 1.0
        })
    );
    // Exactly now is allowed.
    assert!(l
        .submit_treat(VesselId(0), 1.0, CompoundId::from(TUNICAMYCIN), 1.0)
        .is_ok());
}

#[test]
fn operation_takes_effect_at_exact_scheduled_time() {
    let mut l = seeded_lab(&[0]);
    l.submit_treat(VesselId(0), 3.7, CompoundId::from(TUNICAMYCIN), 2.0)
        .unwrap();
    let r = l.advance_time(5.0).unwrap();
    assert_eq!(r.deliveries.len(), 1);
    assert_eq!(r.deliveries[0].delivered_at, 3.7);
    let snap = l.read(VesselId(0)).unwrap();
    assert_eq!(snap.treatment_start_time(), Some(3.7));
}

// ── Order invariance ───────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Action {
    Treat(usize, f64),
    Feed(f64, f64),
    Washout(Option<usize>),
}

const COMPOUNDS: [&str; 3] = [TUNICAMYCIN, STAUROSPORINE, MENADIONE];

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..3, 0.0f64..5.0).prop_map(|(c, d)| Action::Treat(c, d)),
        (0.0f64..30.0, 0.0f64..5.0).prop_map(|(g, q)| Action::Feed(g, q)),
        prop::option::of(0usize..3).prop_map(Action::Washout),
    ]
}

fn request(vessel: u32, time: f64, action: &Action) -> OperationRequest {
    let payload = match action {
        Action::Treat(c, dose) => OperationPayload::Treat {
            compound: CompoundId::from(COMPOUNDS[*c]),
            dose_um: *dose,
        },
        Action::Feed(g, q) => OperationPayload::Feed {
            glucose_mm: *g,
            glutamine_mm: *q,
        },
        Action::Washout(c) => OperationPayload::Washout {
            compound: c.map(|i| CompoundId::from(COMPOUNDS[i])),
        },
    };
    OperationRequest {
        target_vessel: VesselId(vessel),
        scheduled_time: time,
        payload,
    }
}

fn run(ops: &[(u32, Action)]) -> (u64, Vec<(VesselId, OperationKind)>) {
    let mut l = seeded_lab(&[0, 1, 2]);
    for (v, a) in ops {
        l.submit(request(*v, 2.0, a)).unwrap();
    }
    let r = l.advance_time(6.0).unwrap();
    let order = r.deliveries.iter().map(|d| (d.vessel, d.kind)).collect();
    (l.state_hash(), order)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Interleaving submissions to different vessels never changes the
    /// outcome: only the per-vessel (priority, sequence) order matters.
    #[test]
    fn interleaving_unrelated_submissions_is_invisible(
        ops in prop::collection::vec((0u32..3, action()), 1..12),
    ) {
        let mut grouped = ops.clone();
        grouped.sort_by_key(|(v, _)| *v);
        let (h1, o1) = run(&ops);
        let (h2, o2) = run(&grouped);
        prop_assert_eq!(h1, h2);
        prop_assert_eq!(o1, o2);
    }

    /// Operations of different kinds on one vessel resolve by priority,
    /// whatever order they were submitted in.
    #[test]
    fn distinct_kinds_resolve_by_priority(
        treat in (0usize..3, 0.0f64..5.0),
        feed in (0.0f64..30.0, 0.0f64..5.0),
        washout in prop::option::of(0usize..3),
        perm in Just(vec![0usize, 1, 2]).prop_shuffle(),
    ) {
        let actions = [
            Action::Treat(treat.0, treat.1),
            Action::Feed(feed.0, feed.1),
            Action::Washout(washout),
        ];
        let canonical: Vec<(u32, Action)> =
            actions.iter().cloned().map(|a| (0, a)).collect();
        let permuted: Vec<(u32, Action)> =
            perm.iter().map(|&i| (0, actions[i].clone())).collect();
        let (h1, o1) = run(&canonical);
        let (h2, o2) = run(&permuted);
        prop_assert_eq!(h1, h2);
        let kinds: Vec<OperationKind> = o2.iter().map(|(_, k)| *k).collect();
        prop_assert_eq!(
            kinds,
            vec![OperationKind::Washout, OperationKind::Feed, OperationKind::Treat]
        );
        prop_assert_eq!(o1, o2);
    }
}
