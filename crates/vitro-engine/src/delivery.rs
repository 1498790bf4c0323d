//! Instantaneous effects of delivered operations.
//!
//! Delivery runs before any continuous dynamics for the interval and
//! always with the vessel's hazard phase `Idle`; the treatment instant
//! kill goes through [`VesselState::apply_instant_kill`], which refuses
//! to run inside a propose/commit cycle.

use std::collections::BTreeMap;

use vitro_core::{
    require_cell_line, require_compound, DeathCause, DeliveryRecord, KernelError, Nutrients,
    OperationPayload, ParameterProvider, PendingOperation, VesselId, VesselState,
};

/// Apply `op` at time `at`.
///
/// Seed creates the vessel; every other kind requires it to exist.
pub fn deliver(
    vessels: &mut BTreeMap<VesselId, VesselState>,
    op: &PendingOperation,
    params: &dyn ParameterProvider,
    at: f64,
) -> Result<DeliveryRecord, KernelError> {
    let id = op.target_vessel();
    let mut cells_killed = 0.0;

    match op.payload() {
        OperationPayload::Seed {
            cell_line,
            cell_count,
            viability,
        } => {
            if vessels.contains_key(&id) {
                return Err(KernelError::AlreadySeeded { vessel: id });
            }
            require_cell_line(params, cell_line)?;
            let vessel = VesselState::seed(
                id,
                cell_line.clone(),
                *cell_count,
                *viability,
                params.default_medium(),
                at,
            )?;
            vessels.insert(id, vessel);
        }
        OperationPayload::Treat { compound, dose_um } => {
            let vessel = seeded(vessels, id)?;
            let cp = require_compound(params, compound)?;
            vessel.add_compound(compound.clone(), *dose_um, at);
            let fraction = cp.instant_kill_max * cp.response(*dose_um);
            if fraction > 0.0 {
                cells_killed =
                    vessel.apply_instant_kill(DeathCause::Compound(compound.clone()), fraction)?;
            }
        }
        OperationPayload::Feed {
            glucose_mm,
            glutamine_mm,
        } => {
            seeded(vessels, id)?.replace_nutrients(Nutrients {
                glucose_mm: *glucose_mm,
                glutamine_mm: *glutamine_mm,
            })?;
        }
        OperationPayload::Washout { compound } => {
            seeded(vessels, id)?.remove_compounds(compound.as_ref());
        }
    }

    tracing::debug!(
        vessel = %id,
        kind = %op.kind(),
        seq = op.sequence_id().0,
        at,
        cells_killed,
        "operation delivered"
    );

    Ok(DeliveryRecord {
        vessel: id,
        kind: op.kind(),
        sequence_id: op.sequence_id(),
        scheduled_time: op.scheduled_time(),
        delivered_at: at,
        cells_killed,
    })
}

fn seeded(
    vessels: &mut BTreeMap<VesselId, VesselState>,
    id: VesselId,
) -> Result<&mut VesselState, KernelError> {
    vessels
        .get_mut(&id)
        .ok_or(KernelError::VesselNotSeeded { vessel: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitro_core::{
        CellLineId, CompoundId, OperationKind, OperationRequest, SequenceId,
    };
    use vitro_test_utils::{standard_params, HEPG2, STAUROSPORINE, TUNICAMYCIN};

    fn op(vessel: u32, seq: u64, payload: OperationPayload) -> PendingOperation {
        PendingOperation::new(
            OperationRequest {
                target_vessel: VesselId(vessel),
                scheduled_time: 0.0,
                payload,
            },
            SequenceId(seq),
        )
    }

    fn seed_payload() -> OperationPayload {
        OperationPayload::Seed {
            cell_line: CellLineId::from(HEPG2),
            cell_count: 1.0e6,
            viability: 1.0,
        }
    }

    #[test]
    fn seed_creates_vessel_in_default_medium() {
        let params = standard_params();
        let mut vessels = BTreeMap::new();
        let rec = deliver(&mut vessels, &op(1, 0, seed_payload()), &params, 2.0).unwrap();
        assert_eq!(rec.kind, OperationKind::Seed);
        let v = &vessels[&VesselId(1)];
        assert_eq!(v.seeded_at(), 2.0);
        assert_eq!(v.nutrients(), params.default_medium());
    }

    #[test]
    fn seeding_twice_fails() {
        let params = standard_params();
        let mut vessels = BTreeMap::new();
        deliver(&mut vessels, &op(1, 0, seed_payload()), &params, 0.0).unwrap();
        let err = deliver(&mut vessels, &op(1, 1, seed_payload()), &params, 0.0).unwrap_err();
        assert_eq!(err, KernelError::AlreadySeeded { vessel: VesselId(1) });
    }

    #[test]
    fn unknown_cell_line_fails() {
        let params = standard_params();
        let mut vessels = BTreeMap::new();
        let payload = OperationPayload::Seed {
            cell_line: CellLineId::from("HeLa"),
            cell_count: 1.0,
            viability: 1.0,
        };
        let err = deliver(&mut vessels, &op(1, 0, payload), &params, 0.0).unwrap_err();
        assert_eq!(err.contract(), "parameters");
        assert!(vessels.is_empty());
    }

    #[test]
    fn treating_unseeded_vessel_fails() {
        let params = standard_params();
        let mut vessels = BTreeMap::new();
        let payload = OperationPayload::Treat {
            compound: CompoundId::from(TUNICAMYCIN),
            dose_um: 1.0,
        };
        let err = deliver(&mut vessels, &op(9, 0, payload), &params, 0.0).unwrap_err();
        assert_eq!(err, KernelError::VesselNotSeeded { vessel: VesselId(9) });
    }

    #[test]
    fn cytotoxic_treatment_kills_instantly() {
        let params = standard_params();
        let mut vessels = BTreeMap::new();
        deliver(&mut vessels, &op(1, 0, seed_payload()), &params, 0.0).unwrap();
        let payload = OperationPayload::Treat {
            compound: CompoundId::from(STAUROSPORINE),
            dose_um: 0.1,
        };
        let rec = deliver(&mut vessels, &op(1, 1, payload), &params, 0.0).unwrap();
        let sts = &params.compounds[&CompoundId::from(STAUROSPORINE)];
        let expected = 1.0e6 * sts.instant_kill_max * 0.5;
        assert!((rec.cells_killed - expected).abs() < 1e-6);
        let v = &vessels[&VesselId(1)];
        let cause = DeathCause::Compound(CompoundId::from(STAUROSPORINE));
        assert!((v.ledger().count(&cause) - expected).abs() < 1e-6);
        assert_eq!(v.concentration(&CompoundId::from(STAUROSPORINE)), 0.1);
    }

    #[test]
    fn feed_and_washout_replace_and_remove() {
        let params = standard_params();
        let mut vessels = BTreeMap::new();
        deliver(&mut vessels, &op(1, 0, seed_payload()), &params, 0.0).unwrap();
        let treat = OperationPayload::Treat {
            compound: CompoundId::from(TUNICAMYCIN),
            dose_um: 2.0,
        };
        deliver(&mut vessels, &op(1, 1, treat), &params, 0.0).unwrap();
        let feed = OperationPayload::Feed {
            glucose_mm: 10.0,
            glutamine_mm: 1.0,
        };
        deliver(&mut vessels, &op(1, 2, feed), &params, 0.0).unwrap();
        deliver(
            &mut vessels,
            &op(1, 3, OperationPayload::Washout { compound: None }),
            &params,
            0.0,
        )
        .unwrap();
        let v = &vessels[&VesselId(1)];
        assert_eq!(v.nutrients().glucose_mm, 10.0);
        assert!(v.compounds().is_empty());
    }
}
