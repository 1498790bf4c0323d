//! Benchmark profiles for the Vitro simulation kernel.
//!
//! - [`reference_profile`]: a 96-well plate under the full reference
//!   mechanism registry
//! - [`stress_profile`]: the same protocol on a 384-well plate
//! - [`plate_protocol`]: deterministic seed/feed/treat/washout schedule

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use vitro_core::{
    CellLineId, CompoundId, OperationPayload, OperationRequest, SubmitError, VesselId,
};
use vitro_engine::{ConfigError, LabSession, SessionConfig};
use vitro_mechanisms::reference_mechanisms;
use vitro_test_utils::{standard_params, HEPG2, MENADIONE, STAUROSPORINE, TUNICAMYCIN};

const COMPOUNDS: [&str; 3] = [TUNICAMYCIN, STAUROSPORINE, MENADIONE];
const DOSE_LADDER_UM: [f64; 8] = [0.0, 0.01, 0.03, 0.1, 0.3, 1.0, 3.0, 10.0];

/// Session config used by every profile: reference mechanisms, 0.5 h substeps.
pub fn bench_config() -> SessionConfig {
    SessionConfig::new(standard_params(), reference_mechanisms())
        .with_max_substep(0.5)
        .with_max_pending_operations(16 * 1024)
}

/// Seed every well at t=0, refresh medium and dose at t=24, wash out
/// every third well at t=48.
///
/// Compound choice per well is a deterministic hash of `seed`.
pub fn plate_protocol(wells: u32, seed: u64) -> Vec<OperationRequest> {
    let mut ops = Vec::with_capacity(wells as usize * 4);
    for w in 0..wells {
        let vessel = VesselId(w);
        let h = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(u64::from(w).wrapping_mul(1442695040888963407));
        let compound = COMPOUNDS[(h >> 33) as usize % COMPOUNDS.len()];
        let dose_um = DOSE_LADDER_UM[w as usize % DOSE_LADDER_UM.len()];

        ops.push(OperationRequest {
            target_vessel: vessel,
            scheduled_time: 0.0,
            payload: OperationPayload::Seed {
                cell_line: CellLineId::from(HEPG2),
                cell_count: 2.0e5,
                viability: 0.97,
            },
        });
        ops.push(OperationRequest {
            target_vessel: vessel,
            scheduled_time: 24.0,
            payload: OperationPayload::Treat {
                compound: CompoundId::from(compound),
                dose_um,
            },
        });
        ops.push(OperationRequest {
            target_vessel: vessel,
            scheduled_time: 24.0,
            payload: OperationPayload::Feed {
                glucose_mm: 25.0,
                glutamine_mm: 4.0,
            },
        });
        if w % 3 == 0 {
            ops.push(OperationRequest {
                target_vessel: vessel,
                scheduled_time: 48.0,
                payload: OperationPayload::Washout { compound: None },
            });
        }
    }
    ops
}

/// Build a session and submit `ops` in order.
pub fn build_session(
    config: SessionConfig,
    ops: Vec<OperationRequest>,
) -> Result<LabSession, ProfileError> {
    let mut lab = LabSession::new(config)?;
    for op in ops {
        lab.submit(op)?;
    }
    Ok(lab)
}

/// 96-well plate.
pub fn reference_profile(seed: u64) -> Result<LabSession, ProfileError> {
    build_session(bench_config(), plate_protocol(96, seed))
}

/// 384-well plate.
pub fn stress_profile(seed: u64) -> Result<LabSession, ProfileError> {
    build_session(bench_config(), plate_protocol(384, seed))
}

/// Failure building a profile session.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The configuration was rejected.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// An operation was rejected.
    #[error("submit: {0}")]
    Submit(#[from] SubmitError),
}
