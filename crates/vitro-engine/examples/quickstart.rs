//! Vitro Quickstart: a dose-response experiment from scratch.
//!
//! Demonstrates:
//!   1. Loading a parameter table and the reference mechanisms
//!   2. Seeding a row of vessels
//!   3. Scheduling a feed and a dose ladder at the same instant
//!   4. Advancing time and reading snapshots
//!   5. Inspecting the per-cause death ledger
//!
//! Run with:
//!   RUST_LOG=vitro_engine=debug cargo run --example quickstart

use tracing_subscriber::EnvFilter;
use vitro_core::{CellLineId, CompoundId, ParameterTable, VesselId};
use vitro_engine::{LabSession, SessionConfig};
use vitro_mechanisms::reference_mechanisms;
use vitro_test_utils::{HEPG2, STANDARD_PARAMS_JSON, STAUROSPORINE};

// ─── Plate layout ───────────────────────────────────────────────

const DOSES_UM: [f64; 5] = [0.0, 0.03, 0.1, 0.3, 1.0];
const SEED_CELLS: f64 = 2.0e5;
const DOSE_TIME_H: f64 = 24.0;
const HORIZON_H: f64 = 96.0;

// ─── Main ───────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Vitro Quickstart ===\n");

    // 1. Parameters and mechanisms.
    let params = ParameterTable::from_json_str(STANDARD_PARAMS_JSON)?;
    let config = SessionConfig::new(params, reference_mechanisms()).with_max_substep(0.5);
    let mut lab = LabSession::new(config)?;
    println!("Session created, substep {} h", lab.engine().substep_h());

    // 2. Seed one vessel per dose.
    for (i, _) in DOSES_UM.iter().enumerate() {
        lab.submit_seed(VesselId(i as u32), 0.0, CellLineId::from(HEPG2), SEED_CELLS, 0.97)?;
    }

    // 3. Refresh the medium and dose at the same instant. Feed always
    //    lands before Treat, whatever the submission order.
    for (i, dose) in DOSES_UM.iter().enumerate() {
        let v = VesselId(i as u32);
        if *dose > 0.0 {
            lab.submit_treat(v, DOSE_TIME_H, CompoundId::from(STAUROSPORINE), *dose)?;
        }
        lab.submit_feed(v, DOSE_TIME_H, 25.0, 4.0)?;
    }

    // 4. Step in 12 h chunks and print viability.
    println!("\n  time  {}", header());
    while lab.now() < HORIZON_H {
        let result = lab.advance_time(12.0)?;
        let mut row = format!("{:>5.0}h", lab.now());
        for v in lab.vessel_ids() {
            let snap = lab.read(v)?;
            row.push_str(&format!("  {:>8.3}", snap.viability));
        }
        println!(
            "{row}   ({} sub-intervals, {} deliveries, {}μs)",
            result.metrics.sub_intervals, result.metrics.deliveries, result.metrics.total_us
        );
    }

    // 5. Death ledger of the highest dose.
    let top = VesselId(DOSES_UM.len() as u32 - 1);
    let snap = lab.read(top)?;
    println!("\nDeath ledger for {top} ({} μM):", DOSES_UM[DOSES_UM.len() - 1]);
    for (cause, fraction) in &snap.death_fractions {
        println!("  {cause:<24} {fraction:.4}");
    }
    println!("  viable                   {:.4}", snap.viability);
    println!("\nState hash: {:#018x}", lab.state_hash());

    Ok(())
}

fn header() -> String {
    DOSES_UM
        .iter()
        .map(|d| format!("  {:>6}μM", d))
        .collect()
}
