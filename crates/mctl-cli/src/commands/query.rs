//! Read-model query commands.

use anyhow::{Result, bail};
use mctl_core::ledger::MissionLedger;
use mctl_core::runbook::{self, RunbookLookup};
use serde_json::json;

/// Prints summary counts as JSON.
pub fn summary(ledger: &MissionLedger) -> Result<()> {
    let counts = ledger.summary_counts()?;
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

/// Prints the latest row per mission as JSON.
pub fn latest(ledger: &MissionLedger, limit: u64) -> Result<()> {
    let rows = ledger.latest_per_mission(limit)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Prints tier-annotated latest rows as JSON.
pub fn matrix(ledger: &MissionLedger, limit: u64) -> Result<()> {
    let rows = ledger.proof_matrix(limit)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Prints score-annotated latest rows as JSON.
pub fn score(ledger: &MissionLedger, limit: u64) -> Result<()> {
    let rows = ledger.settlement_score(limit)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Prints the runbook for a reason code, or the known codes on a miss.
pub fn runbook(reason_code: &str) -> Result<()> {
    match runbook::lookup(reason_code) {
        RunbookLookup::Found(runbook) => {
            println!("{}", serde_json::to_string_pretty(runbook)?);
            Ok(())
        },
        RunbookLookup::Unknown { known_codes } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "error": format!("unknown reason code: {reason_code}"),
                    "known_codes": known_codes,
                }))?
            );
            bail!("unknown reason code: {reason_code}");
        },
    }
}
