//! Manual envelope ingestion.

use anyhow::{Context, Result};
use mctl_core::envelope::EnvelopePayload;
use mctl_core::ledger::{InsertOutcome, MissionLedger};
use serde_json::{Map, Value, json};

/// Validates and inserts one envelope, printing the outcome as JSON.
pub fn run(
    ledger: &MissionLedger,
    mission_id: String,
    event_type: String,
    status: String,
    proof_ref: Option<String>,
    meta: Option<String>,
) -> Result<()> {
    let mut payload = EnvelopePayload::new(mission_id, event_type, status);
    if let Some(proof_ref) = proof_ref {
        payload = payload.with_proof_ref(proof_ref);
    }
    if let Some(meta) = meta {
        let meta: Map<String, Value> =
            serde_json::from_str(&meta).context("--meta must be a JSON object")?;
        payload = payload.with_meta(meta);
    }

    let envelope = payload.validate().context("invalid envelope")?;
    let outcome = ledger.insert(&envelope)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "inserted": outcome.inserted(),
            "outcome": outcome_label(&outcome),
        }))?
    );

    Ok(())
}

fn outcome_label(outcome: &InsertOutcome) -> &'static str {
    match outcome {
        InsertOutcome::Appended { .. } => "appended",
        InsertOutcome::Duplicate => "duplicate",
        InsertOutcome::Frozen => "frozen",
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn temp_ledger() -> (MissionLedger, TempDir) {
        let dir = TempDir::new().expect("failed to create temp dir");
        let ledger =
            MissionLedger::open(dir.path().join("missions.db")).expect("failed to open ledger");
        (ledger, dir)
    }

    #[test]
    fn ingest_inserts_and_replays_quietly() {
        let (ledger, _dir) = temp_ledger();

        for _ in 0..2 {
            run(
                &ledger,
                "VAL-1".to_string(),
                "PAYMENT_VERIFIED".to_string(),
                "verified".to_string(),
                None,
                Some(r#"{"source": "cli"}"#.to_string()),
            )
            .expect("ingest should succeed");
        }

        let counts = ledger.summary_counts().expect("failed to get counts");
        assert_eq!(counts.total, 1);
    }

    #[test]
    fn ingest_rejects_non_object_meta() {
        let (ledger, _dir) = temp_ledger();

        let result = run(
            &ledger,
            "VAL-1".to_string(),
            "PAYMENT_VERIFIED".to_string(),
            "verified".to_string(),
            None,
            Some("[1, 2]".to_string()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn outcome_labels_are_stable() {
        assert_eq!(
            outcome_label(&InsertOutcome::Appended { seq_id: 1, ts: 1 }),
            "appended"
        );
        assert_eq!(outcome_label(&InsertOutcome::Duplicate), "duplicate");
        assert_eq!(outcome_label(&InsertOutcome::Frozen), "frozen");
    }
}
