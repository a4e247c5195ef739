//! HTTP request handlers.
//!
//! Implements handlers for the ingestion and query surface. Handlers are
//! thin collaborators around the ledger: validated input goes in, read
//! models come out.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use mctl_core::envelope::EnvelopePayload;
use mctl_core::ledger::{InsertOutcome, StoredEnvelope};
use mctl_core::runbook::{self, Runbook, RunbookLookup};
use mctl_core::scoring::{ScoredEnvelope, TieredEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::dashboard;
use crate::error::ApiError;
use crate::state::AppState;

/// Daemon version (from Cargo.toml).
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by health and stamped into run metadata.
const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

/// Default row limit for the read-model endpoints.
const DEFAULT_LIMIT: u64 = 50;

/// Builds the daemon router over shared state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/api/health", get(health))
        .route("/api/ingest", post(ingest))
        .route("/api/summary", get(summary))
        .route("/api/missions/latest", get(latest_per_mission))
        .route("/api/missions/run", post(run_mission))
        .route("/api/proofs/matrix", get(proof_matrix))
        .route("/api/proofs/score", get(settlement_score))
        .route("/api/runbooks/:reason_code", get(runbook_lookup))
        .with_state(state)
}

/// Row-limit query parameters.
#[derive(Debug, Deserialize)]
struct LimitParams {
    #[serde(default = "default_limit")]
    limit: u64,
}

const fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
    app: &'static str,
    version: &'static str,
    /// Server time, seconds since the Unix epoch.
    ts: u64,
    uptime_secs: u64,
    forwarder_configured: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        ok: true,
        app: SERVICE_NAME,
        version: VERSION,
        ts,
        uptime_secs: state.uptime_secs(),
        forwarder_configured: state.emitter.is_configured(),
    })
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    ok: bool,
    inserted: bool,
}

/// Accepts one envelope.
///
/// Suppressed duplicates and finality-frozen keys answer `inserted: false`
/// with a 200 status: suppression is an outcome, not a failure.
async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<IngestResponse>, ApiError> {
    let payload: EnvelopePayload =
        serde_json::from_value(body).map_err(|e| ApiError::Validation(e.to_string()))?;
    let envelope = payload.validate()?;

    let outcome = record_and_forward(&state, envelope).await?;

    Ok(Json(IngestResponse {
        ok: true,
        inserted: outcome.inserted(),
    }))
}

async fn summary(
    State(state): State<AppState>,
) -> Result<Json<mctl_core::ledger::SummaryCounts>, ApiError> {
    Ok(Json(state.ledger.summary_counts()?))
}

async fn latest_per_mission(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<StoredEnvelope>>, ApiError> {
    Ok(Json(state.ledger.latest_per_mission(params.limit)?))
}

async fn proof_matrix(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<TieredEnvelope>>, ApiError> {
    Ok(Json(state.ledger.proof_matrix(params.limit)?))
}

async fn settlement_score(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ScoredEnvelope>>, ApiError> {
    Ok(Json(state.ledger.settlement_score(params.limit)?))
}

async fn runbook_lookup(
    Path(reason_code): Path<String>,
) -> Result<Json<&'static Runbook>, ApiError> {
    match runbook::lookup(&reason_code) {
        RunbookLookup::Found(runbook) => Ok(Json(runbook)),
        RunbookLookup::Unknown { known_codes } => Err(ApiError::UnknownReasonCode {
            reason_code,
            known_codes,
        }),
    }
}

/// Mission-run trigger payload.
#[derive(Debug, Deserialize)]
struct RunPayload {
    mission_id: String,

    #[serde(default = "default_playbook")]
    playbook: String,

    #[serde(default = "default_mode")]
    mode: String,

    #[serde(default)]
    run_id: Option<String>,
}

fn default_playbook() -> String {
    "chimera".to_string()
}

fn default_mode() -> String {
    "LIVE".to_string()
}

#[derive(Debug, Serialize)]
struct RunResponse {
    ok: bool,
    mission_id: String,
}

/// Scheduler-triggerable mission run.
///
/// Records the mission start and its placeholder proof through the regular
/// insert path, so replays of the trigger are suppressed like any other
/// duplicate envelope.
async fn run_mission(
    State(state): State<AppState>,
    Json(payload): Json<RunPayload>,
) -> Result<Json<RunResponse>, ApiError> {
    let run_ref = format!(
        "run:{}",
        payload.run_id.as_deref().unwrap_or("manual")
    );

    let mut started_meta = Map::new();
    started_meta.insert("mission_name".into(), json!(SERVICE_NAME));
    started_meta.insert("playbook".into(), json!(payload.playbook));
    started_meta.insert("mode".into(), json!(payload.mode));

    let started = EnvelopePayload::new(&payload.mission_id, "MISSION_STARTED", "VERIFIED")
        .with_proof_ref(run_ref)
        .with_meta(started_meta)
        .validate()?;
    let mission_id = started.mission_id.clone();

    let mut proof_meta = Map::new();
    proof_meta.insert("note".into(), json!("placeholder proof minted"));

    let proof = EnvelopePayload::new(&payload.mission_id, "PROOF_MINTED", "COMPLETED")
        .with_proof_ref(format!("manifest:{mission_id}.md"))
        .with_meta(proof_meta)
        .validate()?;

    record_and_forward(&state, started).await?;
    record_and_forward(&state, proof).await?;

    Ok(Json(RunResponse {
        ok: true,
        mission_id,
    }))
}

async fn dashboard_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let counts = state.ledger.summary_counts()?;
    let rows = state.ledger.settlement_score(DEFAULT_LIMIT)?;
    Ok(Html(dashboard::render(&counts, &rows)))
}

/// Inserts an envelope and forwards it downstream when appended.
///
/// Forwarding is best-effort: the ledger row is already durable, so a
/// transport failure is logged and the request still succeeds (the
/// downstream consumer catches up on the next retry or replay).
async fn record_and_forward(
    state: &AppState,
    envelope: mctl_core::envelope::Envelope,
) -> Result<InsertOutcome, ApiError> {
    let outcome = state.ledger.insert(&envelope)?;

    if let InsertOutcome::Appended { seq_id, ts } = outcome {
        let stored = StoredEnvelope::from_accepted(&envelope, seq_id, ts);
        if let Err(error) = state.emitter.forward(&stored).await {
            warn!(
                error = %error,
                mission_id = %stored.mission_id,
                event_type = %stored.event_type,
                "downstream forward failed, envelope remains stored"
            );
        }
    }

    Ok(outcome)
}
