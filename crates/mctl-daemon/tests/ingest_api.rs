//! End-to-end tests for the daemon HTTP surface.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use mctl_core::emitter::EnvelopeEmitter;
use mctl_core::ledger::MissionLedger;
use mctl_daemon::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Body read cap for test responses.
const BODY_LIMIT: usize = 64 * 1024;

fn test_router() -> Router {
    let ledger = MissionLedger::in_memory().expect("failed to create in-memory ledger");
    router(AppState::new(ledger, EnvelopeEmitter::disabled()))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serialize body")))
        .expect("build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("parse JSON body")
}

fn envelope(mission_id: &str, event_type: &str, status: &str) -> Value {
    json!({
        "mission_id": mission_id,
        "event_type": event_type,
        "status": status,
    })
}

#[tokio::test]
async fn health_reports_service_identity() {
    let router = test_router();

    let response = router
        .oneshot(get("/api/health"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["forwarder_configured"], json!(false));
}

#[tokio::test]
async fn ingest_replay_answers_inserted_false() {
    let router = test_router();
    let envelope = envelope("VAL-42", "PAYMENT_VERIFIED", "verified");

    let first = router
        .clone()
        .oneshot(post_json("/api/ingest", &envelope))
        .await
        .expect("request failed");
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(json_body(first).await["inserted"], json!(true));

    let second = router
        .clone()
        .oneshot(post_json("/api/ingest", &envelope))
        .await
        .expect("request failed");
    // Suppression is a success, not an error.
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(json_body(second).await["inserted"], json!(false));

    let summary = router
        .oneshot(get("/api/summary"))
        .await
        .expect("request failed");
    let body = json_body(summary).await;
    assert_eq!(body, json!({"total": 1, "ok": 1, "fail": 0}));
}

#[tokio::test]
async fn ingest_rejects_malformed_mission_id() {
    let router = test_router();

    let response = router
        .oneshot(post_json(
            "/api/ingest",
            &envelope("ORDER-42", "PAYMENT_VERIFIED", "VERIFIED"),
        ))
        .await
        .expect("request failed");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("error message")
            .contains("mission_id")
    );
}

#[tokio::test]
async fn ingest_rejects_unknown_fields() {
    let router = test_router();

    let mut payload = envelope("VAL-1", "ORDER_TAGGED", "PENDING");
    payload["surprise"] = json!(true);

    let response = router
        .oneshot(post_json("/api/ingest", &payload))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn finality_freeze_is_visible_over_http() {
    let router = test_router();

    let completed = json!({
        "mission_id": "VAL-7",
        "event_type": "DELIVERY_DISPATCHED",
        "status": "COMPLETED",
        "proof_ref": "pkg:7",
    });
    let failed = json!({
        "mission_id": "VAL-7",
        "event_type": "DELIVERY_DISPATCHED",
        "status": "FAILED",
        "proof_ref": "pkg:7",
    });

    let first = router
        .clone()
        .oneshot(post_json("/api/ingest", &completed))
        .await
        .expect("request failed");
    assert_eq!(json_body(first).await["inserted"], json!(true));

    let second = router
        .clone()
        .oneshot(post_json("/api/ingest", &failed))
        .await
        .expect("request failed");
    assert_eq!(json_body(second).await["inserted"], json!(false));

    let latest = router
        .oneshot(get("/api/missions/latest?limit=10"))
        .await
        .expect("request failed");
    let rows = json_body(latest).await;
    let rows = rows.as_array().expect("array body");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], json!("COMPLETED"));
}

#[tokio::test]
async fn latest_orders_missions_by_recency() {
    let router = test_router();

    for (mission, event, status) in [
        ("VAL-10", "ORDER_TAGGED", "PENDING"),
        ("VAL-10", "DELIVERY_DISPATCHED", "PENDING"),
        ("VAL-11", "SETTLEMENT_CONFIRMED", "SETTLED"),
    ] {
        let response = router
            .clone()
            .oneshot(post_json("/api/ingest", &envelope(mission, event, status)))
            .await
            .expect("request failed");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .oneshot(get("/api/missions/latest?limit=10"))
        .await
        .expect("request failed");
    let rows = json_body(response).await;
    let rows = rows.as_array().expect("array body");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["mission_id"], json!("VAL-11"));
    assert_eq!(rows[1]["mission_id"], json!("VAL-10"));
    assert_eq!(rows[1]["event_type"], json!("DELIVERY_DISPATCHED"));
}

#[tokio::test]
async fn proof_matrix_and_score_annotate_rows() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/ingest",
            &envelope("VAL-20", "SETTLEMENT_CONFIRMED", "SETTLED"),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let matrix = json_body(
        router
            .clone()
            .oneshot(get("/api/proofs/matrix"))
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(matrix[0]["tier"], json!(4));

    let score = json_body(
        router
            .oneshot(get("/api/proofs/score"))
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(score[0]["tier"], json!(4));
    assert_eq!(score[0]["score"], json!(100));
}

#[tokio::test]
async fn runbook_lookup_round_trips() {
    let router = test_router();

    let found = router
        .clone()
        .oneshot(get("/api/runbooks/tag_failed"))
        .await
        .expect("request failed");
    assert_eq!(found.status(), StatusCode::OK);
    let body = json_body(found).await;
    assert_eq!(body["reason_code"], json!("tag_failed"));
    assert!(!body["steps"].as_array().expect("steps").is_empty());

    let missing = router
        .oneshot(get("/api/runbooks/no_such_code"))
        .await
        .expect("request failed");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = json_body(missing).await;
    let known = body["known_codes"].as_array().expect("known codes");
    assert!(known.contains(&json!("webhook_invalid")));
    assert!(known.contains(&json!("payout_pending")));
}

#[tokio::test]
async fn run_trigger_records_start_and_proof() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/missions/run",
            &json!({"mission_id": "VAL-99", "run_id": "nightly-1"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["mission_id"], json!("VAL-99"));

    let summary = json_body(
        router
            .clone()
            .oneshot(get("/api/summary"))
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(summary["total"], json!(2));
    assert_eq!(summary["ok"], json!(2));

    // Replaying the trigger appends nothing: both keys are final.
    let replay = router
        .clone()
        .oneshot(post_json(
            "/api/missions/run",
            &json!({"mission_id": "VAL-99", "run_id": "nightly-1"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(replay.status(), StatusCode::OK);

    let summary = json_body(
        router
            .oneshot(get("/api/summary"))
            .await
            .expect("request failed"),
    )
    .await;
    assert_eq!(summary["total"], json!(2));
}

#[tokio::test]
async fn run_trigger_rejects_malformed_mission_id() {
    let router = test_router();

    let response = router
        .oneshot(post_json(
            "/api/missions/run",
            &json!({"mission_id": "nope"}),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_renders_summary_and_rows() {
    let router = test_router();

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/ingest",
            &envelope("VAL-5", "PROOF_MINTED", "COMPLETED"),
        ))
        .await
        .expect("request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let page = router.oneshot(get("/")).await.expect("request failed");
    assert_eq!(page.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(page.into_body(), BODY_LIMIT)
        .await
        .expect("read response body");
    let html = String::from_utf8(bytes.to_vec()).expect("utf8 body");
    assert!(html.contains("VAL-5"));
    assert!(html.contains("Mission Ledger"));
}
