//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. A real orchestrator runs behind the command
//! channel, so state reads and scenario triggers take the same path as
//! in production.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use medsim_core::config::SimulationBoundsConfig;
use medsim_core::{Orchestrator, run_simulation};
use medsim_events::{BroadcastSink, FanoutSink, LogBuffer, LogSink};
use medsim_observer::router::build_router;
use medsim_observer::state::AppState;
use medsim_types::{AgentKind, LogEntry};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceExt;

/// App state wired to a live driver over the built-in seed.
fn make_test_state() -> Arc<AppState> {
    let logs = Arc::new(LogBuffer::new(1_000));
    let (tx, _) = broadcast::channel(256);
    let sink = FanoutSink::new()
        .with(logs.clone())
        .with(Arc::new(BroadcastSink::new(tx.clone())));
    let mut orchestrator =
        Orchestrator::with_defaults(medsim_world::starting_world(), Arc::new(sink));
    let (commands, mut rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let _ = run_simulation(&mut orchestrator, &mut rx, &SimulationBoundsConfig::default()).await;
    });
    Arc::new(AppState::new(commands, logs, tx))
}

/// App state whose driver has already gone away.
fn make_stopped_state() -> Arc<AppState> {
    let (commands, rx) = mpsc::channel(1);
    drop(rx);
    let (tx, _) = broadcast::channel(8);
    Arc::new(AppState::new(commands, Arc::new(LogBuffer::new(8)), tx))
}

fn entry(n: usize) -> LogEntry {
    LogEntry::new(Utc::now(), AgentKind::System, "TEST", format!("entry {n}"))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_health() {
    let router = build_router(make_stopped_state());

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_get_state() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(Request::get("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hospitals"].as_object().unwrap().len(), 3);
    assert_eq!(json["labs"].as_object().unwrap().len(), 2);
    assert!(json["city"]["risk_zones"].is_object());
}

#[tokio::test]
async fn test_get_state_without_driver_is_unavailable() {
    let router = build_router(make_stopped_state());

    let response = router
        .oneshot(Request::get("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_logs_default_limit_newest_first() {
    let state = make_test_state();
    for n in 0..60 {
        state.logs.log(entry(n));
    }
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/logs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 50);
    assert_eq!(entries[0]["message"], "entry 59");
    assert_eq!(entries[0]["meta"]["type"], "TEST");
}

#[tokio::test]
async fn test_logs_limit_is_capped() {
    let state = make_test_state();
    for n in 0..520 {
        state.logs.log(entry(n));
    }
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/logs?limit=10000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json.as_array().unwrap().len(), 500);
}

#[tokio::test]
async fn test_logs_explicit_limit() {
    let state = make_test_state();
    for n in 0..5 {
        state.logs.log(entry(n));
    }
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/logs?limit=2").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["message"], "entry 3");
}

#[tokio::test]
async fn test_simulate_scenario() {
    let state = make_test_state();
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::post("/api/simulate/dengue")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["scenario"], "dengue");
    assert!(json["message"].as_str().unwrap().contains("Dengue"));
    assert!(state.logs.contains_type("SCENARIO"));
}

#[tokio::test]
async fn test_simulate_unknown_scenario_returns_404() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(
            Request::post("/api/simulate/meteor-strike")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simulate_requires_post() {
    let router = build_router(make_test_state());

    let response = router
        .oneshot(
            Request::get("/api/simulate/dengue")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_broadcast_channel() {
    let state = make_stopped_state();
    let mut rx = state.subscribe();

    BroadcastSink::new(state.tx.clone()).log(entry(42));

    let received = rx.recv().await.unwrap();
    assert_eq!(received.message, "entry 42");
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let router = build_router(make_stopped_state());

    let response = router
        .oneshot(
            Request::get("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
