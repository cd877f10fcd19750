//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- liveness probe
/// - `GET /ws/logs` -- `WebSocket` log stream
/// - `GET /api/state` -- full world state
/// - `GET /api/logs` -- newest-first log tail
/// - `POST /api/simulate/{scenario}` -- apply a named scenario
///
/// CORS allows any origin; the dashboard is served separately.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/ws/logs", get(ws::ws_logs))
        .route("/api/state", get(handlers::get_state))
        .route("/api/logs", get(handlers::get_logs))
        .route("/api/simulate/{scenario}", post(handlers::simulate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
