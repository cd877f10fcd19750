//! REST API endpoint handlers for the Observer server.
//!
//! World reads and scenario triggers go through the driver's command
//! channel; log reads come straight from the shared ring buffer.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/state` | Full world state |
//! | `GET` | `/api/logs` | Newest-first log tail (`?limit=N`) |
//! | `POST` | `/api/simulate/{scenario}` | Apply a named scenario |

use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use medsim_world::Scenario;

use crate::error::ObserverError;
use crate::state::AppState;

/// Entries returned by `/api/logs` without a `limit`.
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Upper bound on `limit` for `/api/logs`.
pub const MAX_LOG_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/logs` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct LogsQuery {
    /// Maximum number of entries to return (default 50, capped at 500).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with entity counts and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    let world = state.snapshot().await?;
    let metrics = [
        ("Labs", world.labs.len()),
        ("Hospitals", world.hospitals.len()),
        ("Pharmacies", world.pharmacies.len()),
        ("Suppliers", world.suppliers.len()),
        ("Alerts", world.city.active_alerts.len()),
        ("Log entries", state.logs.len()),
    ];
    let mut cards = String::new();
    for (label, value) in metrics {
        let _ = write!(
            cards,
            r#"<div class="metric"><div class="label">{label}</div><div class="value">{value}</div></div>"#
        );
    }
    let mut scenarios = String::new();
    for scenario in Scenario::ALL {
        let _ = write!(scenarios, "<li>/api/simulate/{scenario}</li>");
    }

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>MedSim Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .post li::before {{ content: "POST "; color: #d29922; font-weight: bold; }}
        .get li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>MedSim Observer</h1>
    <p class="subtitle">City health network agent simulation</p>
    <p>Status: <span class="status">RUNNING</span></p>
    <div>{cards}</div>
    <h2>API</h2>
    <ul class="get">
        <li><a href="/api/state">/api/state</a></li>
        <li><a href="/api/logs?limit=50">/api/logs?limit=50</a></li>
        <li>/ws/logs (WebSocket)</li>
        <li><a href="/health">/health</a></li>
    </ul>
    <h2>Scenarios</h2>
    <ul class="post">{scenarios}</ul>
</body>
</html>"#
    )))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe. Does not wait on the simulation driver.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /api/state -- full world state
// ---------------------------------------------------------------------------

/// Return the world state as the driver sees it between tasks.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.snapshot().await?))
}

// ---------------------------------------------------------------------------
// GET /api/logs -- newest-first log tail
// ---------------------------------------------------------------------------

/// Return up to `limit` recent log entries, newest first.
///
/// # Query Parameters
///
/// - `limit`: entries to return (default 50, at most 500)
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    Json(state.logs.tail(limit))
}

// ---------------------------------------------------------------------------
// POST /api/simulate/{scenario}
// ---------------------------------------------------------------------------

/// Apply a named scenario, e.g. `dengue` or `hospital-overload`.
pub async fn simulate(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let scenario: Scenario = name
        .parse()
        .map_err(|_unknown| ObserverError::NotFound(format!("scenario {name}")))?;
    let message = state.trigger(scenario).await?;
    tracing::info!(scenario = scenario.name(), "Scenario triggered via API");
    Ok(Json(serde_json::json!({
        "ok": true,
        "scenario": scenario.name(),
        "message": message,
    })))
}
