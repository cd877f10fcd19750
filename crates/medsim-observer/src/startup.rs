//! Observer server startup helper for embedding in the engine.
//!
//! Provides [`spawn_observer`] which launches the Observer HTTP +
//! `WebSocket` server on a background Tokio task, so the API runs
//! concurrently with the simulation driver.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// The address is validated before spawning; the bind itself happens on
/// the background task and a failure there is logged, not returned. The
/// caller should hold the returned handle and abort it on shutdown.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if `config` is not a valid address.
pub fn spawn_observer(
    config: ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, ServerError> {
    let addr = config.addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::start_server(&config, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(handle)
}
