//! `WebSocket` handler for the live log stream.
//!
//! Clients connect to `GET /ws/logs` and receive each [`LogEntry`] as one
//! JSON text frame, in the order the agents produced them. The handler
//! uses a [`broadcast::Receiver`] so all connected clients see the same
//! stream.
//!
//! If a client falls behind, lagged entries are skipped and the client
//! resumes from the oldest entry still buffered.
//!
//! [`LogEntry`]: medsim_types::LogEntry
//! [`broadcast::Receiver`]: tokio::sync::broadcast::Receiver

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming log entries.
///
/// # Route
///
/// `GET /ws/logs`
pub async fn ws_logs(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Forward broadcast entries to the socket until either side closes.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(entry) => {
                        let json = match serde_json::to_string(&entry) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize log entry: {e}");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Log stream closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    // Clients have nothing to say on this channel.
                    _ => {}
                }
            }
        }
    }
}
