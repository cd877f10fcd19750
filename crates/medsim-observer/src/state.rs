//! Shared application state for the Observer API server.
//!
//! [`AppState`] bundles the three handles the observer needs: the
//! command channel into the simulation driver, the recent-log ring and
//! the broadcast sender feeding `WebSocket` clients.

use std::sync::Arc;

use medsim_core::Command;
use medsim_events::LogBuffer;
use medsim_types::LogEntry;
use medsim_world::{Scenario, WorldState};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::ObserverError;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Requests served by the simulation driver.
    pub commands: mpsc::Sender<Command>,
    /// Recent log entries, newest first.
    pub logs: Arc<LogBuffer>,
    /// Live log stream.
    pub tx: broadcast::Sender<LogEntry>,
}

impl AppState {
    /// Bundle the driver channel and the log handles.
    pub const fn new(
        commands: mpsc::Sender<Command>,
        logs: Arc<LogBuffer>,
        tx: broadcast::Sender<LogEntry>,
    ) -> Self {
        Self { commands, logs, tx }
    }

    /// Subscribe to the live log stream.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }

    /// Ask the driver for a copy of the world state.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::Unavailable`] when the simulation is no
    /// longer running.
    pub async fn snapshot(&self) -> Result<WorldState, ObserverError> {
        let (reply, answer) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        answer.await.map_err(|_closed| unavailable())
    }

    /// Ask the driver to apply `scenario` and return its message.
    ///
    /// # Errors
    ///
    /// Returns [`ObserverError::Unavailable`] when the simulation is no
    /// longer running.
    pub async fn trigger(&self, scenario: Scenario) -> Result<String, ObserverError> {
        let (reply, answer) = oneshot::channel();
        self.send(Command::Scenario { scenario, reply }).await?;
        answer.await.map_err(|_closed| unavailable())
    }

    async fn send(&self, command: Command) -> Result<(), ObserverError> {
        self.commands
            .send(command)
            .await
            .map_err(|_closed| unavailable())
    }
}

fn unavailable() -> ObserverError {
    ObserverError::Unavailable("simulation is not running".to_owned())
}
