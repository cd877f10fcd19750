//! Observer API server for the MedSim simulation.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/logs`) pushing every agent log entry
//!   as it is produced, via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the world state, the recent log tail and the
//!   scenario triggers
//! - **Minimal HTML status page** (`GET /`) with entity counts and links
//!   to the API
//!
//! # Architecture
//!
//! The simulation driver owns the world state. The observer never
//! touches it directly: state reads and scenario triggers are sent as
//! [`Command`]s over an mpsc channel and answered between scheduled tasks,
//! so a request never observes a half-finished cascade. Log reads are
//! served from the shared [`LogBuffer`].
//!
//! [`Command`]: medsim_core::Command
//! [`LogBuffer`]: medsim_events::LogBuffer

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_observer;
pub use state::AppState;
