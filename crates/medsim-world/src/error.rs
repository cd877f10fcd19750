//! Error types for the `medsim-world` crate.
//!
//! Clamping and capped shipments are not errors; only illegal order
//! transitions, unknown references and seed loading failures surface here.

use std::path::PathBuf;

use medsim_types::{OrderId, OrderStatus};

/// Errors that can occur while loading or mutating the world state.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// An order was asked to move backwards or skip a status.
    #[error("order {order} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// The order.
        order: OrderId,
        /// Its current status.
        from: OrderStatus,
        /// The rejected target status.
        to: OrderStatus,
    },

    /// A referenced entity does not exist in the world.
    #[error("{kind} not found: {id}")]
    UnknownEntity {
        /// Entity category, e.g. `pharmacy`.
        kind: &'static str,
        /// The missing id.
        id: String,
    },

    /// A scenario name did not match any known scenario.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    /// The seed file could not be read.
    #[error("failed to read seed file {path}: {source}")]
    SeedIo {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The seed file is not a valid world snapshot.
    #[error("invalid seed snapshot: {0}")]
    SeedJson(#[from] serde_json::Error),
}
