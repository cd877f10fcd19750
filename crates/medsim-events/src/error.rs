//! Error types for the `medsim-events` crate.

use medsim_world::WorldError;

/// A failure reported by an event handler.
///
/// The bus never propagates these: each one is logged as a
/// `HANDLER_FAULT` and dispatch moves on to the next subscriber.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// A world mutation was rejected.
    #[error("world mutation failed: {0}")]
    World(#[from] WorldError),

    /// Any other handler failure.
    #[error("{0}")]
    Failed(String),
}
