//! Error types for the `medsim-agents` crate.
//!
//! Agents treat a missing entity as a no-op, so the only failures left are
//! world mutations the world model rejects.

use medsim_events::HandlerError;
use medsim_world::WorldError;

/// Errors raised by agent ticks, handlers and timer callbacks.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The world model rejected a mutation.
    #[error(transparent)]
    World(#[from] WorldError),
}

impl From<AgentError> for HandlerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::World(inner) => Self::World(inner),
        }
    }
}
