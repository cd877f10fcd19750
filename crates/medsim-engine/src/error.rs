//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the simulation run.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: medsim_core::ConfigError,
    },

    /// The seed snapshot could not be loaded.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: medsim_world::WorldError,
    },

    /// The simulation driver failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: medsim_core::RunnerError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: medsim_observer::ServerError,
    },
}
