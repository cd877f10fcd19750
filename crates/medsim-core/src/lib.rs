//! Configuration, scheduling and orchestration for the MedSim simulation.
//!
//! This crate assembles the coordination substrate: it builds one agent
//! per seeded entity, subscribes them to the event bus, and runs their
//! ticks and delayed callbacks on a single cooperative virtual-time
//! scheduler.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `medsim-config.yaml` into
//!   strongly-typed structs.
//! - [`orchestrator`] -- The [`Orchestrator`] composition root.
//! - [`runner`] -- [`run_simulation`], the async real-time driver and its
//!   command channel.
//! - [`scheduler`] -- Min-heap task queue with FIFO ordering on ties.

pub mod config;
pub mod orchestrator;
pub mod runner;
pub mod scheduler;

pub use config::{ConfigError, SimulationConfig};
pub use orchestrator::Orchestrator;
pub use runner::{Command, RunnerError, SimulationEndReason, SimulationResult, run_simulation};
pub use scheduler::{Scheduler, Task};
