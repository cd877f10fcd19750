//! Coordination substrate for the MedSim simulation.
//!
//! Agents never call each other. They publish [`SimEvent`]s on the
//! [`EventBus`], which invokes every subscriber synchronously with an
//! [`AgentContext`]: mutable access to the world, the bus itself, the
//! logging sink and the timer queue.
//!
//! # Modules
//!
//! - [`bus`] -- Subscription registry and depth-guarded, fault-isolating dispatch.
//! - [`context`] -- The [`AgentContext`] threaded through ticks and handlers.
//! - [`error`] -- [`HandlerError`], logged by the bus and never propagated.
//! - [`sink`] -- [`LogSink`] and its tracing, ring-buffer, broadcast and fan-out implementations.
//! - [`timer`] -- Delayed callback requests consumed by the scheduler.
//!
//! [`SimEvent`]: medsim_types::SimEvent

pub mod bus;
pub mod context;
pub mod error;
pub mod sink;
pub mod timer;

pub use bus::{DEFAULT_MAX_DEPTH, DispatchReport, EventBus, EventHandler, SubscriptionId};
pub use context::AgentContext;
pub use error::HandlerError;
pub use sink::{
    BroadcastSink, DEFAULT_BUFFER_CAPACITY, FanoutSink, LogBuffer, LogSink, TracingSink, log_guarded,
};
pub use timer::{AgentKey, TimerAction, TimerRequest};
