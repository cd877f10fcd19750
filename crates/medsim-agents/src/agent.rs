//! The [`Agent`] trait shared by every agent kind.
//!
//! Agents hold only their entity id, their thresholds and their tick
//! interval. Everything they know about the city is read from the world
//! state in the [`AgentContext`] at the moment they act.

use chrono::{DateTime, Utc};
use medsim_events::{AgentContext, AgentKey, EventHandler, TimerAction};
use medsim_types::{AgentKind, EventKind, LogEntry};

use crate::error::AgentError;

/// A periodic, event-driven participant in the simulation.
pub trait Agent: EventHandler {
    /// Agent role.
    fn kind(&self) -> AgentKind;

    /// Seed id of the entity this agent acts for.
    fn entity_id(&self) -> &str;

    /// Event kinds this agent subscribes to, in subscription order.
    fn subscriptions(&self) -> Vec<EventKind>;

    /// Virtual milliseconds between ticks.
    fn tick_interval_ms(&self) -> u64;

    /// Periodic evaluation of the agent's rules.
    fn tick(&self, cx: &mut AgentContext<'_>) -> Result<(), AgentError>;

    /// Callback for a timer this agent scheduled.
    fn on_timer(&self, action: TimerAction, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let _ = (action, cx);
        Ok(())
    }

    /// Key used to route timer callbacks back to this agent.
    fn key(&self) -> AgentKey {
        AgentKey::new(self.kind(), self.entity_id())
    }

    /// Start a log entry attributed to this agent.
    fn entry(
        &self,
        now: DateTime<Utc>,
        event_type: impl Into<String>,
        message: impl Into<String>,
    ) -> LogEntry
    where
        Self: Sized,
    {
        LogEntry::new(now, self.kind(), event_type, message).entity(self.entity_id())
    }
}
