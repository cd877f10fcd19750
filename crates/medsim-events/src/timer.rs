//! Delayed callbacks requested by handlers.
//!
//! Handlers cannot sleep; instead they push a [`TimerRequest`] into the
//! dispatch context. The scheduler turns each request into a one-shot
//! task and hands the [`TimerAction`] back to the owning agent when due.

use medsim_types::{AgentKind, OrderId};
use serde::{Deserialize, Serialize};

/// Identifies the agent a timer belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentKey {
    /// Agent role.
    pub kind: AgentKind,
    /// Seed id of the entity the agent acts for.
    pub id: String,
}

impl AgentKey {
    /// Build a key.
    pub fn new(kind: AgentKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl core::fmt::Display for AgentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// What to do when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    /// A dispatched order reached its requester.
    DeliveryArrived {
        /// The order in transit.
        order_id: OrderId,
    },
    /// A delivered order's retention window has passed.
    OrderExpired {
        /// The delivered order.
        order_id: OrderId,
    },
}

/// A one-shot callback scheduled `delay_ms` after the current task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRequest {
    /// Agent to call back.
    pub owner: AgentKey,
    /// Delay in virtual milliseconds.
    pub delay_ms: u64,
    /// Action handed to the owner.
    pub action: TimerAction,
}
