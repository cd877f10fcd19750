//! The per-dispatch view handed to ticks and event handlers.

use chrono::{DateTime, Utc};
use medsim_types::{LogEntry, SimEvent};
use medsim_world::WorldState;

use crate::bus::{DispatchReport, EventBus};
use crate::sink::{LogSink, log_guarded};
use crate::timer::{AgentKey, TimerAction, TimerRequest};

/// Live, mutable access to the simulation for the duration of one task.
///
/// The context is threaded through every nested publish, so a handler
/// sees the world exactly as the handlers before it left it.
pub struct AgentContext<'a> {
    /// The shared world state.
    pub world: &'a mut WorldState,
    bus: &'a EventBus,
    sink: &'a dyn LogSink,
    timers: &'a mut Vec<TimerRequest>,
    now: DateTime<Utc>,
}

impl<'a> AgentContext<'a> {
    /// Assemble a context for one scheduled task.
    pub fn new(
        world: &'a mut WorldState,
        bus: &'a EventBus,
        sink: &'a dyn LogSink,
        timers: &'a mut Vec<TimerRequest>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            world,
            bus,
            sink,
            timers,
            now,
        }
    }

    /// Current simulation time.
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Publish `event` to every subscriber of its kind, depth-first.
    ///
    /// Returns once every handler (and everything they published in turn)
    /// has run.
    pub fn publish(&mut self, event: SimEvent) -> DispatchReport {
        let bus = self.bus;
        bus.dispatch(&event, self)
    }

    /// The bus, for handlers that subscribe or unsubscribe while running.
    pub const fn bus(&self) -> &'a EventBus {
        self.bus
    }

    /// Hand an entry to the logging sink. Sink panics are swallowed.
    pub fn log(&self, entry: LogEntry) {
        log_guarded(self.sink, entry);
    }

    /// Ask the scheduler to call `owner` back with `action` after `delay_ms`.
    pub fn schedule(&mut self, owner: AgentKey, delay_ms: u64, action: TimerAction) {
        self.timers.push(TimerRequest {
            owner,
            delay_ms,
            action,
        });
    }
}

impl core::fmt::Debug for AgentContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AgentContext")
            .field("now", &self.now)
            .field("pending_timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}
