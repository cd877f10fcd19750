//! The composition root: world state, bus, scheduler and agents.
//!
//! The [`Orchestrator`] owns every piece of mutable simulation state and
//! lends it to one task at a time through an [`AgentContext`]. There are
//! no globals; whoever owns the orchestrator owns the simulation.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use medsim_agents::{
    Agent, AgentError, CityAgent, HospitalAgent, LabAgent, PharmacyAgent, SupplierAgent,
};
use medsim_events::{
    AgentContext, AgentKey, DispatchReport, EventBus, EventHandler, LogSink, TimerRequest,
    log_guarded,
};
use medsim_types::{AgentKind, LogEntry, SimEvent};
use medsim_world::{Scenario, WorldState};

use crate::config::SimulationConfig;
use crate::scheduler::{Scheduler, Task};

/// Owns the simulation and runs scheduled tasks to completion.
pub struct Orchestrator {
    world: WorldState,
    bus: EventBus,
    scheduler: Scheduler,
    agents: Vec<Arc<dyn Agent>>,
    by_key: BTreeMap<AgentKey, usize>,
    sink: Arc<dyn LogSink>,
    epoch: DateTime<Utc>,
    started: bool,
}

impl Orchestrator {
    /// Build one agent per seeded entity plus the city coordinator, and
    /// subscribe them to the bus.
    ///
    /// Subscription order is labs, hospitals, pharmacies, suppliers, city,
    /// each group in id order. Virtual time 0 maps to `epoch`.
    pub fn new(
        config: &SimulationConfig,
        world: WorldState,
        sink: Arc<dyn LogSink>,
        epoch: DateTime<Utc>,
    ) -> Self {
        let mut orchestrator = Self {
            world,
            bus: EventBus::with_max_depth(config.schedule.max_cascade_depth),
            scheduler: Scheduler::new(),
            agents: Vec::new(),
            by_key: BTreeMap::new(),
            sink,
            epoch,
            started: false,
        };

        let thresholds = Arc::new(config.agents.clone());
        let schedule = &config.schedule;
        let lab_ids: Vec<String> = orchestrator.world.labs.keys().cloned().collect();
        let hospital_ids: Vec<String> = orchestrator.world.hospitals.keys().cloned().collect();
        let pharmacy_ids: Vec<String> = orchestrator.world.pharmacies.keys().cloned().collect();
        let supplier_ids: Vec<String> = orchestrator.world.suppliers.keys().cloned().collect();

        for id in lab_ids {
            orchestrator.register(LabAgent::new(
                id,
                Arc::clone(&thresholds),
                schedule.lab_interval_ms,
            ));
        }
        for id in hospital_ids {
            orchestrator.register(HospitalAgent::new(
                id,
                Arc::clone(&thresholds),
                schedule.hospital_interval_ms,
            ));
        }
        for id in pharmacy_ids {
            orchestrator.register(PharmacyAgent::new(
                id,
                Arc::clone(&thresholds),
                schedule.pharmacy_interval_ms,
            ));
        }
        for id in supplier_ids {
            orchestrator.register(SupplierAgent::new(
                id,
                Arc::clone(&thresholds),
                schedule.supplier_interval_ms,
            ));
        }
        orchestrator.register(CityAgent::new(schedule.city_interval_ms));

        tracing::info!(
            agents = orchestrator.agents.len(),
            max_cascade_depth = config.schedule.max_cascade_depth,
            "Orchestrator assembled"
        );
        orchestrator
    }

    /// Build with default thresholds and intervals.
    pub fn with_defaults(world: WorldState, sink: Arc<dyn LogSink>) -> Self {
        Self::new(&SimulationConfig::default(), world, sink, Utc::now())
    }

    fn register<A: Agent + 'static>(&mut self, agent: A) {
        let agent = Arc::new(agent);
        for kind in agent.subscriptions() {
            let handler: Arc<dyn EventHandler> = agent.clone();
            self.bus.subscribe(kind, handler);
        }
        self.by_key.insert(agent.key(), self.agents.len());
        self.agents.push(agent);
    }

    /// Schedule every agent's first tick one interval from now.
    ///
    /// Calling it twice has no further effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        for (index, agent) in self.agents.iter().enumerate() {
            self.scheduler
                .schedule_in(agent.tick_interval_ms().max(1), Task::Tick(index));
        }
        tracing::info!(agents = self.agents.len(), "Agents started");
    }

    /// Run every task due at or before `until_ms`, in order, then move the
    /// clock to `until_ms`. Returns the number of tasks run.
    pub fn run_until(&mut self, until_ms: u64) -> usize {
        let mut ran = 0_usize;
        while let Some((due_ms, task)) = self.scheduler.pop_due(until_ms) {
            self.run_task(due_ms, task);
            ran = ran.saturating_add(1);
        }
        self.scheduler.advance_to(until_ms);
        ran
    }

    /// Run tasks for another `delta_ms` of virtual time.
    pub fn advance(&mut self, delta_ms: u64) -> usize {
        self.run_until(self.now_ms().saturating_add(delta_ms))
    }

    /// Due time of the next scheduled task.
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Current virtual time in milliseconds.
    pub const fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Wall-clock timestamp for virtual time `ms`.
    pub fn time_at(&self, ms: u64) -> DateTime<Utc> {
        let delta = TimeDelta::try_milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
            .unwrap_or(TimeDelta::MAX);
        self.epoch.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Publish an event from outside any agent, at the current time.
    pub fn publish(&mut self, event: SimEvent) -> DispatchReport {
        let now = self.time_at(self.now_ms());
        let mut timers = Vec::new();
        let report = {
            let mut cx = AgentContext::new(
                &mut self.world,
                &self.bus,
                self.sink.as_ref(),
                &mut timers,
                now,
            );
            cx.publish(event)
        };
        self.enqueue(timers);
        report
    }

    /// Apply a scenario to the world and log it.
    pub fn apply_scenario(&mut self, scenario: Scenario) -> String {
        let message = scenario.apply(&mut self.world);
        let now = self.time_at(self.now_ms());
        log_guarded(
            self.sink.as_ref(),
            LogEntry::new(now, AgentKind::System, "SCENARIO", message.as_str())
                .field("scenario", scenario.name()),
        );
        tracing::info!(scenario = scenario.name(), "Scenario applied");
        message
    }

    /// A copy of the current world state.
    pub fn snapshot(&self) -> WorldState {
        self.world.clone()
    }

    /// The current world state.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// Mutable access to the world state, for tests and tooling.
    pub const fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// The event bus.
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Number of agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    fn run_task(&mut self, due_ms: u64, task: Task) {
        let now = self.time_at(due_ms);
        let mut timers: Vec<TimerRequest> = Vec::new();
        match task {
            Task::Tick(index) => {
                let Some(agent) = self.agents.get(index).cloned() else {
                    return;
                };
                self.run_agent(&agent, now, &mut timers, "TICK_FAULT", |agent, cx| {
                    agent.tick(cx)
                });
                self.scheduler.schedule_at(
                    due_ms.saturating_add(agent.tick_interval_ms().max(1)),
                    Task::Tick(index),
                );
            }
            Task::Timer { owner, action } => {
                let Some(agent) = self
                    .by_key
                    .get(&owner)
                    .and_then(|index| self.agents.get(*index))
                    .cloned()
                else {
                    tracing::warn!(%owner, "Timer fired for unknown agent");
                    return;
                };
                self.run_agent(&agent, now, &mut timers, "TIMER_FAULT", |agent, cx| {
                    agent.on_timer(action, cx)
                });
            }
        }
        self.enqueue(timers);
    }

    /// Run one agent callback with fault isolation: an error or a panic is
    /// logged and the scheduler carries on.
    fn run_agent<F>(
        &mut self,
        agent: &Arc<dyn Agent>,
        now: DateTime<Utc>,
        timers: &mut Vec<TimerRequest>,
        fault_type: &str,
        f: F,
    ) where
        F: FnOnce(&dyn Agent, &mut AgentContext<'_>) -> Result<(), AgentError>,
    {
        let mut cx = AgentContext::new(&mut self.world, &self.bus, self.sink.as_ref(), timers, now);
        let outcome = catch_unwind(AssertUnwindSafe(|| f(agent.as_ref(), &mut cx)));
        let fault = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(_) => "callback panicked".to_owned(),
        };
        tracing::warn!(agent = %agent.key(), error = %fault, "Agent callback failed");
        cx.log(
            LogEntry::new(now, agent.kind(), fault_type, format!("{} failed: {fault}", agent.key()))
                .entity(agent.entity_id())
                .field("error", fault),
        );
    }

    fn enqueue(&mut self, timers: Vec<TimerRequest>) {
        for request in timers {
            self.scheduler.schedule_in(
                request.delay_ms,
                Task::Timer {
                    owner: request.owner,
                    action: request.action,
                },
            );
        }
    }
}

impl core::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("agents", &self.agents.len())
            .field("now_ms", &self.now_ms())
            .field("scheduled", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use medsim_events::LogBuffer;

    use super::*;

    #[test]
    fn one_agent_per_entity_plus_city() {
        let orchestrator =
            Orchestrator::with_defaults(medsim_world::starting_world(), Arc::new(LogBuffer::new(64)));
        // 2 labs, 3 hospitals, 2 pharmacies, 2 suppliers, 1 city
        assert_eq!(orchestrator.agent_count(), 10);
    }

    #[test]
    fn ticks_repeat_on_their_interval() {
        let buffer = Arc::new(LogBuffer::new(500));
        let mut orchestrator = Orchestrator::with_defaults(WorldState::default(), buffer);
        orchestrator.start();
        // only the city agent exists: ticks at 20s, 40s, 60s
        assert_eq!(orchestrator.run_until(60_000), 3);
        assert_eq!(orchestrator.next_due(), Some(80_000));
        assert_eq!(orchestrator.now_ms(), 60_000);
    }

    #[test]
    fn start_is_idempotent() {
        let mut orchestrator =
            Orchestrator::with_defaults(WorldState::default(), Arc::new(LogBuffer::new(8)));
        orchestrator.start();
        orchestrator.start();
        assert_eq!(orchestrator.run_until(20_000), 1);
    }

    struct PanickingSink;

    #[allow(clippy::panic)]
    impl LogSink for PanickingSink {
        fn log(&self, _entry: LogEntry) {
            panic!("sink offline");
        }
    }

    #[test]
    fn panicking_sink_does_not_abort_scenario() {
        let mut orchestrator =
            Orchestrator::with_defaults(medsim_world::starting_world(), Arc::new(PanickingSink));
        let message = orchestrator.apply_scenario(Scenario::Heatwave);
        assert!(message.to_lowercase().contains("heatwave"));
        assert!(!orchestrator.world().city.risk_zones.is_empty());
        assert!(
            orchestrator
                .world()
                .city
                .risk_zones
                .values()
                .all(|risk| risk.tier(medsim_types::Hazard::Heatwave) == medsim_types::RiskTier::High)
        );
    }
}
