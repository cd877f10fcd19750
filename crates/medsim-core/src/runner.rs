//! Real-time driver for the virtual-time orchestrator.
//!
//! [`run_simulation`] owns the [`Orchestrator`] for the lifetime of the
//! run. It maps elapsed wall-clock time onto virtual time, sleeps until the
//! next task is due, and between tasks serves [`Command`]s from the observer.
//! Because every read and write of the world goes through this one task,
//! no lock guards the world state.

use std::time::Duration;

use medsim_world::{Scenario, WorldState};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::SimulationBoundsConfig;
use crate::orchestrator::Orchestrator;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Nothing was scheduled after start, so the run could never progress.
    #[error("no tasks scheduled: the orchestrator has no agents")]
    Idle,
}

/// A request served by the driver between tasks.
#[derive(Debug)]
pub enum Command {
    /// Reply with a copy of the world state.
    Snapshot(oneshot::Sender<WorldState>),
    /// Apply a scenario and reply with its message.
    Scenario {
        /// Scenario to apply.
        scenario: Scenario,
        /// Receives the scenario's description.
        reply: oneshot::Sender<String>,
    },
    /// Stop the run.
    Stop,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// A [`Command::Stop`] was received.
    OperatorStop,
    /// Every command sender was dropped.
    ChannelClosed,
    /// The configured real-time limit elapsed.
    MaxRealTimeReached,
}

/// Result of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationResult {
    /// Why the run ended.
    pub end_reason: SimulationEndReason,
    /// Scheduled tasks executed.
    pub tasks_run: u64,
    /// Virtual time reached, in milliseconds.
    pub virtual_ms: u64,
}

/// Drive `orchestrator` until stopped, the channel closes, or the
/// real-time limit in `bounds` elapses.
///
/// # Errors
///
/// Returns [`RunnerError::Idle`] if nothing is scheduled after start.
pub async fn run_simulation(
    orchestrator: &mut Orchestrator,
    commands: &mut mpsc::Receiver<Command>,
    bounds: &SimulationBoundsConfig,
) -> Result<SimulationResult, RunnerError> {
    let scale = u64::from(bounds.time_scale.max(1));
    let started = Instant::now();
    let deadline = (bounds.max_real_time_seconds > 0)
        .then(|| started.checked_add(Duration::from_secs(bounds.max_real_time_seconds)))
        .flatten();
    let mut tasks_run: u64 = 0;

    orchestrator.start();
    info!(
        agents = orchestrator.agent_count(),
        time_scale = scale,
        max_real_time_seconds = bounds.max_real_time_seconds,
        "Simulation starting"
    );

    let end_reason = loop {
        let now_ms = virtual_now(started, scale);
        let ran = orchestrator.run_until(now_ms);
        tasks_run = tasks_run.saturating_add(u64::try_from(ran).unwrap_or(u64::MAX));

        let Some(next_due) = orchestrator.next_due() else {
            return Err(RunnerError::Idle);
        };
        let wait_ms = next_due.saturating_sub(now_ms).div_ceil(scale);

        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(wait_ms)) => {}
            () = until(deadline) => {
                info!(
                    max_seconds = bounds.max_real_time_seconds,
                    "Real-time limit reached"
                );
                break SimulationEndReason::MaxRealTimeReached;
            }
            command = commands.recv() => {
                let ran = orchestrator.run_until(virtual_now(started, scale));
                tasks_run = tasks_run.saturating_add(u64::try_from(ran).unwrap_or(u64::MAX));
                match command {
                    Some(Command::Snapshot(reply)) => {
                        if reply.send(orchestrator.snapshot()).is_err() {
                            warn!("Snapshot requester went away");
                        }
                    }
                    Some(Command::Scenario { scenario, reply }) => {
                        let message = orchestrator.apply_scenario(scenario);
                        if reply.send(message).is_err() {
                            warn!(scenario = scenario.name(), "Scenario requester went away");
                        }
                    }
                    Some(Command::Stop) => {
                        info!("Operator stop requested");
                        break SimulationEndReason::OperatorStop;
                    }
                    None => {
                        info!("Command channel closed");
                        break SimulationEndReason::ChannelClosed;
                    }
                }
            }
        }
    };

    let result = SimulationResult {
        end_reason,
        tasks_run,
        virtual_ms: orchestrator.now_ms(),
    };
    info!(
        reason = ?result.end_reason,
        tasks_run = result.tasks_run,
        virtual_ms = result.virtual_ms,
        "Simulation ended"
    );
    Ok(result)
}

/// Virtual milliseconds elapsed since `started`.
fn virtual_now(started: Instant, scale: u64) -> u64 {
    u64::try_from(started.elapsed().as_millis())
        .unwrap_or(u64::MAX)
        .saturating_mul(scale)
}

/// Resolves at `deadline`, or never without one.
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use medsim_events::LogBuffer;

    use super::*;

    fn fast_bounds(max_real_time_seconds: u64) -> SimulationBoundsConfig {
        SimulationBoundsConfig {
            max_real_time_seconds,
            time_scale: 1_000,
        }
    }

    #[tokio::test]
    async fn commands_are_served_between_tasks() {
        let buffer = Arc::new(LogBuffer::new(10_000));
        let mut orchestrator =
            Orchestrator::with_defaults(medsim_world::starting_world(), buffer.clone());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let result = run_simulation(&mut orchestrator, &mut rx, &fast_bounds(0)).await;
            (result, orchestrator)
        });

        let (reply, answer) = oneshot::channel();
        tx.send(Command::Snapshot(reply)).await.unwrap();
        assert_eq!(answer.await.unwrap().hospitals.len(), 3);

        let (reply, answer) = oneshot::channel();
        tx.send(Command::Scenario {
            scenario: Scenario::Heatwave,
            reply,
        })
        .await
        .unwrap();
        assert!(answer.await.unwrap().to_lowercase().contains("heatwave"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(Command::Stop).await.unwrap();
        let (result, orchestrator) = handle.await.unwrap();
        let result = result.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert!(result.tasks_run > 0);
        assert!(orchestrator.now_ms() > 0);
        assert!(buffer.contains_type("SCENARIO"));
    }

    #[tokio::test]
    async fn closed_channel_ends_the_run() {
        let mut orchestrator = Orchestrator::with_defaults(
            WorldState::default(),
            Arc::new(LogBuffer::new(16)),
        );
        let (tx, mut rx) = mpsc::channel(1);
        drop(tx);
        let result = run_simulation(&mut orchestrator, &mut rx, &fast_bounds(0))
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::ChannelClosed);
    }

    #[tokio::test]
    async fn real_time_limit_ends_the_run() {
        let mut orchestrator = Orchestrator::with_defaults(
            WorldState::default(),
            Arc::new(LogBuffer::new(16)),
        );
        let (_tx, mut rx) = mpsc::channel(1);
        let result = run_simulation(&mut orchestrator, &mut rx, &fast_bounds(1))
            .await
            .unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxRealTimeReached);
        assert!(result.virtual_ms > 0);
    }

    #[tokio::test]
    async fn abandoned_scenario_reply_keeps_the_run_going() {
        let buffer = Arc::new(LogBuffer::new(1_000));
        let mut orchestrator =
            Orchestrator::with_defaults(medsim_world::starting_world(), buffer.clone());
        let (tx, mut rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            run_simulation(&mut orchestrator, &mut rx, &fast_bounds(0)).await
        });

        let (reply, answer) = oneshot::channel();
        drop(answer);
        tx.send(Command::Scenario {
            scenario: Scenario::Dengue,
            reply,
        })
        .await
        .unwrap();

        let (reply, answer) = oneshot::channel();
        tx.send(Command::Snapshot(reply)).await.unwrap();
        assert_eq!(answer.await.unwrap().labs.len(), 2);

        tx.send(Command::Stop).await.unwrap();
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert!(buffer.contains_type("SCENARIO"));
    }
}
