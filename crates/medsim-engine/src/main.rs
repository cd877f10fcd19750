//! Engine binary for the MedSim simulation.
//!
//! This is the main entry point that wires together configuration, the
//! seed city, the logging sinks, the observer API and the real-time
//! driver. It runs until Ctrl-C or the configured real-time limit.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `medsim-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the seed snapshot (file or built-in city)
//! 4. Build the log sinks (tracing, ring buffer, live broadcast)
//! 5. Assemble the orchestrator
//! 6. Start the Observer API server
//! 7. Install the Ctrl-C handler
//! 8. Run the simulation
//! 9. Log the result

mod error;

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use medsim_core::{Command, Orchestrator, SimulationConfig, run_simulation};
use medsim_events::{BroadcastSink, FanoutSink, LogBuffer, TracingSink};
use medsim_observer::{AppState, ServerConfig};
use medsim_world::WorldState;
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "medsim-config.yaml";

/// Capacity of the driver's command channel.
const COMMAND_CAPACITY: usize = 64;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run().await?;
    Ok(())
}

async fn run() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        world_name = config.world.name,
        lab_interval_ms = config.schedule.lab_interval_ms,
        max_cascade_depth = config.schedule.max_cascade_depth,
        time_scale = config.simulation.time_scale,
        "medsim-engine starting"
    );

    // 3. Load the seed.
    let world = load_world(config.world.seed_file.as_deref())?;
    info!(
        labs = world.labs.len(),
        hospitals = world.hospitals.len(),
        pharmacies = world.pharmacies.len(),
        suppliers = world.suppliers.len(),
        "Seed loaded"
    );

    // 4. Log sinks.
    let logs = Arc::new(LogBuffer::new(config.logging.buffer_capacity));
    let (log_tx, _) = broadcast::channel(config.logging.broadcast_capacity.max(1));
    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(logs.clone())
        .with(Arc::new(BroadcastSink::new(log_tx.clone())));

    // 5. Orchestrator.
    let mut orchestrator = Orchestrator::new(&config, world, Arc::new(sink), Utc::now());
    let (commands, mut command_rx) = mpsc::channel(COMMAND_CAPACITY);

    // 6. Observer API server.
    let observer_handle = if config.observer.enabled {
        let server = ServerConfig {
            host: config.observer.host.clone(),
            port: config.observer.port,
        };
        let state = Arc::new(AppState::new(commands.clone(), logs, log_tx));
        let handle = medsim_observer::spawn_observer(server, state)?;
        info!(port = config.observer.port, "Observer API server started");
        Some(handle)
    } else {
        info!("Observer disabled");
        None
    };

    // 7. Ctrl-C asks the driver to stop between tasks.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = commands.send(Command::Stop).await;
        }
    });

    // 8. Run.
    let result = run_simulation(&mut orchestrator, &mut command_rx, &config.simulation).await?;

    if let Some(handle) = observer_handle {
        handle.abort();
    }

    // 9. Report.
    let world = orchestrator.world();
    let open_orders: usize = world
        .pharmacies
        .values()
        .map(|pharmacy| pharmacy.pending_orders.len())
        .sum();
    info!(
        end_reason = ?result.end_reason,
        tasks_run = result.tasks_run,
        virtual_ms = result.virtual_ms,
        alerts = world.city.active_alerts.len(),
        open_orders,
        "medsim-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `medsim-config.yaml`.
///
/// Looks for the file relative to the current working directory and
/// falls back to defaults (plus environment overrides) without it.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        Ok(SimulationConfig::parse("")?)
    }
}

/// Load the seed snapshot, or the built-in city without one.
fn load_world(seed_file: Option<&Path>) -> Result<WorldState, EngineError> {
    match seed_file {
        Some(path) => {
            info!(path = %path.display(), "Loading seed snapshot");
            Ok(WorldState::from_json_file(path)?)
        }
        None => Ok(medsim_world::starting_world()),
    }
}
