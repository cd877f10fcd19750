//! Configuration loading and typed config structures for the MedSim simulation.
//!
//! The canonical configuration lives in `medsim-config.yaml` at the project
//! root. Every section and field has a default, so an empty file (or no
//! file at all) yields a runnable simulation.

use std::path::{Path, PathBuf};

use medsim_agents::AgentConfig;
use medsim_events::{DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_DEPTH};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `medsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World name and seed snapshot.
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick intervals and the cascade guard.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Agent decision thresholds.
    #[serde(default)]
    pub agents: AgentConfig,

    /// Observer HTTP server.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `MEDSIM_OBSERVER_PORT` overrides `observer.port`
    /// - `MEDSIM_SEED_FILE` overrides `world.seed_file`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `MEDSIM_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEDSIM_OBSERVER_PORT") {
            match val.parse() {
                Ok(port) => self.observer.port = port,
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid MEDSIM_OBSERVER_PORT"),
            }
        }
        if let Ok(val) = std::env::var("MEDSIM_SEED_FILE") {
            self.world.seed_file = (!val.is_empty()).then(|| PathBuf::from(val));
        }
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// JSON seed snapshot replacing the built-in city, if set.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed_file: None,
        }
    }
}

/// Per-agent tick intervals, in virtual milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleConfig {
    /// Lab tick interval.
    #[serde(default = "default_lab_interval_ms")]
    pub lab_interval_ms: u64,

    /// Hospital tick interval.
    #[serde(default = "default_hospital_interval_ms")]
    pub hospital_interval_ms: u64,

    /// Pharmacy tick interval.
    #[serde(default = "default_pharmacy_interval_ms")]
    pub pharmacy_interval_ms: u64,

    /// Supplier tick interval.
    #[serde(default = "default_supplier_interval_ms")]
    pub supplier_interval_ms: u64,

    /// City tick interval.
    #[serde(default = "default_city_interval_ms")]
    pub city_interval_ms: u64,

    /// Publishes nested deeper than this are dropped.
    #[serde(default = "default_max_cascade_depth")]
    pub max_cascade_depth: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            lab_interval_ms: default_lab_interval_ms(),
            hospital_interval_ms: default_hospital_interval_ms(),
            pharmacy_interval_ms: default_pharmacy_interval_ms(),
            supplier_interval_ms: default_supplier_interval_ms(),
            city_interval_ms: default_city_interval_ms(),
            max_cascade_depth: default_max_cascade_depth(),
        }
    }
}

/// Observer server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Whether to start the HTTP server.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Agent log entries kept for `GET /api/logs`.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Capacity of the live log broadcast channel.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            buffer_capacity: default_buffer_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Simulation boundary parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many real seconds (0 = run until interrupted).
    #[serde(default)]
    pub max_real_time_seconds: u64,

    /// Virtual milliseconds advanced per real millisecond.
    #[serde(default = "default_time_scale")]
    pub time_scale: u32,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_real_time_seconds: 0,
            time_scale: default_time_scale(),
        }
    }
}

fn default_world_name() -> String {
    "MedSim City".to_owned()
}

const fn default_lab_interval_ms() -> u64 {
    10_000
}

const fn default_hospital_interval_ms() -> u64 {
    8_000
}

const fn default_pharmacy_interval_ms() -> u64 {
    12_000
}

const fn default_supplier_interval_ms() -> u64 {
    15_000
}

const fn default_city_interval_ms() -> u64 {
    20_000
}

const fn default_max_cascade_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

const fn default_true() -> bool {
    true
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

const fn default_broadcast_capacity() -> usize {
    256
}

const fn default_time_scale() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.schedule.lab_interval_ms, 10_000);
        assert_eq!(config.schedule.max_cascade_depth, 32);
        assert_eq!(config.logging.buffer_capacity, 200);
        assert!(config.observer.enabled);
        assert!(config.world.seed_file.is_none());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r#"
world:
  name: "Test City"
schedule:
  hospital_interval_ms: 2000
agents:
  hospital:
    overload_ratio: 0.9
  supplier:
    dispatch_per_tick: 1
logging:
  level: "debug"
"#;
        let config = SimulationConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.world.name, "Test City");
        assert_eq!(config.schedule.hospital_interval_ms, 2000);
        assert_eq!(config.schedule.lab_interval_ms, 10_000);
        assert!((config.agents.hospital.overload_ratio - 0.9).abs() < f64::EPSILON);
        assert!((config.agents.hospital.inflow_weight - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.agents.supplier.dispatch_per_tick, 1);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = SimulationConfig::parse("").unwrap_or_default();
        assert_eq!(config.schedule, ScheduleConfig::default());
        assert_eq!(config.agents, AgentConfig::default());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = SimulationConfig::parse(include_str!("../../../medsim-config.yaml"));
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert_eq!(config.schedule, ScheduleConfig::default());
        assert_eq!(config.agents, AgentConfig::default());
        assert_eq!(config.simulation, SimulationBoundsConfig::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn invalid_yaml_is_rejected() {
        assert!(matches!(
            SimulationConfig::parse("schedule: [not, a, map"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            SimulationConfig::from_file(Path::new("/nonexistent/medsim-config.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
