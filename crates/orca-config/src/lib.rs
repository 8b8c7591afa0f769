//! # ORCA Config
//!
//! Single-file configuration for ORCA.
//! One `orca.yaml` configures the orchestrator, the simulation brains,
//! the metrics engine, the state store, and observability settings.

mod loader;

pub use loader::{load_config, validate_config, ConfigError};

use std::time::Duration;

use serde::Deserialize;

/// Layout names understood by the building model.
pub const KNOWN_LAYOUTS: &[&str] = &["demo_floor", "siebel_center"];

/// Store backends understood by the runtime bootstrap.
pub const KNOWN_BACKENDS: &[&str] = &["in_memory", "redis"];

/// Top-level configuration schema for ORCA.
#[derive(Debug, Clone, Deserialize)]
pub struct OrcaConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub store: StoreSpec,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for OrcaConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            simulation: SimulationConfig::default(),
            metrics: MetricsConfig::default(),
            store: StoreSpec::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "orca".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// Hybrid scheduling knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Parallel instances launched per team.
    #[serde(default = "default_instances_per_team")]
    pub instances_per_team: usize,
    /// How often a waiting team re-reads upstream results.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Hard limit on waiting for upstream results.
    #[serde(default = "default_upstream_timeout_ms")]
    pub upstream_timeout_ms: u64,
}

impl OrchestratorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            instances_per_team: default_instances_per_team(),
            poll_interval_ms: default_poll_interval_ms(),
            upstream_timeout_ms: default_upstream_timeout_ms(),
        }
    }
}

fn default_instances_per_team() -> usize {
    3
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_upstream_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Layout used by the evacuation and spread brains.
    #[serde(default = "default_simulation_layout")]
    pub layout: String,
    #[serde(default = "default_horizon_minutes")]
    pub horizon_minutes: u32,
    #[serde(default = "default_survivability_horizon")]
    pub survivability_horizon_minutes: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            layout: default_simulation_layout(),
            horizon_minutes: default_horizon_minutes(),
            survivability_horizon_minutes: default_survivability_horizon(),
        }
    }
}

fn default_simulation_layout() -> String {
    "demo_floor".to_string()
}

fn default_horizon_minutes() -> u32 {
    10
}

fn default_survivability_horizon() -> u32 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_destination")]
    pub destination: String,
    #[serde(default = "default_metrics_layout")]
    pub layout: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            destination: default_destination(),
            layout: default_metrics_layout(),
        }
    }
}

fn default_origin() -> String {
    "Lobby".to_string()
}

fn default_destination() -> String {
    "1302".to_string()
}

fn default_metrics_layout() -> String {
    "siebel_center".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSpec {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub connection_url: Option<String>,
    /// Key namespace used by backend implementations.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Buffered events per subscriber before lagging.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for StoreSpec {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            connection_url: None,
            key_prefix: default_key_prefix(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_backend() -> String {
    "in_memory".to_string()
}

fn default_key_prefix() -> String {
    "simulation".to_string()
}

fn default_event_capacity() -> usize {
    1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub traces_enabled: bool,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            traces_enabled: false,
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
