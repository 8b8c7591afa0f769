//! Configuration loading and validation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::{OrcaConfig, KNOWN_BACKENDS, KNOWN_LAYOUTS};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load full ORCA configuration from YAML file.
pub fn load_config(path: &Path) -> Result<OrcaConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: OrcaConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &OrcaConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.orchestrator.instances_per_team == 0 {
        return Err(ConfigError::Invalid(
            "orchestrator.instances_per_team must be > 0".to_string(),
        ));
    }

    if config.orchestrator.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "orchestrator.poll_interval_ms must be > 0".to_string(),
        ));
    }

    validate_layout("simulation.layout", &config.simulation.layout)?;
    validate_layout("metrics.layout", &config.metrics.layout)?;
    validate_store(config)?;

    Ok(())
}

fn validate_layout(field: &str, layout: &str) -> Result<(), ConfigError> {
    if !KNOWN_LAYOUTS.contains(&layout) {
        return Err(ConfigError::Invalid(format!(
            "{} '{}' is not one of {:?}",
            field, layout, KNOWN_LAYOUTS
        )));
    }
    Ok(())
}

fn validate_store(config: &OrcaConfig) -> Result<(), ConfigError> {
    let store = &config.store;
    if !KNOWN_BACKENDS.contains(&store.backend.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "store.backend '{}' is not one of {:?}",
            store.backend, KNOWN_BACKENDS
        )));
    }

    if store.backend == "redis"
        && store
            .connection_url
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .is_empty()
    {
        return Err(ConfigError::Invalid(
            "store.connection_url is required for the redis backend".to_string(),
        ));
    }

    if store.key_prefix.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "store.key_prefix must not be empty".to_string(),
        ));
    }

    Ok(())
}
