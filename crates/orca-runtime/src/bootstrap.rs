//! Bootstrap helpers for starting ORCA from a single YAML config.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use orca_config::{load_config, validate_config, ConfigError, ObservabilityConfig, OrcaConfig, StoreSpec};
use orca_core::building::layout;
use orca_core::error::RequestError;
use orca_core::metrics::MetricsEngine;
use orca_core::store::{StateStore, StoreError};
use orca_stores::{BroadcastEventBus, EventBus, InMemoryStateStore, RedisStateStore};

use crate::analyzer::TeamAnalyzer;
use crate::backend::VisionBackend;
use crate::orchestrator::Orchestrator;
use crate::team::TeamSchedule;

/// Runtime bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("layout error: {0}")]
    Layout(#[from] RequestError),
    #[error("unsupported store backend: {0}")]
    UnsupportedBackend(String),
}

/// Running app bundle created from unified config.
pub struct RuntimeApp {
    pub config: OrcaConfig,
    pub orchestrator: Orchestrator,
    pub metrics: MetricsEngine,
    pub event_bus: Arc<dyn EventBus>,
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();

impl RuntimeApp {
    /// Create a runnable app from a single `orca.yaml`.
    pub fn from_config_path(
        path: impl AsRef<Path>,
        backend: Arc<dyn VisionBackend>,
    ) -> Result<Self, BootstrapError> {
        let config = load_config(path.as_ref())?;
        Self::from_config(config, backend)
    }

    /// Create a runnable app from an already loaded config.
    pub fn from_config(
        config: OrcaConfig,
        backend: Arc<dyn VisionBackend>,
    ) -> Result<Self, BootstrapError> {
        validate_config(&config)?;
        init_tracing_if_needed(&config.observability);

        let (store, event_bus) = build_store(&config.store)?;
        let analyzer = Arc::new(TeamAnalyzer::with_layout(
            backend,
            layout::by_name(&config.simulation.layout)?,
        ));
        let orchestrator = Orchestrator::with_schedule(
            store,
            analyzer,
            TeamSchedule::from(&config.orchestrator),
        );
        let metrics = MetricsEngine::new(layout::by_name(&config.metrics.layout)?)?
            .with_defaults(config.metrics.origin.clone(), config.metrics.destination.clone())
            .with_survivability_horizon(config.simulation.survivability_horizon_minutes);

        tracing::info!(
            app = %config.app.name,
            environment = %config.app.environment,
            store = %config.store.backend,
            simulation_layout = %config.simulation.layout,
            metrics_layout = %config.metrics.layout,
            "runtime bootstrapped"
        );

        Ok(Self {
            config,
            orchestrator,
            metrics,
            event_bus,
        })
    }
}

fn build_store(
    spec: &StoreSpec,
) -> Result<(Arc<dyn StateStore>, Arc<dyn EventBus>), BootstrapError> {
    let bus: Arc<dyn EventBus> = Arc::new(BroadcastEventBus::new(spec.event_capacity));
    match spec.backend.as_str() {
        "in_memory" => Ok((Arc::new(InMemoryStateStore::with_bus(bus.clone())), bus)),
        "redis" => {
            let url = spec.connection_url.as_deref().ok_or_else(|| {
                ConfigError::Invalid("store.connection_url is required for redis".to_string())
            })?;
            let store = RedisStateStore::with_bus(url, spec.key_prefix.clone(), bus.clone())?;
            Ok((Arc::new(store), bus))
        }
        other => Err(BootstrapError::UnsupportedBackend(other.to_string())),
    }
}

/// Install the global subscriber once. Later calls are no-ops.
pub fn init_tracing_if_needed(observability: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let log_file_path = std::env::var("ORCA_LOG_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| observability.log_file.clone());
        let file_writer = log_file_path.as_deref().and_then(create_log_writer);
        let fallback_level = match observability.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        };

        let make_filter = || {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        };
        let span_events = if observability.traces_enabled {
            tracing_subscriber::fmt::format::FmtSpan::NEW
                | tracing_subscriber::fmt::format::FmtSpan::CLOSE
        } else {
            tracing_subscriber::fmt::format::FmtSpan::NONE
        };

        match file_writer {
            Some(writer) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(make_filter())
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_span_events(span_events)
                    .try_init();
            }
            None => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(make_filter())
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_span_events(span_events)
                    .try_init();
            }
        }

        tracing::info!(
            log_level = %observability.log_level,
            traces_enabled = observability.traces_enabled,
            log_file = log_file_path.as_deref().unwrap_or("(stderr)"),
            "tracing initialized"
        );
    });
}

fn create_log_writer(path: &str) -> Option<SharedFileMakeWriter> {
    use std::fs::{create_dir_all, OpenOptions};

    let file_path = Path::new(path);
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = create_dir_all(parent) {
                eprintln!(
                    "failed to create log directory '{}': {}",
                    parent.display(),
                    err
                );
                return None;
            }
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(file_path) {
        Ok(f) => f,
        Err(err) => {
            eprintln!("failed to open log file '{}': {}", file_path.display(), err);
            return None;
        }
    };
    Some(SharedFileMakeWriter::new(file))
}

#[derive(Clone)]
struct SharedFileMakeWriter {
    file: Arc<std::sync::Mutex<std::fs::File>>,
}

impl SharedFileMakeWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

struct SharedFileWriter {
    file: Arc<std::sync::Mutex<std::fs::File>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedFileMakeWriter {
    type Writer = SharedFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileWriter {
            file: self.file.clone(),
        }
    }
}

impl std::io::Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("log file mutex poisoned"))?;
        std::io::Write::write(&mut *file, buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("log file mutex poisoned"))?;
        std::io::Write::flush(&mut *file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OfflineVisionBackend;

    #[test]
    fn test_from_config_builds_in_memory_runtime() {
        let app = RuntimeApp::from_config(OrcaConfig::default(), Arc::new(OfflineVisionBackend))
            .expect("bootstrap");
        assert_eq!(app.orchestrator.schedule().instances_per_team, 3);
        assert_eq!(app.metrics.resolve_origin(None), "Lobby");
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let mut config = OrcaConfig::default();
        config.simulation.layout = "atlantis".to_string();
        let result = RuntimeApp::from_config(config, Arc::new(OfflineVisionBackend));
        assert!(matches!(result, Err(BootstrapError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_from_config_path_reads_yaml() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "orchestrator:\n  instances_per_team: 1\nmetrics:\n  layout: demo_floor\n  destination: Room 302"
        )
        .expect("write config");

        let app = RuntimeApp::from_config_path(file.path(), Arc::new(OfflineVisionBackend))
            .expect("bootstrap");
        assert_eq!(app.orchestrator.schedule().instances_per_team, 1);
        assert_eq!(app.metrics.rooms().len(), 12);
    }
}
