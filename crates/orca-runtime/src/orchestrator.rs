//! Orchestrator - runs the four teams of a simulation
//!
//! All teams are spawned at once; the store is the only synchronization
//! point between them. A sequential single-frame path is kept for
//! request/response callers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use orca_core::fire::{build_spread_timeline, SpreadTimelineEntry};
use orca_core::reports::FireSeverityReport;
use orca_core::store::{StateStore, StoreError};
use orca_core::types::{
    Simulation, SimulationStatus, TeamResult, TeamSnapshot, TeamStatus, TeamType,
    UpstreamContext,
};

use crate::analyzer::TeamAnalyzer;
use crate::team::{Team, TeamSchedule};

/// Orchestrator errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("team {team} failed: {message}")]
    TeamFailed { team: TeamType, message: String },
    #[error("team task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    HybridParallel,
    Sequential,
}

/// Registry entry for a simulation this orchestrator has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSimulation {
    pub status: SimulationStatus,
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ActiveSimulation {
    fn started(mode: RunMode) -> Self {
        Self {
            status: SimulationStatus::Analyzing,
            mode,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// Output of the sequential single-frame path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullAnalysis {
    pub simulation_id: String,
    pub frame_id: String,
    pub timestamp: String,
    pub teams: BTreeMap<TeamType, TeamResult>,
    pub spread_timeline: Vec<SpreadTimelineEntry>,
}

pub struct Orchestrator {
    store: Arc<dyn StateStore>,
    analyzer: Arc<TeamAnalyzer>,
    schedule: TeamSchedule,
    active: RwLock<HashMap<String, ActiveSimulation>>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn StateStore>, analyzer: Arc<TeamAnalyzer>) -> Self {
        Self::with_schedule(store, analyzer, TeamSchedule::default())
    }

    pub fn with_schedule(
        store: Arc<dyn StateStore>,
        analyzer: Arc<TeamAnalyzer>,
        schedule: TeamSchedule,
    ) -> Self {
        Self {
            store,
            analyzer,
            schedule,
            active: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn schedule(&self) -> TeamSchedule {
        self.schedule
    }

    /// Create a pending simulation for `frames` and return its id.
    pub async fn register_simulation(&self, frames: &[String]) -> Result<String, StoreError> {
        let simulation_id = uuid::Uuid::new_v4().to_string();
        self.store
            .set_status(&simulation_id, SimulationStatus::Pending)
            .await?;
        self.store.set_frames(&simulation_id, frames).await?;
        tracing::info!(simulation_id = %simulation_id, frames = frames.len(), "simulation registered");
        Ok(simulation_id)
    }

    /// Run all four teams concurrently and return their consensus results.
    ///
    /// The simulation ends `complete` once every team has published, or
    /// `error` if a team task fails or panics.
    pub async fn run_simulation(
        &self,
        simulation_id: &str,
        frames: &[String],
    ) -> Result<BTreeMap<TeamType, TeamResult>, OrchestratorError> {
        tracing::info!(
            simulation_id = %simulation_id,
            frames = frames.len(),
            instances_per_team = self.schedule.instances_per_team,
            "starting hybrid parallel run"
        );
        self.active.write().await.insert(
            simulation_id.to_string(),
            ActiveSimulation::started(RunMode::HybridParallel),
        );

        let outcome = self.run_teams(simulation_id, frames).await;
        match outcome {
            Ok(results) => {
                self.finish(simulation_id, SimulationStatus::Complete, None)
                    .await;
                tracing::info!(simulation_id = %simulation_id, "simulation complete");
                Ok(results)
            }
            Err(e) => {
                tracing::error!(simulation_id = %simulation_id, error = %e, "simulation failed");
                if let Err(store_err) = self
                    .store
                    .set_status(simulation_id, SimulationStatus::Error)
                    .await
                {
                    tracing::warn!(
                        simulation_id = %simulation_id,
                        error = %store_err,
                        "failed to record simulation error"
                    );
                }
                self.finish(simulation_id, SimulationStatus::Error, Some(e.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    async fn run_teams(
        &self,
        simulation_id: &str,
        frames: &[String],
    ) -> Result<BTreeMap<TeamType, TeamResult>, OrchestratorError> {
        self.store
            .set_status(simulation_id, SimulationStatus::Analyzing)
            .await?;
        self.store.set_frames(simulation_id, frames).await?;
        for team in TeamType::EXECUTION_ORDER {
            self.store
                .set_team_status(simulation_id, team, TeamStatus::Processing)
                .await?;
        }

        let handles = TeamType::EXECUTION_ORDER.map(|team_type| {
            let mut team = Team::new(team_type, self.analyzer.clone(), self.schedule);
            let store = self.store.clone();
            let simulation_id = simulation_id.to_string();
            let frames = frames.to_vec();
            tokio::spawn(async move {
                team.run_hybrid(store.as_ref(), &simulation_id, &frames)
                    .await
            })
        });

        let mut results = BTreeMap::new();
        for (team, joined) in TeamType::EXECUTION_ORDER.into_iter().zip(join_all(handles).await) {
            let result = joined?.map_err(|e| OrchestratorError::TeamFailed {
                team,
                message: e.to_string(),
            })?;
            results.insert(team, result);
        }
        self.store
            .set_status(simulation_id, SimulationStatus::Complete)
            .await?;
        Ok(results)
    }

    async fn finish(&self, simulation_id: &str, status: SimulationStatus, error: Option<String>) {
        if let Some(entry) = self.active.write().await.get_mut(simulation_id) {
            entry.status = status;
            entry.completed_at = Some(Utc::now());
            entry.error = error;
        }
    }

    /// Run the four stages one after another on a single frame.
    ///
    /// One instance, no consensus, no store writes. Each stage receives the
    /// full results of every earlier stage. The run is still tracked in the
    /// active-simulation registry.
    pub async fn run_full_analysis(&self, simulation_id: &str, frame: &str) -> FullAnalysis {
        tracing::info!(simulation_id = %simulation_id, frame = %frame, "starting sequential analysis");
        self.active.write().await.insert(
            simulation_id.to_string(),
            ActiveSimulation::started(RunMode::Sequential),
        );
        let mut context = UpstreamContext::new();
        for team in TeamType::EXECUTION_ORDER {
            let result = self.analyzer.analyze(frame, team, &context).await;
            context.insert(team, result);
        }

        let fire = context.fire_severity().unwrap_or_else(FireSeverityReport::default);
        let spread_timeline = build_spread_timeline(&fire, Some(self.analyzer.rooms()));
        self.finish(simulation_id, SimulationStatus::Complete, None)
            .await;

        FullAnalysis {
            simulation_id: simulation_id.to_string(),
            frame_id: frame.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            teams: TeamType::EXECUTION_ORDER
                .into_iter()
                .filter_map(|team| context.get(team).map(|r| (team, r.clone())))
                .collect(),
            spread_timeline,
        }
    }

    /// Client view of a simulation from the store.
    pub async fn get_simulation_results(&self, simulation_id: &str) -> Result<Simulation, StoreError> {
        let status = self.store.status(simulation_id).await?;
        let frames = self.store.frames(simulation_id).await?;
        let statuses = self.store.team_statuses(simulation_id).await?;
        let mut results = self.store.team_results(simulation_id).await?;

        let teams = TeamType::EXECUTION_ORDER
            .into_iter()
            .map(|team| {
                (
                    team,
                    TeamSnapshot {
                        status: statuses.get(&team).copied().unwrap_or_default(),
                        data: results.remove(&team),
                    },
                )
            })
            .collect();

        Ok(Simulation {
            simulation_id: simulation_id.to_string(),
            status,
            frames,
            teams,
        })
    }

    /// Remove every stored key of a simulation and forget it locally.
    pub async fn cleanup_simulation(&self, simulation_id: &str) -> Result<bool, StoreError> {
        let removed = self.store.cleanup(simulation_id).await?;
        let tracked = self.active.write().await.remove(simulation_id).is_some();
        tracing::info!(simulation_id = %simulation_id, removed, "simulation cleaned up");
        Ok(removed || tracked)
    }

    pub async fn active_simulation(&self, simulation_id: &str) -> Option<ActiveSimulation> {
        self.active.read().await.get(simulation_id).cloned()
    }

    pub async fn active_simulations(&self) -> HashMap<String, ActiveSimulation> {
        self.active.read().await.clone()
    }
}
