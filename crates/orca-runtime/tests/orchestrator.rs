use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use orca_core::store::{InstanceRecord, StateStore, StoreError};
use orca_core::types::{SimulationStatus, TeamResult, TeamStatus, TeamType};
use orca_runtime::{
    OfflineVisionBackend, Orchestrator, RunMode, StaticVisionBackend, TeamAnalyzer, TeamSchedule,
};
use orca_stores::InMemoryStateStore;

fn schedule(instances: usize) -> TeamSchedule {
    TeamSchedule {
        instances_per_team: instances,
        poll_interval: Duration::from_millis(500),
        upstream_timeout: Duration::from_secs(30),
    }
}

fn offline_orchestrator(store: Arc<dyn StateStore>, instances: usize) -> Orchestrator {
    let analyzer = Arc::new(TeamAnalyzer::new(Arc::new(OfflineVisionBackend)));
    Orchestrator::with_schedule(store, analyzer, schedule(instances))
}

#[tokio::test(start_paused = true)]
async fn hybrid_run_completes_every_team() {
    let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    let orchestrator = offline_orchestrator(store.clone(), 3);
    let frames = vec!["frame_0.jpg".to_string(), "frame_1.jpg".to_string()];

    let simulation_id = orchestrator.register_simulation(&frames).await.unwrap();
    assert_eq!(
        store.status(&simulation_id).await.unwrap(),
        Some(SimulationStatus::Pending)
    );

    let results = orchestrator
        .run_simulation(&simulation_id, &frames)
        .await
        .unwrap();
    assert_eq!(results.len(), 4);

    let structural = &results[&TeamType::Structural];
    assert_eq!(structural["fire_context_used"], true);

    let evacuation = &results[&TeamType::Evacuation];
    assert_eq!(evacuation["fire_context_used"], true);
    assert_eq!(evacuation["structural_context_used"], true);
    assert!(evacuation["civilian_exits"].as_array().is_some());

    let personnel = &results[&TeamType::Personnel];
    assert_eq!(
        personnel["context_sources"],
        json!({"fire_severity_used": true, "structural_used": true, "evacuation_used": true})
    );
    assert_eq!(
        personnel["consensus_metadata"]["num_instances"],
        json!(6)
    );

    let simulation = orchestrator
        .get_simulation_results(&simulation_id)
        .await
        .unwrap();
    assert!(simulation.is_complete());
    assert_eq!(simulation.frames, frames);
    for team in TeamType::EXECUTION_ORDER {
        let snapshot = &simulation.teams[&team];
        assert_eq!(snapshot.status, TeamStatus::Complete);
        assert_eq!(snapshot.data.as_ref(), Some(&results[&team]));
    }

    let active = orchestrator
        .active_simulation(&simulation_id)
        .await
        .unwrap();
    assert_eq!(active.status, SimulationStatus::Complete);
    assert_eq!(active.mode, RunMode::HybridParallel);
    assert!(active.completed_at.is_some());
}

#[tokio::test]
async fn unknown_simulation_reports_unknown_and_waiting() {
    let orchestrator = offline_orchestrator(Arc::new(InMemoryStateStore::new()), 1);
    let simulation = orchestrator.get_simulation_results("missing").await.unwrap();

    let value = simulation.to_value();
    assert_eq!(value["status"], "unknown");
    for team in TeamType::EXECUTION_ORDER {
        assert_eq!(value["teams"][team.as_str()]["status"], "waiting");
        assert_eq!(value["teams"][team.as_str()]["data"], Value::Null);
    }
}

#[tokio::test(start_paused = true)]
async fn cleanup_removes_stored_state() {
    let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    let orchestrator = offline_orchestrator(store.clone(), 1);
    let frames = vec!["frame_0.jpg".to_string()];
    orchestrator.run_simulation("sim-clean", &frames).await.unwrap();

    assert!(orchestrator.cleanup_simulation("sim-clean").await.unwrap());
    assert_eq!(store.status("sim-clean").await.unwrap(), None);
    assert!(store.team_results("sim-clean").await.unwrap().is_empty());
    assert!(orchestrator.active_simulation("sim-clean").await.is_none());
    assert!(!orchestrator.cleanup_simulation("sim-clean").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn watcher_follows_run_to_completion() {
    let store = Arc::new(InMemoryStateStore::new());
    let mut feed = store.watch("sim-watch");
    let orchestrator = offline_orchestrator(store.clone(), 2);

    orchestrator
        .run_simulation("sim-watch", &["frame_0.jpg".to_string()])
        .await
        .unwrap();

    let mut published = Vec::new();
    while let Some(event) = feed.next().await {
        if event.event == "status" && event.data == json!("complete") {
            break;
        }
        if TeamType::EXECUTION_ORDER
            .iter()
            .any(|team| event.event == team.as_str())
        {
            published.push(event.event);
        }
    }
    assert_eq!(published.len(), 4);
    assert_eq!(feed.missed(), 0);
}

#[tokio::test]
async fn sequential_analysis_chains_context() {
    let fire = json!({
        "severity": 9,
        "fire_locations": [
            {"label": "Room 201", "intensity": 0.9},
            {"label": "Room 202", "intensity": 0.8},
            {"label": "Hallway B", "intensity": 0.5}
        ],
        "fuel_sources": [
            {"material": "furniture", "flammability": "high", "location_label": "Room 201"}
        ]
    });
    let structural = json!({"integrity_score": 4, "collapse_risk": "high"});
    let backend = StaticVisionBackend::new()
        .with_result(TeamType::FireSeverity, fire.as_object().unwrap().clone())
        .with_result(TeamType::Structural, structural.as_object().unwrap().clone());
    let analyzer = Arc::new(TeamAnalyzer::new(Arc::new(backend)));
    let orchestrator = Orchestrator::new(Arc::new(InMemoryStateStore::new()), analyzer);

    let analysis = orchestrator.run_full_analysis("sim-seq", "frame_0").await;

    assert_eq!(analysis.teams.len(), 4);
    let personnel = &analysis.teams[&TeamType::Personnel];
    assert!(personnel["alarm_level"].as_u64().unwrap() >= 4);
    assert!(personnel["firefighters"].as_u64().unwrap() >= 28);

    let room_201 = analysis
        .spread_timeline
        .iter()
        .find(|entry| entry.room == "Room 201")
        .unwrap();
    assert_eq!(room_201.current_intensity, 0.9);
    assert_eq!(room_201.time_to_danger_min, Some(0));

    let active = orchestrator.active_simulation("sim-seq").await.unwrap();
    assert_eq!(active.mode, RunMode::Sequential);
    assert_eq!(active.status, SimulationStatus::Complete);
    assert!(active.completed_at.is_some());
}

/// Store that never reveals the structural result, as if that team stalled.
struct StalledStructuralStore {
    inner: InMemoryStateStore,
}

#[async_trait]
impl StateStore for StalledStructuralStore {
    async fn set_status(&self, id: &str, status: SimulationStatus) -> Result<(), StoreError> {
        self.inner.set_status(id, status).await
    }

    async fn status(&self, id: &str) -> Result<Option<SimulationStatus>, StoreError> {
        self.inner.status(id).await
    }

    async fn set_frames(&self, id: &str, frames: &[String]) -> Result<(), StoreError> {
        self.inner.set_frames(id, frames).await
    }

    async fn frames(&self, id: &str) -> Result<Vec<String>, StoreError> {
        self.inner.frames(id).await
    }

    async fn set_team_result(
        &self,
        id: &str,
        team: TeamType,
        result: &TeamResult,
    ) -> Result<(), StoreError> {
        self.inner.set_team_result(id, team, result).await
    }

    async fn team_result(
        &self,
        id: &str,
        team: TeamType,
    ) -> Result<Option<TeamResult>, StoreError> {
        if team == TeamType::Structural {
            return Ok(None);
        }
        self.inner.team_result(id, team).await
    }

    async fn set_team_status(
        &self,
        id: &str,
        team: TeamType,
        status: TeamStatus,
    ) -> Result<(), StoreError> {
        self.inner.set_team_status(id, team, status).await
    }

    async fn team_statuses(
        &self,
        id: &str,
    ) -> Result<std::collections::BTreeMap<TeamType, TeamStatus>, StoreError> {
        self.inner.team_statuses(id).await
    }

    async fn push_instance_result(
        &self,
        id: &str,
        team: TeamType,
        record: &InstanceRecord,
    ) -> Result<usize, StoreError> {
        self.inner.push_instance_result(id, team, record).await
    }

    async fn instance_results(
        &self,
        id: &str,
        team: TeamType,
    ) -> Result<Vec<InstanceRecord>, StoreError> {
        self.inner.instance_results(id, team).await
    }

    async fn clear_instance_results(&self, id: &str, team: TeamType) -> Result<(), StoreError> {
        self.inner.clear_instance_results(id, team).await
    }

    async fn cleanup(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.cleanup(id).await
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_upstream_times_out_and_completes() {
    let store: Arc<dyn StateStore> = Arc::new(StalledStructuralStore {
        inner: InMemoryStateStore::new(),
    });
    let orchestrator = offline_orchestrator(store.clone(), 2);
    let frames = vec!["frame_0.jpg".to_string()];

    let started = tokio::time::Instant::now();
    let results = orchestrator
        .run_simulation("sim-stall", &frames)
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_secs(30));

    let evacuation = &results[&TeamType::Evacuation];
    assert_eq!(evacuation["fire_context_used"], true);
    assert_eq!(evacuation["structural_context_used"], false);

    let personnel = &results[&TeamType::Personnel];
    assert_eq!(personnel["context_sources"]["structural_used"], false);
    assert_eq!(personnel["context_sources"]["fire_severity_used"], true);

    let statuses = store.team_statuses("sim-stall").await.unwrap();
    assert!(statuses.values().all(|status| *status == TeamStatus::Complete));
    assert_eq!(
        store.status("sim-stall").await.unwrap(),
        Some(SimulationStatus::Complete)
    );
}

#[derive(Clone, Copy, PartialEq)]
enum BrokenWrite {
    PersonnelResult,
    CompleteStatus,
}

/// Store that rejects one kind of write.
struct BrokenPublishStore {
    inner: InMemoryStateStore,
    broken: BrokenWrite,
}

impl BrokenPublishStore {
    fn new(broken: BrokenWrite) -> Self {
        Self {
            inner: InMemoryStateStore::new(),
            broken,
        }
    }
}

#[async_trait]
impl StateStore for BrokenPublishStore {
    async fn set_status(&self, id: &str, status: SimulationStatus) -> Result<(), StoreError> {
        if self.broken == BrokenWrite::CompleteStatus && status == SimulationStatus::Complete {
            return Err(StoreError::Connection("connection reset".to_string()));
        }
        self.inner.set_status(id, status).await
    }

    async fn status(&self, id: &str) -> Result<Option<SimulationStatus>, StoreError> {
        self.inner.status(id).await
    }

    async fn set_frames(&self, id: &str, frames: &[String]) -> Result<(), StoreError> {
        self.inner.set_frames(id, frames).await
    }

    async fn frames(&self, id: &str) -> Result<Vec<String>, StoreError> {
        self.inner.frames(id).await
    }

    async fn set_team_result(
        &self,
        id: &str,
        team: TeamType,
        result: &TeamResult,
    ) -> Result<(), StoreError> {
        if self.broken == BrokenWrite::PersonnelResult && team == TeamType::Personnel {
            return Err(StoreError::Connection("connection reset".to_string()));
        }
        self.inner.set_team_result(id, team, result).await
    }

    async fn team_result(
        &self,
        id: &str,
        team: TeamType,
    ) -> Result<Option<TeamResult>, StoreError> {
        self.inner.team_result(id, team).await
    }

    async fn set_team_status(
        &self,
        id: &str,
        team: TeamType,
        status: TeamStatus,
    ) -> Result<(), StoreError> {
        self.inner.set_team_status(id, team, status).await
    }

    async fn team_statuses(
        &self,
        id: &str,
    ) -> Result<std::collections::BTreeMap<TeamType, TeamStatus>, StoreError> {
        self.inner.team_statuses(id).await
    }

    async fn push_instance_result(
        &self,
        id: &str,
        team: TeamType,
        record: &InstanceRecord,
    ) -> Result<usize, StoreError> {
        self.inner.push_instance_result(id, team, record).await
    }

    async fn instance_results(
        &self,
        id: &str,
        team: TeamType,
    ) -> Result<Vec<InstanceRecord>, StoreError> {
        self.inner.instance_results(id, team).await
    }

    async fn clear_instance_results(&self, id: &str, team: TeamType) -> Result<(), StoreError> {
        self.inner.clear_instance_results(id, team).await
    }

    async fn cleanup(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.cleanup(id).await
    }
}

#[tokio::test(start_paused = true)]
async fn team_failure_marks_simulation_error() {
    let store: Arc<dyn StateStore> = Arc::new(BrokenPublishStore::new(BrokenWrite::PersonnelResult));
    let orchestrator = offline_orchestrator(store.clone(), 1);

    let err = orchestrator
        .run_simulation("sim-broken", &["frame_0.jpg".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("personnel"));

    assert_eq!(
        store.status("sim-broken").await.unwrap(),
        Some(SimulationStatus::Error)
    );
    let active = orchestrator.active_simulation("sim-broken").await.unwrap();
    assert_eq!(active.status, SimulationStatus::Error);
    assert!(active.error.is_some());

    let other = offline_orchestrator(Arc::new(InMemoryStateStore::new()), 1);
    assert!(other
        .run_simulation("sim-ok", &["frame_0.jpg".to_string()])
        .await
        .is_ok());
}

#[tokio::test(start_paused = true)]
async fn failed_completion_write_is_recorded_as_error() {
    let store: Arc<dyn StateStore> = Arc::new(BrokenPublishStore::new(BrokenWrite::CompleteStatus));
    let orchestrator = offline_orchestrator(store.clone(), 1);

    let err = orchestrator
        .run_simulation("sim-final", &["frame_0.jpg".to_string()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("connection reset"));

    let active = orchestrator.active_simulation("sim-final").await.unwrap();
    assert_eq!(active.status, SimulationStatus::Error);
    assert!(active.completed_at.is_some());
    assert_eq!(
        store.status("sim-final").await.unwrap(),
        Some(SimulationStatus::Error)
    );
}
