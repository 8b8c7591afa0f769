//! StateStore in-memory implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;

use orca_core::store::{InstanceRecord, SimulationEvent, StateStore, StoreError};
use orca_core::types::{SimulationStatus, TeamResult, TeamStatus, TeamType};

use crate::event_bus::{BroadcastEventBus, EventBus, SimulationFeed};

#[derive(Debug, Default)]
struct SimulationState {
    status: Option<SimulationStatus>,
    frames: Vec<String>,
    results: BTreeMap<TeamType, TeamResult>,
    team_statuses: BTreeMap<TeamType, TeamStatus>,
    instances: BTreeMap<TeamType, Vec<InstanceRecord>>,
}

/// In-memory implementation for development and testing.
pub struct InMemoryStateStore {
    simulations: RwLock<HashMap<String, SimulationState>>,
    bus: Arc<dyn EventBus>,
}

impl InMemoryStateStore {
    /// Create a new in-memory store with its own broadcast bus.
    pub fn new() -> Self {
        Self::with_bus(Arc::new(BroadcastEventBus::default()))
    }

    /// Create a store publishing change events on `bus`.
    pub fn with_bus(bus: Arc<dyn EventBus>) -> Self {
        Self {
            simulations: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Subscribe to change events of every simulation in this store.
    pub fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.bus.subscribe()
    }

    /// Follow the change events of one simulation.
    pub fn watch(&self, simulation_id: &str) -> SimulationFeed {
        self.bus.watch(simulation_id)
    }

    fn write<R>(
        &self,
        simulation_id: &str,
        f: impl FnOnce(&mut SimulationState) -> R,
    ) -> Result<R, StoreError> {
        let mut simulations = self
            .simulations
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        let state = simulations.entry(simulation_id.to_string()).or_default();
        Ok(f(state))
    }

    fn read<R>(
        &self,
        simulation_id: &str,
        f: impl FnOnce(Option<&SimulationState>) -> R,
    ) -> Result<R, StoreError> {
        let simulations = self
            .simulations
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(f(simulations.get(simulation_id)))
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn set_status(
        &self,
        simulation_id: &str,
        status: SimulationStatus,
    ) -> Result<(), StoreError> {
        self.write(simulation_id, |state| state.status = Some(status))?;
        self.bus
            .publish(SimulationEvent::status(simulation_id, status))
            .await
    }

    async fn status(&self, simulation_id: &str) -> Result<Option<SimulationStatus>, StoreError> {
        self.read(simulation_id, |state| state.and_then(|s| s.status))
    }

    async fn set_frames(&self, simulation_id: &str, frames: &[String]) -> Result<(), StoreError> {
        self.write(simulation_id, |state| state.frames = frames.to_vec())?;
        self.bus
            .publish(SimulationEvent::frames(simulation_id, frames))
            .await
    }

    async fn frames(&self, simulation_id: &str) -> Result<Vec<String>, StoreError> {
        self.read(simulation_id, |state| {
            state.map(|s| s.frames.clone()).unwrap_or_default()
        })
    }

    async fn set_team_result(
        &self,
        simulation_id: &str,
        team: TeamType,
        result: &TeamResult,
    ) -> Result<(), StoreError> {
        self.write(simulation_id, |state| {
            state.results.insert(team, result.clone());
        })?;
        self.bus
            .publish(SimulationEvent::team_result(simulation_id, team, result))
            .await
    }

    async fn team_result(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<Option<TeamResult>, StoreError> {
        self.read(simulation_id, |state| {
            state.and_then(|s| s.results.get(&team).cloned())
        })
    }

    async fn set_team_status(
        &self,
        simulation_id: &str,
        team: TeamType,
        status: TeamStatus,
    ) -> Result<(), StoreError> {
        self.write(simulation_id, |state| {
            state.team_statuses.insert(team, status);
        })?;
        self.bus
            .publish(SimulationEvent::team_status(simulation_id, team, status))
            .await
    }

    async fn team_statuses(
        &self,
        simulation_id: &str,
    ) -> Result<BTreeMap<TeamType, TeamStatus>, StoreError> {
        self.read(simulation_id, |state| {
            TeamType::EXECUTION_ORDER
                .into_iter()
                .map(|team| {
                    let status = state
                        .and_then(|s| s.team_statuses.get(&team).copied())
                        .unwrap_or_default();
                    (team, status)
                })
                .collect()
        })
    }

    async fn push_instance_result(
        &self,
        simulation_id: &str,
        team: TeamType,
        record: &InstanceRecord,
    ) -> Result<usize, StoreError> {
        self.write(simulation_id, |state| {
            let list = state.instances.entry(team).or_default();
            list.push(record.clone());
            list.len()
        })
    }

    async fn instance_results(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<Vec<InstanceRecord>, StoreError> {
        self.read(simulation_id, |state| {
            state
                .and_then(|s| s.instances.get(&team).cloned())
                .unwrap_or_default()
        })
    }

    async fn clear_instance_results(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<(), StoreError> {
        let mut simulations = self
            .simulations
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        if let Some(state) = simulations.get_mut(simulation_id) {
            state.instances.remove(&team);
        }
        Ok(())
    }

    async fn cleanup(&self, simulation_id: &str) -> Result<bool, StoreError> {
        let mut simulations = self
            .simulations
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(simulations.remove(simulation_id).is_some())
    }
}
