//! StateStore trait
//!
//! Every team only ever writes its own keys, so the contract needs plain
//! set/get per key plus an append-only list for instance results. No
//! transactions or locks.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StoreError;
use crate::types::{SimulationStatus, TeamResult, TeamStatus, TeamType};

/// One recorded per-instance result, kept for consensus auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_id: String,
    pub result: TeamResult,
}

/// Change notification published on every store write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    pub simulation_id: String,
    /// `status | frames | <team> | team_status:<team>`
    pub event: String,
    pub data: Value,
}

impl SimulationEvent {
    pub fn new(simulation_id: impl Into<String>, event: impl Into<String>, data: Value) -> Self {
        Self {
            simulation_id: simulation_id.into(),
            event: event.into(),
            data,
        }
    }

    pub fn status(simulation_id: &str, status: SimulationStatus) -> Self {
        Self::new(simulation_id, "status", Value::String(status.to_string()))
    }

    pub fn frames(simulation_id: &str, frames: &[String]) -> Self {
        Self::new(
            simulation_id,
            "frames",
            Value::Array(frames.iter().cloned().map(Value::String).collect()),
        )
    }

    pub fn team_result(simulation_id: &str, team: TeamType, result: &TeamResult) -> Self {
        Self::new(simulation_id, team.as_str(), Value::Object(result.clone()))
    }

    pub fn team_status(simulation_id: &str, team: TeamType, status: TeamStatus) -> Self {
        Self::new(
            simulation_id,
            format!("team_status:{}", team),
            Value::String(status.to_string()),
        )
    }
}

/// StateStore trait - async interface for shared simulation state.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn set_status(
        &self,
        simulation_id: &str,
        status: SimulationStatus,
    ) -> Result<(), StoreError>;

    /// `Ok(None)` when the simulation is unknown.
    async fn status(&self, simulation_id: &str) -> Result<Option<SimulationStatus>, StoreError>;

    async fn set_frames(&self, simulation_id: &str, frames: &[String]) -> Result<(), StoreError>;

    async fn frames(&self, simulation_id: &str) -> Result<Vec<String>, StoreError>;

    /// Publish a team's consensus result.
    async fn set_team_result(
        &self,
        simulation_id: &str,
        team: TeamType,
        result: &TeamResult,
    ) -> Result<(), StoreError>;

    async fn team_result(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<Option<TeamResult>, StoreError>;

    async fn set_team_status(
        &self,
        simulation_id: &str,
        team: TeamType,
        status: TeamStatus,
    ) -> Result<(), StoreError>;

    /// Statuses of every team; teams never written report `waiting`.
    async fn team_statuses(
        &self,
        simulation_id: &str,
    ) -> Result<BTreeMap<TeamType, TeamStatus>, StoreError>;

    /// Append an instance result, returning the new list length.
    async fn push_instance_result(
        &self,
        simulation_id: &str,
        team: TeamType,
        record: &InstanceRecord,
    ) -> Result<usize, StoreError>;

    async fn instance_results(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<Vec<InstanceRecord>, StoreError>;

    async fn clear_instance_results(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<(), StoreError>;

    /// Remove every key of a simulation. Returns true if anything existed.
    async fn cleanup(&self, simulation_id: &str) -> Result<bool, StoreError>;

    /// Consensus results of every team that has published one.
    async fn team_results(
        &self,
        simulation_id: &str,
    ) -> Result<BTreeMap<TeamType, TeamResult>, StoreError> {
        let mut results = BTreeMap::new();
        for team in TeamType::EXECUTION_ORDER {
            if let Some(result) = self.team_result(simulation_id, team).await? {
                results.insert(team, result);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_status_event_name() {
        let event =
            SimulationEvent::team_status("sim-1", TeamType::Evacuation, TeamStatus::Processing);
        assert_eq!(event.event, "team_status:evacuation");
        assert_eq!(event.data, Value::String("processing".to_string()));
    }
}
