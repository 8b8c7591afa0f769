//! Simulation type definitions

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{TeamResult, TeamStatus, TeamType};

/// Opaque simulation identifier.
pub type SimulationId = String;

/// Simulation lifecycle: `pending -> analyzing -> {complete | error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Pending,
    Analyzing,
    Complete,
    Error,
}

impl SimulationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SimulationStatus::Pending => "pending",
            SimulationStatus::Analyzing => "analyzing",
            SimulationStatus::Complete => "complete",
            SimulationStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SimulationStatus::Complete | SimulationStatus::Error)
    }
}

impl fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SimulationStatus::Pending),
            "analyzing" => Ok(SimulationStatus::Analyzing),
            "complete" => Ok(SimulationStatus::Complete),
            "error" => Ok(SimulationStatus::Error),
            other => Err(format!("unknown simulation status: {other}")),
        }
    }
}

/// Per-team progress as seen by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub status: TeamStatus,
    pub data: Option<TeamResult>,
}

/// Client-visible view of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub simulation_id: SimulationId,
    /// `None` when the store has never seen this simulation.
    pub status: Option<SimulationStatus>,
    #[serde(default)]
    pub frames: Vec<String>,
    pub teams: BTreeMap<TeamType, TeamSnapshot>,
}

impl Simulation {
    /// Status label, `unknown` when the simulation was never registered.
    pub fn status_label(&self) -> &'static str {
        self.status.map(SimulationStatus::as_str).unwrap_or("unknown")
    }

    pub fn is_complete(&self) -> bool {
        self.status == Some(SimulationStatus::Complete)
    }

    /// `{simulation_id, status, teams: {team: {status, data}}}` view for clients.
    pub fn to_value(&self) -> Value {
        let teams: Map<String, Value> = TeamType::EXECUTION_ORDER
            .iter()
            .map(|team| {
                let snapshot = self.teams.get(team).cloned().unwrap_or_default();
                (
                    team.to_string(),
                    json!({
                        "status": snapshot.status.as_str(),
                        "data": snapshot.data.map(Value::Object),
                    }),
                )
            })
            .collect();
        json!({
            "simulation_id": self.simulation_id,
            "status": self.status_label(),
            "teams": teams,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_simulation_renders_unknown_and_waiting() {
        let simulation = Simulation {
            simulation_id: "sim-x".to_string(),
            status: None,
            frames: Vec::new(),
            teams: BTreeMap::new(),
        };
        let value = simulation.to_value();
        assert_eq!(value["status"], "unknown");
        assert_eq!(value["teams"]["personnel"]["status"], "waiting");
        assert!(value["teams"]["fire_severity"]["data"].is_null());
    }
}
