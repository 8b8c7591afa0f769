//! Types module
//!
//! Core data types for ORCA:
//! - TeamType: the four fixed analysis stages and their dependency table
//! - Simulation: the unit of consensus storage and client-visible progress
//! - TeamResult / UpstreamContext: JSON payloads exchanged between teams

mod simulation;
mod team;

pub use simulation::{Simulation, SimulationId, SimulationStatus, TeamSnapshot};
pub use team::{AgentStatus, TeamStatus, TeamType};

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::reports::{EvacuationPlan, FireSeverityReport, StructuralReport};

/// A team's structured result. Always a JSON object so pass-through fields
/// (`confidence`, `frame_refs`, `phase`, ...) survive every merge step.
pub type TeamResult = Map<String, Value>;

/// Published consensus results of a team's dependencies, keyed by team.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamContext {
    results: BTreeMap<TeamType, TeamResult>,
}

impl UpstreamContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, team: TeamType, result: TeamResult) {
        self.results.insert(team, result);
    }

    pub fn get(&self, team: TeamType) -> Option<&TeamResult> {
        self.results.get(&team)
    }

    pub fn contains(&self, team: TeamType) -> bool {
        self.results.contains_key(&team)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn teams(&self) -> impl Iterator<Item = TeamType> + '_ {
        self.results.keys().copied()
    }

    /// Typed view of the fire severity result, if present and well-formed.
    pub fn fire_severity(&self) -> Option<FireSeverityReport> {
        self.typed(TeamType::FireSeverity)
    }

    /// Typed view of the structural result, if present and well-formed.
    pub fn structural(&self) -> Option<StructuralReport> {
        self.typed(TeamType::Structural)
    }

    /// Typed view of the evacuation result, if present and well-formed.
    pub fn evacuation(&self) -> Option<EvacuationPlan> {
        self.typed(TeamType::Evacuation)
    }

    fn typed<T: DeserializeOwned>(&self, team: TeamType) -> Option<T> {
        let result = self.results.get(&team)?;
        match serde_json::from_value(Value::Object(result.clone())) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(team = %team, error = %e, "upstream result does not match schema");
                None
            }
        }
    }

    /// Render as a `{team: result}` JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.results
                .iter()
                .map(|(team, result)| (team.to_string(), Value::Object(result.clone())))
                .collect(),
        )
    }
}

impl FromIterator<(TeamType, TeamResult)> for UpstreamContext {
    fn from_iter<I: IntoIterator<Item = (TeamType, TeamResult)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

/// Serialize any report into a [`TeamResult`] object.
pub fn to_team_result<T: serde::Serialize>(report: &T) -> TeamResult {
    match serde_json::to_value(report) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize team report");
            Map::new()
        }
    }
}
