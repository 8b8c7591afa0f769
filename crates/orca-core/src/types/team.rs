//! Team definitions
//!
//! The dependency graph is small and fixed. Each stage depends on every
//! stage before it in [`TeamType::EXECUTION_ORDER`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// One of the four analysis stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamType {
    FireSeverity,
    Structural,
    Evacuation,
    Personnel,
}

impl TeamType {
    /// Fixed topological order.
    pub const EXECUTION_ORDER: [TeamType; 4] = [
        TeamType::FireSeverity,
        TeamType::Structural,
        TeamType::Evacuation,
        TeamType::Personnel,
    ];

    pub fn execution_order() -> [TeamType; 4] {
        Self::EXECUTION_ORDER
    }

    /// Teams that must publish before this team can merge.
    pub fn dependencies(self) -> &'static [TeamType] {
        match self {
            TeamType::FireSeverity => &[],
            TeamType::Structural => &[TeamType::FireSeverity],
            TeamType::Evacuation => &[TeamType::FireSeverity, TeamType::Structural],
            TeamType::Personnel => &[
                TeamType::FireSeverity,
                TeamType::Structural,
                TeamType::Evacuation,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TeamType::FireSeverity => "fire_severity",
            TeamType::Structural => "structural",
            TeamType::Evacuation => "evacuation",
            TeamType::Personnel => "personnel",
        }
    }

    /// Whether this stage consults the vision backend.
    pub fn uses_vision(self) -> bool {
        matches!(self, TeamType::FireSeverity | TeamType::Structural)
    }
}

impl fmt::Display for TeamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamType {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fire_severity" => Ok(TeamType::FireSeverity),
            "structural" => Ok(TeamType::Structural),
            "evacuation" => Ok(TeamType::Evacuation),
            "personnel" => Ok(TeamType::Personnel),
            other => Err(RequestError::UnknownTeamType(other.to_string())),
        }
    }
}

/// Team lifecycle: `waiting -> processing -> complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamStatus {
    #[default]
    Waiting,
    Processing,
    Complete,
}

impl TeamStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TeamStatus::Waiting => "waiting",
            TeamStatus::Processing => "processing",
            TeamStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TeamStatus::Waiting),
            "processing" => Ok(TeamStatus::Processing),
            "complete" => Ok(TeamStatus::Complete),
            other => Err(format!("unknown team status: {other}")),
        }
    }
}

/// Status of a single redundant agent instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    AnalyzingIndependent,
    Merging,
    Complete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_are_exactly_prior_stages() {
        for (position, team) in TeamType::EXECUTION_ORDER.iter().enumerate() {
            assert_eq!(
                team.dependencies(),
                &TeamType::EXECUTION_ORDER[..position],
                "{team} must depend on every earlier stage and nothing later"
            );
        }
    }

    #[test]
    fn test_team_type_round_trips_through_str() {
        for team in TeamType::EXECUTION_ORDER {
            assert_eq!(team.as_str().parse::<TeamType>().unwrap(), team);
        }
        assert_eq!(
            "hazmat".parse::<TeamType>(),
            Err(RequestError::UnknownTeamType("hazmat".to_string()))
        );
    }

    #[test]
    fn test_team_type_serde_is_snake_case() {
        let json = serde_json::to_string(&TeamType::FireSeverity).unwrap();
        assert_eq!(json, "\"fire_severity\"");
    }
}
