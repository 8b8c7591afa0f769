use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::RiskLevel;

/// Per-room hazard breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRisk {
    pub fire_risk: f64,
    pub structural_risk: f64,
    pub smoke_risk: f64,
    pub combined_risk: f64,
}

impl RoomRisk {
    pub fn new(fire_risk: f64, structural_risk: f64, smoke_risk: f64) -> Self {
        Self {
            fire_risk,
            structural_risk,
            smoke_risk,
            combined_risk: fire_risk.max(structural_risk).max(smoke_risk),
        }
    }

    /// Copy with every component rounded to `places` decimals.
    pub fn rounded(&self, places: i32) -> Self {
        let round = |v: f64| crate::metrics::round_to(v, places);
        Self {
            fire_risk: round(self.fire_risk),
            structural_risk: round(self.structural_risk),
            smoke_risk: round(self.smoke_risk),
            combined_risk: round(self.combined_risk),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CivilianRoute {
    pub route_id: String,
    pub path: Vec<String>,
    pub risk_level: RiskLevel,
    pub estimated_time_seconds: u32,
    #[serde(default)]
    pub hazards: Vec<String>,
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirefighterRoute {
    pub route_id: String,
    pub path: Vec<String>,
    pub risk_level: RiskLevel,
    pub objective: String,
    #[serde(default)]
    pub equipment_needed: Vec<String>,
    pub recommended: bool,
}

/// Output of the evacuation team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvacuationPlan {
    #[serde(default)]
    pub civilian_exits: Vec<CivilianRoute>,
    #[serde(default)]
    pub firefighter_entries: Vec<FirefighterRoute>,
    #[serde(default)]
    pub risk_scores: BTreeMap<String, RoomRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}
