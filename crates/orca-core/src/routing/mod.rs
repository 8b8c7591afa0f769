//! Route solver
//!
//! Dijkstra over a per-call copy of the building graph. Unknown endpoints
//! and unreachable destinations are ordinary `blocked` results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::building::{BuildingGraph, Room};
use crate::error::RequestError;
use crate::reports::{FireSeverityReport, RoomRisk, StructuralReport};

/// Risk bucket of a route's worst room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Caution,
    Dangerous,
    Blocked,
}

impl RiskLevel {
    /// `safe < 0.2 <= caution < 0.5 <= dangerous < 0.8 <= blocked`
    pub fn classify(risk: f64) -> Self {
        if risk < 0.2 {
            RiskLevel::Safe
        } else if risk < 0.5 {
            RiskLevel::Caution
        } else if risk < 0.8 {
            RiskLevel::Dangerous
        } else {
            RiskLevel::Blocked
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Caution => "caution",
            RiskLevel::Dangerous => "dangerous",
            RiskLevel::Blocked => "blocked",
        }
    }

    pub fn is_hazardous(self) -> bool {
        matches!(self, RiskLevel::Dangerous | RiskLevel::Blocked)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a route query. `total_cost` is infinite when blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub path: Vec<String>,
    pub total_cost: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub room_risks: BTreeMap<String, RoomRisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouteResult {
    pub fn blocked(error: Option<String>) -> Self {
        Self {
            path: Vec::new(),
            total_cost: f64::INFINITY,
            risk_level: RiskLevel::Blocked,
            room_risks: BTreeMap::new(),
            error,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.path.is_empty()
    }
}

/// Fire-aware shortest-hazard-path solver.
#[derive(Debug, Clone)]
pub struct RouteSolver {
    template: BuildingGraph,
}

impl RouteSolver {
    /// Solver over `rooms`, or the demo floor when `None`.
    pub fn new(rooms: Option<&[Room]>) -> Result<Self, RequestError> {
        Ok(Self {
            template: BuildingGraph::build(rooms)?,
        })
    }

    pub fn from_graph(graph: BuildingGraph) -> Self {
        Self { template: graph }
    }

    pub fn graph(&self) -> &BuildingGraph {
        &self.template
    }

    /// Copy of the template with the given overlays applied.
    pub fn overlaid(
        &self,
        fire: Option<&FireSeverityReport>,
        structural: Option<&StructuralReport>,
    ) -> BuildingGraph {
        let mut graph = self.template.clone();
        if let Some(fire) = fire {
            graph.apply_fire_overlay(fire);
        }
        if let Some(structural) = structural {
            graph.apply_structural_overlay(structural);
        }
        graph
    }

    pub fn solve(
        &self,
        origin: &str,
        destination: &str,
        fire: Option<&FireSeverityReport>,
        structural: Option<&StructuralReport>,
    ) -> RouteResult {
        let graph = self.overlaid(fire, structural);
        solve_on(&graph, origin, destination)
    }

    /// Route from `start` to every exterior room, safest first.
    pub fn find_all_exits(
        &self,
        start: &str,
        fire: Option<&FireSeverityReport>,
        structural: Option<&StructuralReport>,
    ) -> Vec<RouteResult> {
        let graph = self.overlaid(fire, structural);
        let mut routes: Vec<RouteResult> = graph
            .exterior_rooms()
            .into_iter()
            .map(|exit| solve_on(&graph, start, exit))
            .collect();
        routes.sort_by(|a, b| a.total_cost.total_cmp(&b.total_cost));
        routes
    }
}

/// Solve on an already overlaid graph.
pub fn solve_on(graph: &BuildingGraph, origin: &str, destination: &str) -> RouteResult {
    for endpoint in [origin, destination] {
        if !graph.contains(endpoint) {
            tracing::debug!(room = %endpoint, "route endpoint not in graph");
            return RouteResult::blocked(Some(format!("room not found: {endpoint}")));
        }
    }

    let Some((total_cost, path)) = graph.cheapest_path(origin, destination) else {
        return RouteResult::blocked(None);
    };

    let mut room_risks = BTreeMap::new();
    let mut worst = 0.0_f64;
    for name in &path {
        if let Some(room) = graph.room(name) {
            let risk = RoomRisk::new(room.fire_intensity, room.structural_risk, room.smoke_risk);
            worst = worst.max(risk.combined_risk);
            room_risks.insert(name.clone(), risk.rounded(3));
        }
    }

    RouteResult {
        path,
        total_cost: crate::metrics::round_to(total_cost, 3),
        risk_level: RiskLevel::classify(worst),
        room_risks,
        error: None,
    }
}

/// One-shot solve that builds its own graph.
pub fn solve(
    origin: &str,
    destination: &str,
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
    rooms: Option<&[Room]>,
) -> Result<RouteResult, RequestError> {
    Ok(RouteSolver::new(rooms)?.solve(origin, destination, fire, structural))
}
