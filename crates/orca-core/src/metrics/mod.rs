//! Metrics engine
//!
//! Three observables derived from a fire scene:
//! 1. Optimized path: safest route via the route solver
//! 2. Survivability window: minutes until the path becomes impassable
//! 3. Cumulative heat exposure: fire intensity integrated along the path

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::building::{labels_match, layout, FuelLevel, Room};
use crate::error::RequestError;
use crate::fire::{predict, seed_rooms_with_fuel_default};
use crate::reports::{FireSeverityReport, RoomRisk, StructuralReport};
use crate::routing::{RiskLevel, RouteResult, RouteSolver};

pub const DEFAULT_ORIGIN: &str = "Lobby";
pub const DEFAULT_DESTINATION: &str = "1302";
/// Minutes simulated when looking for the survivability window.
pub const SURVIVABILITY_HORIZON_MINUTES: u32 = 30;
/// Weight of smoke in the heat exposure score.
pub const SMOKE_EXPOSURE_FACTOR: f64 = 0.3;

/// Round to `places` decimals; non-finite values pass through.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedPath {
    pub path: Vec<String>,
    pub total_cost: f64,
    pub risk_level: RiskLevel,
    pub room_count: usize,
    #[serde(default)]
    pub room_risks: BTreeMap<String, RoomRisk>,
}

impl From<RouteResult> for OptimizedPath {
    fn from(route: RouteResult) -> Self {
        Self {
            room_count: route.path.len(),
            path: route.path,
            total_cost: route.total_cost,
            risk_level: route.risk_level,
            room_risks: route.room_risks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivabilityWindow {
    /// `None` when the path stays viable past the simulated horizon.
    pub minutes_remaining: Option<u32>,
    pub viable: bool,
    pub worst_room: Option<String>,
    pub worst_room_intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureClass {
    Minimal,
    Moderate,
    Severe,
    Lethal,
}

impl ExposureClass {
    pub fn classify(total: f64) -> Self {
        if total < 0.5 {
            ExposureClass::Minimal
        } else if total < 2.0 {
            ExposureClass::Moderate
        } else if total < 5.0 {
            ExposureClass::Severe
        } else {
            ExposureClass::Lethal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeHeatExposure {
    pub total_score: f64,
    pub classification: ExposureClass,
    #[serde(default)]
    pub per_room: BTreeMap<String, f64>,
}

/// All three metrics for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub optimized_path: OptimizedPath,
    pub survivability: SurvivabilityWindow,
    pub heat_exposure: CumulativeHeatExposure,
}

/// Computes metrics over a fixed layout. Holds no per-scene state.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    rooms: Vec<Room>,
    solver: RouteSolver,
    default_origin: String,
    default_destination: String,
    survivability_horizon: u32,
}

impl MetricsEngine {
    pub fn new(rooms: Vec<Room>) -> Result<Self, RequestError> {
        let solver = RouteSolver::new(Some(rooms.as_slice()))?;
        Ok(Self {
            rooms,
            solver,
            default_origin: DEFAULT_ORIGIN.to_string(),
            default_destination: DEFAULT_DESTINATION.to_string(),
            survivability_horizon: SURVIVABILITY_HORIZON_MINUTES,
        })
    }

    /// Engine over the four-floor academic building.
    pub fn siebel_center() -> Result<Self, RequestError> {
        Self::new(layout::siebel_center())
    }

    pub fn with_defaults(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.default_origin = origin.into();
        self.default_destination = destination.into();
        self
    }

    pub fn with_survivability_horizon(mut self, minutes: u32) -> Self {
        self.survivability_horizon = minutes;
        self
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    fn has_room(&self, name: &str) -> bool {
        self.solver.graph().contains(name)
    }

    /// Requested origin if known, otherwise the default origin.
    pub fn resolve_origin(&self, requested: Option<&str>) -> String {
        match requested {
            Some(origin) if self.has_room(origin) => origin.to_string(),
            _ => self.default_origin.clone(),
        }
    }

    /// Requested destination if known, otherwise the first room matching a
    /// fire location, the default destination, or the first room.
    pub fn resolve_destination(&self, requested: Option<&str>, fire: &FireSeverityReport) -> String {
        if let Some(destination) = requested.filter(|d| self.has_room(d)) {
            return destination.to_string();
        }
        for location in &fire.fire_locations {
            if let Some(room) = self
                .rooms
                .iter()
                .find(|room| labels_match(&room.name, &location.label))
            {
                return room.name.clone();
            }
        }
        if self.has_room(&self.default_destination) {
            return self.default_destination.clone();
        }
        self.rooms
            .first()
            .map(|room| room.name.clone())
            .unwrap_or_else(|| self.default_destination.clone())
    }

    pub fn compute_all(
        &self,
        fire: &FireSeverityReport,
        structural: Option<&StructuralReport>,
        origin: Option<&str>,
        destination: Option<&str>,
    ) -> MetricsSnapshot {
        let origin = self.resolve_origin(origin);
        let destination = self.resolve_destination(destination, fire);
        tracing::debug!(origin = %origin, destination = %destination, "computing metrics");

        let optimized_path =
            self.compute_optimized_path(&origin, &destination, Some(fire), structural);
        let survivability = self.compute_survivability_window(&optimized_path.path, fire);
        let heat_exposure = self.compute_heat_exposure(&optimized_path.path, fire, structural);

        MetricsSnapshot {
            optimized_path,
            survivability,
            heat_exposure,
        }
    }

    pub fn compute_optimized_path(
        &self,
        origin: &str,
        destination: &str,
        fire: Option<&FireSeverityReport>,
        structural: Option<&StructuralReport>,
    ) -> OptimizedPath {
        self.solver
            .solve(origin, destination, fire, structural)
            .into()
    }

    /// Earliest time-to-danger among path rooms.
    ///
    /// The whole layout is simulated so spread from rooms off the path is
    /// still felt; only path rooms are reported. Rooms without a reported
    /// fuel source burn as low fuel here, whatever the layout says.
    pub fn compute_survivability_window(
        &self,
        path: &[String],
        fire: &FireSeverityReport,
    ) -> SurvivabilityWindow {
        if path.is_empty() {
            return SurvivabilityWindow {
                minutes_remaining: Some(0),
                viable: false,
                worst_room: None,
                worst_room_intensity: 0.0,
            };
        }

        let seeded = seed_rooms_with_fuel_default(fire, &self.rooms, FuelLevel::Low);
        let predictions = predict(&seeded, self.survivability_horizon);

        let mut worst_room: Option<String> = None;
        let mut worst_intensity = 0.0_f64;
        let mut earliest_danger: Option<u32> = None;

        for prediction in predictions
            .iter()
            .filter(|p| path.iter().any(|room| *room == p.room))
        {
            if let Some(minute) = prediction.time_to_danger_min {
                if earliest_danger.map_or(true, |earliest| minute < earliest) {
                    earliest_danger = Some(minute);
                    worst_room = Some(prediction.room.clone());
                    worst_intensity = prediction.current_intensity;
                }
            }
            if worst_room.is_none() && prediction.current_intensity > worst_intensity {
                worst_intensity = prediction.current_intensity;
                worst_room = Some(prediction.room.clone());
            }
        }

        SurvivabilityWindow {
            minutes_remaining: earliest_danger,
            viable: earliest_danger.map_or(true, |minutes| minutes > 0),
            worst_room,
            worst_room_intensity: round_to(worst_intensity, 3),
        }
    }

    /// Sum of `fire + 0.3 × smoke` over path rooms after overlays.
    pub fn compute_heat_exposure(
        &self,
        path: &[String],
        fire: &FireSeverityReport,
        structural: Option<&StructuralReport>,
    ) -> CumulativeHeatExposure {
        if path.is_empty() {
            return CumulativeHeatExposure {
                total_score: 0.0,
                classification: ExposureClass::Minimal,
                per_room: BTreeMap::new(),
            };
        }

        let graph = self.solver.overlaid(Some(fire), structural);
        let mut total = 0.0;
        let mut per_room = BTreeMap::new();
        for name in path {
            let Some(room) = graph.room(name) else {
                continue;
            };
            let exposure = room.fire_intensity + room.smoke_risk * SMOKE_EXPOSURE_FACTOR;
            per_room.insert(name.clone(), round_to(exposure, 3));
            total += exposure;
        }

        let total = round_to(total, 3);
        CumulativeHeatExposure {
            total_score: total,
            classification: ExposureClass::classify(total),
            per_room,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{BlockageSeverity, CollapseRisk};

    fn engine() -> MetricsEngine {
        MetricsEngine::siebel_center().unwrap()
    }

    #[test]
    fn test_default_route_to_lecture_hall() {
        let snapshot = engine().compute_all(&FireSeverityReport::default(), None, None, None);

        assert_eq!(snapshot.optimized_path.path, vec!["Lobby", "C1300", "1302"]);
        assert_eq!(snapshot.optimized_path.room_count, 3);
        assert_eq!(snapshot.optimized_path.risk_level, RiskLevel::Safe);
        assert_eq!(snapshot.heat_exposure.classification, ExposureClass::Minimal);
        assert_eq!(snapshot.heat_exposure.total_score, 0.0);
    }

    #[test]
    fn test_unknown_destination_falls_back_to_fire_room() {
        let fire = FireSeverityReport::default()
            .with_severity(6)
            .with_location("room 1403", 0.9);
        let engine = engine();
        let snapshot = engine.compute_all(&fire, None, Some("Attic"), Some("Roof"));

        assert_eq!(snapshot.optimized_path.path.first().map(String::as_str), Some("Lobby"));
        assert_eq!(snapshot.optimized_path.path.last().map(String::as_str), Some("1403"));
        assert_eq!(snapshot.optimized_path.risk_level, RiskLevel::Blocked);

        assert_eq!(snapshot.survivability.minutes_remaining, Some(0));
        assert!(!snapshot.survivability.viable);
        assert_eq!(snapshot.survivability.worst_room.as_deref(), Some("1403"));
        assert_eq!(snapshot.survivability.worst_room_intensity, 0.9);

        assert_eq!(snapshot.heat_exposure.per_room.get("1403"), Some(&0.9));
        assert_eq!(snapshot.heat_exposure.classification, ExposureClass::Moderate);
    }

    #[test]
    fn test_destination_falls_back_to_default_then_first_room() {
        let engine = engine();
        let quiet = FireSeverityReport::default();
        assert_eq!(engine.resolve_destination(Some("nowhere"), &quiet), "1302");

        let small = MetricsEngine::new(crate::building::layout::demo_floor()).unwrap();
        assert_eq!(small.resolve_destination(None, &quiet), "Lobby");
        assert_eq!(small.resolve_origin(Some("Room 301")), "Room 301");
    }

    #[test]
    fn test_survivability_burns_unreported_rooms_as_low_fuel() {
        let engine = engine();
        let fire = FireSeverityReport::default().with_location("1302", 0.5);
        let path: Vec<String> = ["Lobby", "C1300", "1302"].map(String::from).to_vec();

        // 1302 is a high-fuel lecture hall in the layout; without a fuel
        // source it grows at the low-fuel rate here.
        let window = engine.compute_survivability_window(&path, &fire);
        assert_eq!(window.minutes_remaining, Some(2));
        assert_eq!(window.worst_room.as_deref(), Some("1302"));
        assert!(window.viable);

        let fueled = fire.clone().with_fuel("seating", "high", "1302");
        let window = engine.compute_survivability_window(&path, &fueled);
        assert_eq!(window.minutes_remaining, Some(1));
    }

    #[test]
    fn test_empty_path_is_not_viable() {
        let rooms = vec![Room::new("Lobby").exterior(), Room::new("Island")];
        let engine = MetricsEngine::new(rooms)
            .unwrap()
            .with_defaults("Lobby", "Island");
        let snapshot = engine.compute_all(&FireSeverityReport::default(), None, None, None);

        assert!(snapshot.optimized_path.path.is_empty());
        assert!(snapshot.optimized_path.total_cost.is_infinite());
        assert_eq!(snapshot.survivability.minutes_remaining, Some(0));
        assert!(!snapshot.survivability.viable);
        assert_eq!(snapshot.heat_exposure.total_score, 0.0);
    }

    #[test]
    fn test_heat_exposure_counts_smoke_and_structural_overlay_does_not_add_heat() {
        let rooms = vec![
            Room::new("A").with_adjacent(["B"]).with_smoke(0.5),
            Room::new("B").with_adjacent(["C"]).with_fire(0.4),
            Room::new("C"),
        ];
        let engine = MetricsEngine::new(rooms).unwrap();
        let structural = StructuralReport::default()
            .with_blocked("C", "debris", BlockageSeverity::Complete)
            .with_collapse_risk(CollapseRisk::High);
        let path = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let exposure =
            engine.compute_heat_exposure(&path, &FireSeverityReport::default(), Some(&structural));

        assert_eq!(exposure.per_room["A"], 0.15);
        assert_eq!(exposure.per_room["B"], 0.4);
        assert_eq!(exposure.total_score, 0.55);
        assert_eq!(exposure.classification, ExposureClass::Moderate);
    }

    #[test]
    fn test_snapshot_serializes_blocked_cost_as_null() {
        let rooms = vec![Room::new("Lobby"), Room::new("Island")];
        let engine = MetricsEngine::new(rooms).unwrap().with_defaults("Lobby", "Island");
        let snapshot = engine.compute_all(&FireSeverityReport::default(), None, None, None);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert!(value["optimized_path"]["total_cost"].is_null());
        assert_eq!(value["optimized_path"]["risk_level"], "blocked");
        assert_eq!(value["heat_exposure"]["classification"], "minimal");
    }
}
