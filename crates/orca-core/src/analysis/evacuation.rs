//! Evacuation planner.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use crate::building::{labels_match, layout, Room};
use crate::reports::{
    CivilianRoute, EvacuationPlan, FireSeverityReport, FirefighterRoute, RoomRisk,
    StructuralReport,
};
use crate::routing::RiskLevel;

/// Rough traversal time per room on a route.
pub const SECONDS_PER_ROOM: u32 = 15;
const CIVILIAN_MAX_RISK: f64 = 0.9;
const FIREFIGHTER_MAX_RISK: f64 = 1.0;
const MAX_PATHS_PER_SEARCH: usize = 3;
const MAX_START_ROOMS: usize = 3;
const ROUTES_PER_START: usize = 2;
const MAX_FIRE_TARGETS: usize = 2;
const DEFAULT_ENTRY: &str = "Lobby";
const DEFAULT_FIRE_ROOM: &str = "Room 201";

fn room_risk(
    room: &str,
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
) -> RoomRisk {
    let mut fire_risk = 0.0_f64;
    let mut smoke_risk = 0.0;
    let mut structural_risk = 0.0_f64;

    if let Some(fire) = fire {
        for location in &fire.fire_locations {
            if labels_match(room, &location.label) {
                fire_risk = fire_risk.max(location.intensity);
            }
        }
        smoke_risk = fire.smoke_density.risk();
    }

    if let Some(structural) = structural {
        for passage in &structural.blocked_passages {
            if labels_match(room, &passage.passage) {
                let risk = if passage.severity.is_complete() { 1.0 } else { 0.6 };
                structural_risk = structural_risk.max(risk);
            }
        }
        structural_risk = structural_risk.max(structural.collapse_risk.floor());
    }

    RoomRisk::new(fire_risk, structural_risk, smoke_risk).rounded(2)
}

/// Per-room risk breakdown, rounded to two decimals.
pub fn room_risk_scores(
    rooms: &[Room],
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
) -> BTreeMap<String, RoomRisk> {
    rooms
        .iter()
        .map(|room| (room.name.clone(), room_risk(&room.name, fire, structural)))
        .collect()
}

struct Planner<'a> {
    adjacency: HashMap<&'a str, &'a [String]>,
    risks: &'a BTreeMap<String, RoomRisk>,
}

impl<'a> Planner<'a> {
    fn risk_of(&self, room: &str) -> f64 {
        self.risks
            .get(room)
            .map(|risk| risk.combined_risk)
            .unwrap_or(0.0)
    }

    /// Breadth-first search preferring lower-risk neighbors. Rooms above
    /// `max_risk` are skipped unless they are targets.
    fn find_paths(&self, start: &str, targets: &HashSet<&str>, max_risk: f64) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Vec<String>> = VecDeque::new();
        queue.push_back(vec![start.to_string()]);

        while let Some(path) = queue.pop_front() {
            let Some(current) = path.last() else {
                continue;
            };

            if targets.contains(current.as_str()) {
                paths.push(path);
                if paths.len() >= MAX_PATHS_PER_SEARCH {
                    break;
                }
                continue;
            }

            if !visited.insert(current.clone()) {
                continue;
            }

            let mut neighbors: Vec<&String> = self
                .adjacency
                .get(current.as_str())
                .map(|adj| adj.iter().collect())
                .unwrap_or_default();
            neighbors.sort_by(|a, b| self.risk_of(a).total_cmp(&self.risk_of(b)));

            for neighbor in neighbors {
                if visited.contains(neighbor) {
                    continue;
                }
                if self.risk_of(neighbor) <= max_risk || targets.contains(neighbor.as_str()) {
                    let mut next = path.clone();
                    next.push(neighbor.clone());
                    queue.push_back(next);
                }
            }
        }

        paths
    }

    fn classify(&self, path: &[String]) -> RiskLevel {
        let worst = path
            .iter()
            .map(|room| self.risk_of(room))
            .fold(0.0_f64, f64::max);
        RiskLevel::classify(worst)
    }
}

fn hazards_along(
    path: &[String],
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
) -> Vec<String> {
    let mut hazards: Vec<String> = Vec::new();
    let mut push = |hazard: String| {
        if !hazards.contains(&hazard) {
            hazards.push(hazard);
        }
    };

    for room in path {
        if let Some(fire) = fire {
            for location in &fire.fire_locations {
                if labels_match(room, &location.label) {
                    push(format!("fire in {room} (intensity {:.1})", location.intensity));
                }
            }
            if fire.smoke_density.is_heavy() {
                push(format!("heavy smoke in {room}"));
            }
        }
        if let Some(structural) = structural {
            for passage in &structural.blocked_passages {
                if labels_match(room, &passage.passage) {
                    push(format!("{} blocking {}", passage.reason, passage.passage));
                }
            }
        }
    }
    hazards
}

/// Evacuation team brain.
///
/// Civilian exit routes from up to three interior rooms and firefighter
/// entry routes toward up to two fire rooms. Uses the demo floor when
/// `rooms` is `None`.
pub fn compute_evacuation_routes(
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
    frame_id: &str,
    rooms: Option<&[Room]>,
) -> EvacuationPlan {
    let default_rooms;
    let rooms = match rooms {
        Some(rooms) => rooms,
        None => {
            default_rooms = layout::demo_floor();
            default_rooms.as_slice()
        }
    };

    let risk_scores = room_risk_scores(rooms, fire, structural);
    let planner = Planner {
        adjacency: rooms
            .iter()
            .map(|room| (room.name.as_str(), room.adjacent.as_slice()))
            .collect(),
        risks: &risk_scores,
    };

    let mut exits: HashSet<&str> = rooms
        .iter()
        .filter(|room| room.is_exterior)
        .map(|room| room.name.as_str())
        .collect();
    if exits.is_empty() {
        exits.insert(DEFAULT_ENTRY);
    }

    let mut fire_rooms: Vec<&str> = Vec::new();
    if let Some(fire) = fire {
        for location in &fire.fire_locations {
            for room in rooms {
                if labels_match(&room.name, &location.label) && !fire_rooms.contains(&room.name.as_str()) {
                    fire_rooms.push(room.name.as_str());
                }
            }
        }
    }
    if fire_rooms.is_empty() {
        fire_rooms.push(DEFAULT_FIRE_ROOM);
    }

    let interior: Vec<&str> = rooms
        .iter()
        .filter(|room| !room.is_exterior)
        .map(|room| room.name.as_str())
        .collect();
    let mut start_rooms: Vec<&str> = interior
        .iter()
        .copied()
        .filter(|room| !exits.contains(room))
        .collect();
    if start_rooms.is_empty() {
        start_rooms = interior.iter().copied().take(1).collect();
    }

    let mut civilian_exits = Vec::new();
    for start in start_rooms.iter().take(MAX_START_ROOMS) {
        let paths = planner.find_paths(start, &exits, CIVILIAN_MAX_RISK);
        for (i, path) in paths.into_iter().take(ROUTES_PER_START).enumerate() {
            civilian_exits.push(CivilianRoute {
                route_id: format!("civ_{start}_{i}"),
                risk_level: planner.classify(&path),
                estimated_time_seconds: path.len() as u32 * SECONDS_PER_ROOM,
                hazards: hazards_along(&path, fire, structural),
                recommended: i == 0,
                path,
            });
        }
    }

    let entry = if rooms.iter().any(|room| room.name == DEFAULT_ENTRY) {
        DEFAULT_ENTRY
    } else {
        rooms
            .iter()
            .find(|room| room.is_exterior)
            .map(|room| room.name.as_str())
            .unwrap_or(DEFAULT_ENTRY)
    };

    let mut firefighter_entries = Vec::new();
    for target in fire_rooms.iter().take(MAX_FIRE_TARGETS) {
        let targets: HashSet<&str> = [*target].into_iter().collect();
        let paths = planner.find_paths(entry, &targets, FIREFIGHTER_MAX_RISK);
        for (i, path) in paths.into_iter().take(ROUTES_PER_START).enumerate() {
            let risk_level = planner.classify(&path);
            let mut equipment_needed =
                vec!["SCBA".to_string(), "thermal_imaging_camera".to_string()];
            if risk_level.is_hazardous() {
                equipment_needed.push("halligan_tool".to_string());
            }
            firefighter_entries.push(FirefighterRoute {
                route_id: format!("ff_{target}_{i}"),
                path,
                risk_level,
                objective: format!("Fire source in {target}"),
                equipment_needed,
                recommended: i == 0,
            });
        }
    }

    tracing::debug!(
        civilian_routes = civilian_exits.len(),
        firefighter_routes = firefighter_entries.len(),
        "evacuation routes computed"
    );

    EvacuationPlan {
        civilian_exits,
        firefighter_entries,
        risk_scores,
        frame_id: Some(frame_id.to_string()),
        timestamp: Some(super::now_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{fallback_fire_severity, fallback_structural};
    use crate::reports::{BlockageSeverity, SmokeDensity};

    #[test]
    fn test_plan_without_hazards() {
        let plan = compute_evacuation_routes(None, None, "frame-0", None);

        assert_eq!(plan.risk_scores.len(), 12);
        assert!(plan.risk_scores.values().all(|r| r.combined_risk == 0.0));
        // three start rooms, each with up to two routes
        assert!(!plan.civilian_exits.is_empty());
        assert!(plan.civilian_exits.len() <= 6);
        let first = &plan.civilian_exits[0];
        assert_eq!(first.route_id, "civ_Hallway A_0");
        assert_eq!(first.path, vec!["Hallway A", "Lobby"]);
        assert_eq!(first.estimated_time_seconds, 30);
        assert_eq!(first.risk_level, RiskLevel::Safe);
        assert!(first.recommended);

        let ff = &plan.firefighter_entries[0];
        assert_eq!(ff.objective, "Fire source in Room 201");
        assert_eq!(ff.path.first().map(String::as_str), Some("Lobby"));
        assert_eq!(ff.path.last().map(String::as_str), Some("Room 201"));
        assert_eq!(ff.equipment_needed.len(), 2);
    }

    #[test]
    fn test_fallback_scene_risks_and_hazards() {
        let fire = fallback_fire_severity("frame-1");
        let structural = fallback_structural("frame-1");
        let plan = compute_evacuation_routes(Some(&fire), Some(&structural), "frame-1", None);

        let room_201 = plan.risk_scores["Room 201"];
        assert_eq!(room_201.fire_risk, 0.85);
        assert_eq!(room_201.structural_risk, 0.6);
        assert_eq!(room_201.smoke_risk, 0.5);
        assert_eq!(room_201.combined_risk, 0.85);
        assert_eq!(plan.risk_scores["Lobby"].structural_risk, 0.1);

        let ff = &plan.firefighter_entries[0];
        assert_eq!(ff.route_id, "ff_Room 201_0");
        assert!(plan
            .firefighter_entries
            .iter()
            .any(|route| route.objective == "Fire source in Room 201"
                && route.risk_level == RiskLevel::Blocked
                && route.equipment_needed.contains(&"halligan_tool".to_string())));
        assert_eq!(plan.frame_id.as_deref(), Some("frame-1"));
    }

    #[test]
    fn test_civilians_avoid_extreme_rooms() {
        let fire = FireSeverityReport::default()
            .with_location("Hallway A", 0.93)
            .with_smoke(SmokeDensity::Heavy);
        let plan = compute_evacuation_routes(Some(&fire), None, "f", None);

        let from_room_101 = plan
            .civilian_exits
            .iter()
            .filter(|route| route.path[0] == "Room 101")
            .count();
        assert_eq!(from_room_101, 0);

        let hallway_a = plan
            .civilian_exits
            .iter()
            .find(|route| route.path[0] == "Hallway A")
            .expect("route from the burning hallway itself");
        assert!(hallway_a
            .hazards
            .contains(&"fire in Hallway A (intensity 0.9)".to_string()));
        assert!(hallway_a
            .hazards
            .contains(&"heavy smoke in Hallway A".to_string()));
    }

    #[test]
    fn test_complete_blockage_hazard_text() {
        let structural = StructuralReport::default().with_blocked(
            "Stairwell A door",
            "debris",
            BlockageSeverity::Complete,
        );
        let risks = room_risk_scores(&layout::demo_floor(), None, Some(&structural));
        assert_eq!(risks["Stairwell A"].structural_risk, 1.0);

        let path = vec!["Hallway B".to_string(), "Stairwell A".to_string()];
        assert_eq!(
            hazards_along(&path, None, Some(&structural)),
            vec!["debris blocking Stairwell A door".to_string()]
        );
    }
}
