//! Building graph model
//!
//! Rooms are nodes, doors are directed edges in both directions. An edge's
//! weight is the hazard of the room it enters, so it is derived from node
//! attributes and recomputed after every overlay.

pub mod layout;
mod room;

pub use room::{hazard_weight, FuelLevel, Room};

use std::collections::{HashMap, HashSet};

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::error::RequestError;
use crate::reports::{normalize_label, FireSeverityReport, StructuralReport};

/// Case-insensitive substring match in both directions.
///
/// An empty label matches nothing.
pub fn labels_match(room_name: &str, label: &str) -> bool {
    let label = normalize_label(label);
    if label.is_empty() {
        return false;
    }
    let name = normalize_label(room_name);
    name.contains(&label) || label.contains(&name)
}

/// Structural risk set on a passage that is partially blocked.
pub const PARTIAL_BLOCKAGE_RISK: f64 = 0.6;

/// Directed room graph with hazard-derived edge weights.
#[derive(Debug, Clone)]
pub struct BuildingGraph {
    graph: DiGraph<Room, f64>,
    index: HashMap<String, NodeIndex>,
}

impl BuildingGraph {
    /// Build from a room list, or the demo floor when `rooms` is `None`.
    pub fn build(rooms: Option<&[Room]>) -> Result<Self, RequestError> {
        match rooms {
            Some(rooms) => Self::from_rooms(rooms.to_vec()),
            None => Self::from_rooms(layout::demo_floor()),
        }
    }

    /// Build from owned room records.
    ///
    /// Adjacency is symmetrized: a missing reverse link is appended, links to
    /// unknown rooms and self-links are dropped. Hazards are clamped to
    /// `[0, 1]`.
    pub fn from_rooms(mut rooms: Vec<Room>) -> Result<Self, RequestError> {
        let mut seen = HashSet::with_capacity(rooms.len());
        for room in &rooms {
            if room.name.trim().is_empty() {
                return Err(RequestError::MalformedRoom(room.name.clone()));
            }
            if !seen.insert(room.name.clone()) {
                return Err(RequestError::DuplicateRoom(room.name.clone()));
            }
        }

        let position: HashMap<String, usize> = rooms
            .iter()
            .enumerate()
            .map(|(i, room)| (room.name.clone(), i))
            .collect();

        for room in rooms.iter_mut() {
            let mut kept: Vec<String> = Vec::with_capacity(room.adjacent.len());
            for adj in room.adjacent.drain(..) {
                if adj == room.name || kept.contains(&adj) {
                    continue;
                }
                if !position.contains_key(&adj) {
                    tracing::debug!(room = %room.name, adjacent = %adj, "dropping link to unknown room");
                    continue;
                }
                kept.push(adj);
            }
            room.adjacent = kept;
            room.clamp_hazards();
        }

        let links: Vec<(usize, String)> = rooms
            .iter()
            .enumerate()
            .flat_map(|(i, room)| room.adjacent.iter().map(move |adj| (i, adj.clone())))
            .collect();
        for (from, to) in links {
            let from_name = rooms[from].name.clone();
            if let Some(&target) = position.get(&to) {
                if !rooms[target].adjacent.contains(&from_name) {
                    rooms[target].adjacent.push(from_name);
                }
            }
        }

        let mut graph = DiGraph::with_capacity(rooms.len(), rooms.len() * 2);
        let mut index = HashMap::with_capacity(rooms.len());
        for room in rooms {
            let name = room.name.clone();
            let node = graph.add_node(room);
            index.insert(name, node);
        }

        let mut edges = Vec::new();
        for node in graph.node_indices() {
            for adj in &graph[node].adjacent {
                if let Some(&target) = index.get(adj) {
                    edges.push((node, target));
                }
            }
        }
        for (from, to) in edges {
            let weight = graph[to].hazard_weight();
            graph.add_edge(from, to, weight);
        }

        Ok(Self { graph, index })
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.index.get(name).map(|&node| &self.graph[node])
    }

    /// Rooms in layout order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> + '_ {
        self.graph.node_indices().map(move |node| &self.graph[node])
    }

    pub fn room_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rooms().map(|room| room.name.as_str())
    }

    pub fn neighbors(&self, name: &str) -> &[String] {
        self.room(name)
            .map(|room| room.adjacent.as_slice())
            .unwrap_or(&[])
    }

    pub fn edge_weight(&self, from: &str, to: &str) -> Option<f64> {
        let from = *self.index.get(from)?;
        let to = *self.index.get(to)?;
        let edge = self.graph.find_edge(from, to)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Every edge as `(from, to, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.graph.edge_references().map(move |edge| {
            (
                self.graph[edge.source()].name.as_str(),
                self.graph[edge.target()].name.as_str(),
                *edge.weight(),
            )
        })
    }

    pub fn exterior_rooms(&self) -> Vec<&str> {
        self.rooms()
            .filter(|room| room.is_exterior)
            .map(|room| room.name.as_str())
            .collect()
    }

    /// Rooms whose name fuzzy-matches `label`, in layout order.
    pub fn matching_rooms(&self, label: &str) -> Vec<&str> {
        self.room_names()
            .filter(|name| labels_match(name, label))
            .collect()
    }

    /// Snapshot of the current room records.
    pub fn to_rooms(&self) -> Vec<Room> {
        self.rooms().cloned().collect()
    }

    /// Raise fire intensity of every room matching a reported fire location.
    /// Never lowers an existing intensity.
    pub fn apply_fire_overlay(&mut self, fire: &FireSeverityReport) -> &mut Self {
        for location in &fire.fire_locations {
            let intensity = clamp_unit(location.intensity);
            for node in self.matching_nodes(&location.label) {
                let room = &mut self.graph[node];
                room.fire_intensity = room.fire_intensity.max(intensity);
            }
        }
        self.recompute_weights();
        self
    }

    /// Apply blocked passages and the global collapse-risk floor.
    pub fn apply_structural_overlay(&mut self, structural: &StructuralReport) -> &mut Self {
        for passage in &structural.blocked_passages {
            for node in self.matching_nodes(&passage.passage) {
                let room = &mut self.graph[node];
                if passage.severity.is_complete() {
                    room.structural_risk = 1.0;
                } else {
                    room.structural_risk = room.structural_risk.max(PARTIAL_BLOCKAGE_RISK);
                }
            }
        }

        let floor = structural.collapse_risk.floor();
        for node in self.graph.node_indices() {
            let room = &mut self.graph[node];
            room.structural_risk = room.structural_risk.max(floor);
        }
        self.recompute_weights();
        self
    }

    /// Cheapest path by edge weight, as `(cost, rooms)`.
    ///
    /// Returns `None` when either endpoint is unknown or unreachable.
    pub fn cheapest_path(&self, origin: &str, destination: &str) -> Option<(f64, Vec<String>)> {
        let start = *self.index.get(origin)?;
        let goal = *self.index.get(destination)?;
        let (cost, nodes) = astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| *edge.weight(),
            |_| 0.0,
        )?;
        let path = nodes
            .into_iter()
            .map(|node| self.graph[node].name.clone())
            .collect();
        Some((cost, path))
    }

    fn matching_nodes(&self, label: &str) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&node| labels_match(&self.graph[node].name, label))
            .collect()
    }

    fn recompute_weights(&mut self) {
        let edges: Vec<_> = self.graph.edge_indices().collect();
        for edge in edges {
            if let Some((_, target)) = self.graph.edge_endpoints(edge) {
                let weight = self.graph[target].hazard_weight();
                self.graph[edge] = weight;
            }
        }
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{BlockageSeverity, CollapseRisk};

    fn assert_symmetric(graph: &BuildingGraph) {
        for room in graph.rooms() {
            for adj in &room.adjacent {
                assert!(
                    graph.neighbors(adj).contains(&room.name),
                    "{} lists {} but not the reverse",
                    room.name,
                    adj
                );
            }
        }
    }

    #[test]
    fn test_default_graph_is_symmetric_and_weighted() {
        let graph = BuildingGraph::build(None).unwrap();
        assert_eq!(graph.len(), 12);
        assert_symmetric(&graph);
        assert!(graph.edges().all(|(_, _, w)| w >= 1.0));
        assert_eq!(graph.exterior_rooms(), vec!["Lobby"]);
    }

    #[test]
    fn test_construction_repairs_adjacency() {
        let rooms = vec![
            Room::new("A").with_adjacent(["B", "Ghost", "A"]),
            Room::new("B"),
            Room::new("C").with_adjacent(["B", "B"]),
        ];
        let graph = BuildingGraph::from_rooms(rooms).unwrap();

        assert_eq!(graph.neighbors("A"), ["B".to_string()]);
        assert_eq!(graph.neighbors("B"), ["A".to_string(), "C".to_string()]);
        assert_eq!(graph.edge_count(), 4);
        assert_symmetric(&graph);
    }

    #[test]
    fn test_construction_rejects_bad_names() {
        let dup = vec![Room::new("A"), Room::new("A")];
        assert_eq!(
            BuildingGraph::from_rooms(dup).unwrap_err(),
            RequestError::DuplicateRoom("A".to_string())
        );

        let empty = vec![Room::new("  ")];
        assert!(matches!(
            BuildingGraph::from_rooms(empty),
            Err(RequestError::MalformedRoom(_))
        ));
    }

    #[test]
    fn test_fire_overlay_raises_and_never_lowers() {
        let mut graph = BuildingGraph::build(None).unwrap();
        let fire = FireSeverityReport::default()
            .with_location("room 201", 0.85)
            .with_location("Room 201", 0.4);
        graph.apply_fire_overlay(&fire);

        assert_eq!(graph.room("Room 201").unwrap().fire_intensity, 0.85);
        let weight = graph.edge_weight("Hallway B", "Room 201").unwrap();
        assert!((weight - 9.5).abs() < 1e-9);
        assert_eq!(graph.edge_weight("Room 201", "Hallway B"), Some(1.0));
    }

    #[test]
    fn test_structural_overlay_blockage_and_collapse_floor() {
        let mut graph = BuildingGraph::build(None).unwrap();
        let structural = StructuralReport::default()
            .with_blocked("Room 201 entrance", "fire", BlockageSeverity::Partial)
            .with_blocked("Hallway C", "debris", BlockageSeverity::Complete)
            .with_collapse_risk(CollapseRisk::Moderate);
        graph.apply_structural_overlay(&structural);

        assert_eq!(graph.room("Room 201").unwrap().structural_risk, 0.6);
        assert_eq!(graph.room("Hallway C").unwrap().structural_risk, 1.0);
        assert_eq!(graph.room("Lobby").unwrap().structural_risk, 0.3);
        let weight = graph.edge_weight("Floor 2 Landing", "Hallway C").unwrap();
        assert!((weight - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_stay_positive_for_hostile_input() {
        let rooms = vec![
            Room::new("A")
                .with_adjacent(["B"])
                .with_fire(-3.0)
                .with_smoke(f64::NAN),
            Room::new("B").with_structural(-1.0),
        ];
        let mut graph = BuildingGraph::from_rooms(rooms).unwrap();
        let fire = FireSeverityReport::default().with_location("A", -5.0);
        graph.apply_fire_overlay(&fire);

        assert!(graph.edges().all(|(_, _, w)| w >= 1.0));
    }

    #[test]
    fn test_empty_label_matches_nothing() {
        assert!(!labels_match("Lobby", "  "));
        assert!(labels_match("Hallway B", "hallway b near stairs"));
        assert!(labels_match("Stairwell_NW_2", "nw_2"));
    }

    #[test]
    fn test_cheapest_path_prefers_safer_rooms() {
        let mut graph = BuildingGraph::build(None).unwrap();
        let fire = FireSeverityReport::default().with_location("Hallway B", 0.9);
        graph.apply_fire_overlay(&fire);

        let (_, path) = graph.cheapest_path("Lobby", "Room 202").unwrap();
        assert_eq!(path.first().map(String::as_str), Some("Lobby"));
        assert_eq!(path.last().map(String::as_str), Some("Room 202"));
        assert!(graph.cheapest_path("Lobby", "Nowhere").is_none());
    }
}
