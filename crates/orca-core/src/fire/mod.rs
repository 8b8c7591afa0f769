//! Fire spread simulator
//!
//! Deterministic per-minute forward model over the room adjacency graph.
//! Every step reads the previous minute's snapshot, so rooms are updated
//! independently of iteration order.

mod seed;

pub use seed::{
    build_spread_timeline, seed_rooms, seed_rooms_with_fuel_default, SpreadTimelineEntry,
};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::building::{FuelLevel, Room};

/// Growth per minute before fuel and coupling.
pub const BASE_RATE: f64 = 0.05;
/// Share of an active neighbor's intensity that crosses a doorway.
pub const NEIGHBOR_COUPLING: f64 = 0.7;
/// Multiplier when either side of a link has a stairwell.
pub const STAIRWELL_MULTIPLIER: f64 = 1.8;
/// A neighbor above this intensity spreads fire.
pub const ACTIVE_THRESHOLD: f64 = 0.3;
pub const DANGER_THRESHOLD: f64 = 0.6;
pub const FLASHOVER_THRESHOLD: f64 = 0.8;
pub const DEFAULT_HORIZON_MINUTES: u32 = 10;

pub const RISK_HIGH_FUEL: &str = "high fuel load";
pub const RISK_VERTICAL_SPREAD: &str = "stairwell enables vertical spread";
pub const RISK_ADJACENT_FIRE: &str = "adjacent active fire";
pub const RISK_FLASHOVER: &str = "flashover risk";

/// Projected intensity of one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadPrediction {
    pub room: String,
    pub current_intensity: f64,
    /// Intensity at minute `t`, for `t` in `0..=horizon`.
    pub timeline: Vec<f64>,
    pub time_to_danger_min: Option<u32>,
    pub time_to_flashover_min: Option<u32>,
    pub risk_factors: Vec<String>,
}

impl SpreadPrediction {
    /// Intensity at `minute`, holding the last value past the horizon.
    pub fn intensity_at(&self, minute: u32) -> f64 {
        let last = self.timeline.len().saturating_sub(1);
        self.timeline
            .get((minute as usize).min(last))
            .copied()
            .unwrap_or(self.current_intensity)
    }

    pub fn horizon(&self) -> u32 {
        self.timeline.len().saturating_sub(1) as u32
    }
}

fn first_above(timeline: &[f64], threshold: f64) -> Option<u32> {
    timeline
        .iter()
        .position(|&intensity| intensity > threshold)
        .map(|minute| minute as u32)
}

/// Project every room forward `horizon` minutes.
///
/// Per minute: `rate = BASE_RATE × fuel`, plus for each neighbor above
/// [`ACTIVE_THRESHOLD`] `neighbor × NEIGHBOR_COUPLING × BASE_RATE`, scaled by
/// [`STAIRWELL_MULTIPLIER`] if either room has a stairwell. Intensity is
/// capped at 1.0 and never decreases.
pub fn predict(rooms: &[Room], horizon_minutes: u32) -> Vec<SpreadPrediction> {
    let position: HashMap<&str, usize> = rooms
        .iter()
        .enumerate()
        .map(|(i, room)| (room.name.as_str(), i))
        .collect();
    let neighbors: Vec<Vec<usize>> = rooms
        .iter()
        .map(|room| {
            room.adjacent
                .iter()
                .filter_map(|adj| position.get(adj.as_str()).copied())
                .collect()
        })
        .collect();

    let mut current: Vec<f64> = rooms
        .iter()
        .map(|room| crate::building::clamp_unit(room.fire_intensity))
        .collect();
    let mut timelines: Vec<Vec<f64>> = current
        .iter()
        .map(|&intensity| {
            let mut timeline = Vec::with_capacity(horizon_minutes as usize + 1);
            timeline.push(intensity);
            timeline
        })
        .collect();
    let mut saw_active_neighbor = vec![false; rooms.len()];

    for _minute in 0..horizon_minutes {
        let next: Vec<f64> = rooms
            .iter()
            .enumerate()
            .map(|(i, room)| {
                let mut rate = BASE_RATE * room.fuel_level.multiplier();
                for &n in &neighbors[i] {
                    let neighbor = current[n];
                    if neighbor > ACTIVE_THRESHOLD {
                        saw_active_neighbor[i] = true;
                        let mut spread = neighbor * NEIGHBOR_COUPLING * BASE_RATE;
                        if room.has_stairwell || rooms[n].has_stairwell {
                            spread *= STAIRWELL_MULTIPLIER;
                        }
                        rate += spread;
                    }
                }
                (current[i] + rate).min(1.0)
            })
            .collect();
        for (timeline, &intensity) in timelines.iter_mut().zip(&next) {
            timeline.push(intensity);
        }
        current = next;
    }

    rooms
        .iter()
        .zip(timelines)
        .enumerate()
        .map(|(i, (room, timeline))| {
            let time_to_danger_min = first_above(&timeline, DANGER_THRESHOLD);
            let time_to_flashover_min = first_above(&timeline, FLASHOVER_THRESHOLD);

            let mut risk_factors = Vec::new();
            if room.fuel_level == FuelLevel::High {
                risk_factors.push(RISK_HIGH_FUEL.to_string());
            }
            if saw_active_neighbor[i] && room.has_stairwell {
                risk_factors.push(RISK_VERTICAL_SPREAD.to_string());
            }
            if saw_active_neighbor[i] {
                risk_factors.push(RISK_ADJACENT_FIRE.to_string());
            }
            if time_to_flashover_min.is_some() {
                risk_factors.push(RISK_FLASHOVER.to_string());
            }

            SpreadPrediction {
                room: room.name.clone(),
                current_intensity: timeline[0],
                timeline,
                time_to_danger_min,
                time_to_flashover_min,
                risk_factors,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Vec<Room> {
        vec![
            Room::new("Burning")
                .with_adjacent(["Hall"])
                .with_fire(0.9)
                .with_fuel(FuelLevel::High),
            Room::new("Hall").with_adjacent(["Burning", "Stairs"]),
            Room::new("Stairs").with_adjacent(["Hall"]).stairwell(),
        ]
    }

    #[test]
    fn test_intensity_is_monotonic_and_capped() {
        for prediction in predict(&corridor(), 30) {
            assert_eq!(prediction.timeline.len(), 31);
            for window in prediction.timeline.windows(2) {
                assert!(window[1] >= window[0]);
                assert!(window[1] <= 1.0);
            }
        }
    }

    #[test]
    fn test_neighbor_coupling_speeds_up_spread() {
        let predictions = predict(&corridor(), 5);
        let hall = &predictions[1];
        // 0.05 self growth + 0.9 * 0.7 * 0.05 from the burning room
        assert!((hall.intensity_at(1) - 0.0815).abs() < 1e-9);
        assert!(hall.risk_factors.contains(&RISK_ADJACENT_FIRE.to_string()));

        let isolated = predict(&[Room::new("Alone")], 5);
        assert!(hall.intensity_at(5) > isolated[0].intensity_at(5));
    }

    #[test]
    fn test_thresholds_and_risk_factors() {
        let predictions = predict(&corridor(), 2);
        let burning = &predictions[0];
        assert_eq!(burning.time_to_danger_min, Some(0));
        assert_eq!(burning.time_to_flashover_min, Some(0));
        assert_eq!(
            burning.risk_factors,
            vec![RISK_HIGH_FUEL.to_string(), RISK_FLASHOVER.to_string()]
        );

        let stairs = &predictions[2];
        assert_eq!(stairs.time_to_danger_min, None);
        assert!(stairs.risk_factors.is_empty());
    }

    #[test]
    fn test_stairwell_coupling_and_vertical_tag() {
        let rooms = vec![
            Room::new("Landing")
                .with_adjacent(["Fire"])
                .stairwell(),
            Room::new("Fire").with_adjacent(["Landing"]).with_fire(0.5),
        ];
        let predictions = predict(&rooms, 1);
        let landing = &predictions[0];
        let expected = 0.05 + 0.5 * 0.7 * 0.05 * 1.8;
        assert!((landing.intensity_at(1) - expected).abs() < 1e-9);
        assert_eq!(
            landing.risk_factors,
            vec![
                RISK_VERTICAL_SPREAD.to_string(),
                RISK_ADJACENT_FIRE.to_string()
            ]
        );
    }

    #[test]
    fn test_zero_horizon_and_intensity_past_horizon() {
        let predictions = predict(&corridor(), 0);
        assert_eq!(predictions[1].timeline, vec![0.0]);
        assert_eq!(predictions[1].time_to_danger_min, None);
        assert_eq!(predictions[0].intensity_at(7), 0.9);
    }
}
