//! Seeding the simulator from a fire severity report.

use serde::{Deserialize, Serialize};

use super::{predict, SpreadPrediction, DEFAULT_HORIZON_MINUTES};
use crate::building::{labels_match, layout, FuelLevel, Room};
use crate::metrics::round_to;
use crate::reports::FireSeverityReport;

/// Severity at which unmatched rooms get a baseline intensity.
pub const SEVERITY_BASELINE_MIN: u32 = 5;

/// One row of the spread timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadTimelineEntry {
    pub room: String,
    pub current_intensity: f64,
    pub intensity_5min: f64,
    pub intensity_10min: f64,
    pub time_to_danger_min: Option<u32>,
    pub time_to_flashover_min: Option<u32>,
    pub risk_factors: Vec<String>,
}

impl From<&SpreadPrediction> for SpreadTimelineEntry {
    fn from(prediction: &SpreadPrediction) -> Self {
        Self {
            room: prediction.room.clone(),
            current_intensity: round_to(prediction.current_intensity, 3),
            intensity_5min: round_to(prediction.intensity_at(5), 3),
            intensity_10min: round_to(prediction.intensity_at(10), 3),
            time_to_danger_min: prediction.time_to_danger_min,
            time_to_flashover_min: prediction.time_to_flashover_min,
            risk_factors: prediction.risk_factors.clone(),
        }
    }
}

/// Initial per-room intensity and fuel from free-text vision output.
///
/// Fuel comes from the first matching fuel source (unknown flammability is
/// medium), otherwise the layout's own fuel level. Intensity is the highest
/// matching fire location; unmatched rooms start at `severity / 20` once
/// severity reaches [`SEVERITY_BASELINE_MIN`].
pub fn seed_rooms(fire: &FireSeverityReport, rooms: &[Room]) -> Vec<Room> {
    seed(fire, rooms, None)
}

/// Like [`seed_rooms`], but rooms no fuel source names burn at
/// `unmatched_fuel` instead of their layout fuel level.
pub fn seed_rooms_with_fuel_default(
    fire: &FireSeverityReport,
    rooms: &[Room],
    unmatched_fuel: FuelLevel,
) -> Vec<Room> {
    seed(fire, rooms, Some(unmatched_fuel))
}

fn seed(fire: &FireSeverityReport, rooms: &[Room], unmatched_fuel: Option<FuelLevel>) -> Vec<Room> {
    let severity = fire.severity.unwrap_or(0);

    rooms
        .iter()
        .map(|room| {
            let mut seeded = room.clone();

            match fire
                .fuel_sources
                .iter()
                .find(|source| labels_match(&room.name, &source.location_label))
            {
                Some(source) => {
                    seeded.fuel_level =
                        FuelLevel::from_label(&source.flammability).unwrap_or(FuelLevel::Medium);
                }
                None => {
                    if let Some(fuel) = unmatched_fuel {
                        seeded.fuel_level = fuel;
                    }
                }
            }

            let mut intensity = fire
                .fire_locations
                .iter()
                .filter(|location| labels_match(&room.name, &location.label))
                .map(|location| location.intensity)
                .fold(0.0_f64, f64::max);
            if intensity == 0.0 && severity >= SEVERITY_BASELINE_MIN {
                intensity = f64::from(severity) / 20.0;
            }
            seeded.fire_intensity = crate::building::clamp_unit(intensity);
            seeded
        })
        .collect()
}

/// Seed from a fire report and predict the default horizon.
///
/// Uses the demo floor when `rooms` is `None`.
pub fn build_spread_timeline(
    fire: &FireSeverityReport,
    rooms: Option<&[Room]>,
) -> Vec<SpreadTimelineEntry> {
    let seeded = match rooms {
        Some(rooms) => seed_rooms(fire, rooms),
        None => seed_rooms(fire, &layout::demo_floor()),
    };
    predict(&seeded, DEFAULT_HORIZON_MINUTES)
        .iter()
        .map(SpreadTimelineEntry::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_201_fire() -> FireSeverityReport {
        FireSeverityReport::default()
            .with_location("Room 201", 0.85)
            .with_fuel("furniture", "high", "Room 201")
    }

    fn entry<'a>(timeline: &'a [SpreadTimelineEntry], room: &str) -> &'a SpreadTimelineEntry {
        timeline.iter().find(|e| e.room == room).expect("room row")
    }

    #[test]
    fn test_burning_room_is_already_dangerous() {
        let timeline = build_spread_timeline(&room_201_fire(), None);
        assert_eq!(timeline.len(), 12);

        let room = entry(&timeline, "Room 201");
        assert_eq!(room.current_intensity, 0.85);
        assert_eq!(room.time_to_danger_min, Some(0));
        assert!(room.intensity_5min >= 0.85);
        assert_eq!(room.risk_factors[0], "high fuel load");
    }

    #[test]
    fn test_fire_spreads_through_doorway() {
        let timeline = build_spread_timeline(&room_201_fire(), None);
        let hallway = entry(&timeline, "Hallway B");
        assert_eq!(hallway.current_intensity, 0.0);
        assert!(hallway.intensity_5min > hallway.current_intensity);
        assert!(hallway
            .risk_factors
            .contains(&"adjacent active fire".to_string()));
    }

    #[test]
    fn test_no_fire_means_zero_current_intensity() {
        let fire = FireSeverityReport::default().with_severity(0);
        let timeline = build_spread_timeline(&fire, None);
        assert!(timeline.iter().all(|e| e.current_intensity == 0.0));
    }

    #[test]
    fn test_severity_baseline_and_unknown_flammability() {
        let fire = FireSeverityReport::default()
            .with_severity(7)
            .with_fuel("chemicals", "extreme", "Room 101");
        let seeded = seed_rooms(&fire, &layout::demo_floor());

        assert!(seeded.iter().all(|room| (room.fire_intensity - 0.35).abs() < 1e-9));
        let room_101 = seeded.iter().find(|r| r.name == "Room 101").unwrap();
        assert_eq!(room_101.fuel_level, FuelLevel::Medium);
        let lobby = seeded.iter().find(|r| r.name == "Lobby").unwrap();
        assert_eq!(lobby.fuel_level, FuelLevel::Low);
    }
}
