//! Canned vision results for when the backend is unavailable.
//!
//! Deterministic scene: an office fire in Room 201 spreading into Hallway B.

use crate::reports::{
    BlockageSeverity, CollapseRisk, DegradationTimeline, FireLocation, FireSeverityReport,
    FuelSource, SmokeDensity, StructuralObject, StructuralReport,
};

fn located(label: &str, intensity: f64, x: f64, y: f64, radius: f64) -> FireLocation {
    FireLocation {
        label: label.to_string(),
        intensity,
        x: Some(x),
        y: Some(y),
        radius: Some(radius),
    }
}

fn object(kind: &str, condition: &str, label: &str, x: f64, y: f64, notes: &str) -> StructuralObject {
    StructuralObject {
        kind: kind.to_string(),
        condition: condition.to_string(),
        location_label: label.to_string(),
        x: Some(x),
        y: Some(y),
        notes: notes.to_string(),
    }
}

/// Fire severity fallback stamped with `frame_id` and the current time.
pub fn fallback_fire_severity(frame_id: &str) -> FireSeverityReport {
    FireSeverityReport {
        severity: Some(7),
        fire_locations: vec![
            located("Room 201", 0.85, 0.45, 0.35, 0.25),
            located("Hallway B", 0.35, 0.30, 0.50, 0.10),
        ],
        fuel_sources: vec![
            FuelSource::new("furniture", "high", "Room 201"),
            FuelSource::new("carpet", "medium", "Hallway B"),
            FuelSource::new("paper", "high", "Room 201"),
        ],
        smoke_density: SmokeDensity::Moderate,
        confidence: Some(0.91),
        frame_id: Some(frame_id.to_string()),
        timestamp: Some(super::now_rfc3339()),
    }
}

/// Structural fallback stamped with `frame_id` and the current time.
pub fn fallback_structural(frame_id: &str) -> StructuralReport {
    StructuralReport {
        objects: vec![
            object("door", "intact", "Lobby entrance", 0.15, 0.90, "Main entry point"),
            object("door", "damaged", "Room 201 entrance", 0.40, 0.50, "Heat damage to frame"),
            object("wall", "damaged", "Room 201 south wall", 0.55, 0.75, "Cracking visible"),
            object("stairwell", "intact", "Stairwell A", 0.10, 0.85, ""),
            object("window", "compromised", "Room 201 east window", 0.70, 0.25, "Glass broken from heat"),
            object("fire_extinguisher", "intact", "Hallway A south wall", 0.25, 0.60, ""),
            object("exit_sign", "intact", "Hallway A", 0.20, 0.55, ""),
            object("furniture", "destroyed", "Room 201 desk area", 0.50, 0.30, "Fully engulfed"),
        ],
        integrity_score: Some(6),
        blocked_passages: Vec::new(),
        collapse_risk: CollapseRisk::Low,
        degradation_timeline: Some(DegradationTimeline {
            minutes_to_concern: Some(12),
            minutes_to_critical: Some(25),
            factors: vec![
                "active fire near load-bearing wall".to_string(),
                "high fuel load".to_string(),
            ],
        }),
        frame_id: Some(frame_id.to_string()),
        timestamp: Some(super::now_rfc3339()),
    }
    .with_blocked("Room 201 entrance", "fire", BlockageSeverity::Partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_are_stamped() {
        let fire = fallback_fire_severity("frame-7");
        assert_eq!(fire.severity, Some(7));
        assert_eq!(fire.frame_id.as_deref(), Some("frame-7"));
        assert!(fire.timestamp.is_some());

        let structural = fallback_structural("frame-7");
        assert_eq!(structural.integrity_score, Some(6));
        assert_eq!(structural.blocked_passages.len(), 1);
        assert_eq!(structural.objects.len(), 8);
    }

    #[test]
    fn test_fallback_serializes_to_vision_schema() {
        let value = serde_json::to_value(fallback_structural("f")).unwrap();
        assert_eq!(value["collapse_risk"], "low");
        assert_eq!(value["objects"][0]["type"], "door");
        assert_eq!(value["blocked_passages"][0]["severity"], "partial");
    }
}
