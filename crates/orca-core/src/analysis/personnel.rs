//! Personnel recommender based on NFPA 1710 staffing heuristics.

use crate::reports::{
    EquipmentItem, EvacuationPlan, FireSeverityReport, PersonnelRecommendation, StructuralReport,
    TruckAssignment,
};

pub const STAGING_LOCATION: &str = "100m upwind of building entrance";
const DEFAULT_SEVERITY: u32 = 5;
const MAX_ALARM: u8 = 5;

/// Alarm level from severity, escalated for multiple fires and weak structure.
pub fn alarm_level(severity: u32, fire_locations: usize, integrity_score: Option<u32>) -> u8 {
    let mut alarm = match severity {
        0..=3 => 1,
        4..=5 => 2,
        6..=7 => 3,
        8..=9 => 4,
        _ => 5,
    };
    if fire_locations >= 3 {
        alarm = (alarm + 1).min(MAX_ALARM);
    }
    if integrity_score.is_some_and(|score| score <= 4) {
        alarm = (alarm + 1).min(MAX_ALARM);
    }
    alarm
}

fn firefighters_for(alarm: u8) -> u32 {
    match alarm {
        1 => 4,
        2 => 10,
        3 => 18,
        4 => 28,
        _ => 40,
    }
}

fn trucks_for(alarm: u8) -> Vec<TruckAssignment> {
    match alarm {
        1 => vec![TruckAssignment::new("engine", 1)],
        2 => vec![
            TruckAssignment::new("engine", 2),
            TruckAssignment::new("ladder", 1),
        ],
        3 => vec![
            TruckAssignment::new("engine", 3),
            TruckAssignment::new("ladder", 1),
            TruckAssignment::new("rescue", 1),
        ],
        4 => vec![
            TruckAssignment::new("engine", 4),
            TruckAssignment::new("ladder", 2),
            TruckAssignment::new("rescue", 1),
            TruckAssignment::new("tanker", 1),
        ],
        _ => vec![
            TruckAssignment::new("engine", 5),
            TruckAssignment::new("ladder", 2),
            TruckAssignment::new("rescue", 2),
            TruckAssignment::new("tanker", 1),
            TruckAssignment::new("hazmat", 1),
        ],
    }
}

/// Minutes to containment: 3 per severity point plus 2 per fire location
/// when there are several, scaled down by up to half for higher alarms.
pub fn containment_eta_minutes(severity: u32, alarm: u8, fire_locations: usize) -> u32 {
    let mut base = f64::from(severity) * 3.0;
    if fire_locations > 1 {
        base += fire_locations as f64 * 2.0;
    }
    let resource_factor = (1.0 - f64::from(alarm.saturating_sub(1)) * 0.1).max(0.5);
    ((base * resource_factor) as u32).max(5)
}

fn equipment_for(
    firefighters: u32,
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
) -> Vec<EquipmentItem> {
    let mut equipment = vec![
        EquipmentItem::new("SCBA", firefighters, "critical"),
        EquipmentItem::new("hose_line", 2, "critical"),
        EquipmentItem::new("halligan_tool", 2, "critical"),
        EquipmentItem::new("thermal_imaging_camera", 1, "critical"),
    ];
    if fire.is_some_and(|fire| fire.smoke_density.is_heavy()) {
        equipment.push(EquipmentItem::new(
            "positive_pressure_ventilator",
            2,
            "critical",
        ));
        equipment.push(EquipmentItem::new("SCBA", 4, "critical"));
    }
    if structural.is_some_and(|s| s.collapse_risk.is_compromised()) {
        equipment.push(EquipmentItem::new("shoring_equipment", 1, "critical"));
        equipment.push(EquipmentItem::new("rope_rescue_kit", 1, "recommended"));
    }
    equipment
}

fn strategy_for(
    severity: u32,
    structural: Option<&StructuralReport>,
    evacuation: Option<&EvacuationPlan>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(
        match severity {
            0..=3 => "Offensive interior attack",
            4..=6 => "Transitional attack - exterior knockdown then interior advance",
            7..=8 => "Defensive operations - surround and drown",
            _ => "Defensive operations - protect exposures, no interior operations",
        }
        .to_string(),
    );

    if let Some(entry) = evacuation
        .and_then(|plan| plan.firefighter_entries.first())
        .and_then(|route| route.path.first())
    {
        parts.push(format!("via {entry}"));
    }

    if severity >= 4 {
        parts.push("ventilate roof".to_string());
    }
    parts.push("establish water supply from nearest hydrant".to_string());

    if let Some(structural) = structural {
        if structural.collapse_risk.is_severe() {
            parts.push("WARNING: collapse risk - establish collapse zone".to_string());
        }
        if !structural.blocked_passages.is_empty() {
            let blocked: Vec<&str> = structural
                .blocked_passages
                .iter()
                .take(2)
                .map(|b| b.passage.as_str())
                .collect();
            parts.push(format!("avoid blocked passages: {}", blocked.join(", ")));
        }
    }

    parts.join(", ")
}

fn priority_actions_for(
    severity: u32,
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
) -> Vec<String> {
    let mut actions = vec!["Establish incident command".to_string()];

    if severity >= 7 {
        actions.push("Request additional alarm - upgrade to mutual aid".to_string());
    }

    if structural.is_some_and(|s| s.collapse_risk.is_severe()) {
        actions.push("Establish collapse zone - no interior operations".to_string());
    } else if severity <= 6 {
        if let Some(primary) = fire.and_then(|fire| fire.fire_locations.first()) {
            let label = if primary.label.is_empty() {
                "primary fire location"
            } else {
                primary.label.as_str()
            };
            actions.push(format!("Deploy attack line to {label}"));
        }
        actions.push("Conduct primary search and rescue".to_string());
    } else {
        actions.push("Initiate defensive operations - master streams".to_string());
    }

    actions.push("Establish water supply".to_string());
    if severity >= 4 {
        actions.push("Request ventilation - open roof or positive pressure".to_string());
    }
    actions.push("Account for all personnel - PAR check".to_string());
    actions
}

/// Personnel team brain. Missing severity counts as 5.
pub fn recommend_personnel(
    fire: Option<&FireSeverityReport>,
    structural: Option<&StructuralReport>,
    evacuation: Option<&EvacuationPlan>,
    frame_id: &str,
) -> PersonnelRecommendation {
    let severity = fire
        .and_then(|fire| fire.severity)
        .unwrap_or(DEFAULT_SEVERITY);
    let fire_count = fire.map_or(0, |fire| fire.fire_locations.len());
    let integrity = structural.and_then(|s| s.integrity_score);

    let alarm = alarm_level(severity, fire_count, integrity);
    let firefighters = firefighters_for(alarm);
    tracing::debug!(severity, alarm, firefighters, "personnel recommendation");

    PersonnelRecommendation {
        firefighters,
        trucks: trucks_for(alarm),
        equipment: equipment_for(firefighters, fire, structural),
        eta_containment_min: containment_eta_minutes(severity, alarm, fire_count),
        strategy: strategy_for(severity, structural, evacuation),
        alarm_level: alarm,
        staging_location: STAGING_LOCATION.to_string(),
        priority_actions: priority_actions_for(severity, fire, structural),
        frame_id: Some(frame_id.to_string()),
        timestamp: Some(super::now_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{BlockageSeverity, CollapseRisk, SmokeDensity};

    #[test]
    fn test_major_incident_escalates() {
        let fire = FireSeverityReport::default()
            .with_severity(9)
            .with_location("Room 201", 0.9)
            .with_location("Room 202", 0.8)
            .with_location("Hallway B", 0.6);
        let structural = StructuralReport::default().with_integrity(3);
        let rec = recommend_personnel(Some(&fire), Some(&structural), None, "f");

        assert!(rec.alarm_level >= 4);
        assert!(rec.firefighters >= 28);
        assert_eq!(rec.alarm_level, 5);
        assert_eq!(rec.firefighters, 40);
        assert_eq!(rec.trucks.len(), 5);
        assert_eq!(rec.equipment[0].quantity, 40);
    }

    #[test]
    fn test_minor_incident_stays_small() {
        let fire = FireSeverityReport::default()
            .with_severity(2)
            .with_location("Room 101", 0.2);
        let structural = StructuralReport::default().with_integrity(9);
        let rec = recommend_personnel(Some(&fire), Some(&structural), None, "f");

        assert!(rec.alarm_level <= 2);
        assert!(rec.firefighters <= 10);
        assert_eq!(rec.strategy, "Offensive interior attack, establish water supply from nearest hydrant");
        assert_eq!(
            rec.priority_actions,
            vec![
                "Establish incident command",
                "Deploy attack line to Room 101",
                "Conduct primary search and rescue",
                "Establish water supply",
                "Account for all personnel - PAR check",
            ]
        );
        assert_eq!(rec.eta_containment_min, 6);
    }

    #[test]
    fn test_missing_context_defaults_to_working_fire() {
        let rec = recommend_personnel(None, None, None, "f");
        assert_eq!(rec.alarm_level, 2);
        assert_eq!(rec.firefighters, 10);
        assert_eq!(rec.eta_containment_min, 13);
        assert_eq!(rec.staging_location, STAGING_LOCATION);
    }

    #[test]
    fn test_scenario_equipment_and_collapse_strategy() {
        let fire = FireSeverityReport::default()
            .with_severity(6)
            .with_smoke(SmokeDensity::ZeroVisibility);
        let structural = StructuralReport::default()
            .with_collapse_risk(CollapseRisk::High)
            .with_blocked("Stairwell A", "debris", BlockageSeverity::Complete);
        let rec = recommend_personnel(Some(&fire), Some(&structural), None, "f");

        let items: Vec<&str> = rec.equipment.iter().map(|e| e.item.as_str()).collect();
        assert!(items.contains(&"positive_pressure_ventilator"));
        assert!(items.contains(&"shoring_equipment"));
        assert!(rec.strategy.contains("WARNING: collapse risk"));
        assert!(rec.strategy.ends_with("avoid blocked passages: Stairwell A"));
        assert_eq!(
            rec.priority_actions[1],
            "Establish collapse zone - no interior operations"
        );
    }

    #[test]
    fn test_containment_eta_floor_and_scaling() {
        assert_eq!(containment_eta_minutes(0, 1, 0), 5);
        assert_eq!(containment_eta_minutes(7, 3, 1), 16);
        assert_eq!(containment_eta_minutes(10, 5, 4), 22);
    }

    #[test]
    fn test_out_of_range_severity_saturates() {
        assert_eq!(containment_eta_minutes(u32::MAX, 5, 0), u32::MAX);
        assert_eq!(alarm_level(u32::MAX, 0, None), 5);
    }
}
