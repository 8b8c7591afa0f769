use serde::{Deserialize, Serialize};

use super::lenient_score;

/// Qualitative smoke density reported by the fire team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokeDensity {
    #[default]
    None,
    Light,
    Moderate,
    Heavy,
    ZeroVisibility,
    #[serde(other)]
    Unknown,
}

impl SmokeDensity {
    /// Smoke risk in `[0, 1]`.
    pub fn risk(self) -> f64 {
        match self {
            SmokeDensity::None | SmokeDensity::Unknown => 0.0,
            SmokeDensity::Light => 0.2,
            SmokeDensity::Moderate => 0.5,
            SmokeDensity::Heavy => 0.8,
            SmokeDensity::ZeroVisibility => 1.0,
        }
    }

    pub fn is_heavy(self) -> bool {
        matches!(self, SmokeDensity::Heavy | SmokeDensity::ZeroVisibility)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireLocation {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub intensity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl FireLocation {
    pub fn new(label: impl Into<String>, intensity: f64) -> Self {
        Self {
            label: label.into(),
            intensity,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelSource {
    #[serde(default)]
    pub material: String,
    /// `low | medium | high`
    #[serde(default = "default_flammability")]
    pub flammability: String,
    #[serde(default)]
    pub location_label: String,
}

fn default_flammability() -> String {
    "medium".to_string()
}

impl FuelSource {
    pub fn new(
        material: impl Into<String>,
        flammability: impl Into<String>,
        location_label: impl Into<String>,
    ) -> Self {
        Self {
            material: material.into(),
            flammability: flammability.into(),
            location_label: location_label.into(),
        }
    }
}

/// Output of the fire severity team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireSeverityReport {
    /// 0 = no fire, 10 = flashover.
    #[serde(default, deserialize_with = "lenient_score")]
    pub severity: Option<u32>,
    #[serde(default)]
    pub fire_locations: Vec<FireLocation>,
    #[serde(default)]
    pub fuel_sources: Vec<FuelSource>,
    #[serde(default)]
    pub smoke_density: SmokeDensity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl FireSeverityReport {
    pub fn with_severity(mut self, severity: u32) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_location(mut self, label: impl Into<String>, intensity: f64) -> Self {
        self.fire_locations.push(FireLocation::new(label, intensity));
        self
    }

    pub fn with_fuel(
        mut self,
        material: impl Into<String>,
        flammability: impl Into<String>,
        location_label: impl Into<String>,
    ) -> Self {
        self.fuel_sources
            .push(FuelSource::new(material, flammability, location_label));
        self
    }

    pub fn with_smoke(mut self, smoke: SmokeDensity) -> Self {
        self.smoke_density = smoke;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fire_report_tolerates_sparse_vision_output() {
        let report: FireSeverityReport = serde_json::from_value(json!({
            "fire_locations": [{"label": "Room 201"}],
            "fuel_sources": [{"material": "paper", "location_label": "Room 201"}],
            "smoke_density": "thick"
        }))
        .unwrap();

        assert_eq!(report.severity, None);
        assert_eq!(report.fire_locations[0].intensity, 0.0);
        assert_eq!(report.fuel_sources[0].flammability, "medium");
        assert_eq!(report.smoke_density, SmokeDensity::Unknown);
    }
}
