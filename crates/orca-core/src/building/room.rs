use serde::{Deserialize, Serialize};

/// Fuel load of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl FuelLevel {
    /// Growth-rate multiplier.
    pub fn multiplier(self) -> f64 {
        match self {
            FuelLevel::Low => 1.0,
            FuelLevel::Medium => 1.5,
            FuelLevel::High => 2.5,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(FuelLevel::Low),
            "medium" => Some(FuelLevel::Medium),
            "high" => Some(FuelLevel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FuelLevel::Low => "low",
            FuelLevel::Medium => "medium",
            FuelLevel::High => "high",
        }
    }
}

/// `1 + 10·fire + 5·structural + 3·smoke`
pub fn hazard_weight(fire: f64, structural: f64, smoke: f64) -> f64 {
    1.0 + fire * 10.0 + structural * 5.0 + smoke * 3.0
}

/// A room or zone of the building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    #[serde(default)]
    pub adjacent: Vec<String>,
    #[serde(default)]
    pub fire_intensity: f64,
    #[serde(default)]
    pub structural_risk: f64,
    #[serde(default)]
    pub smoke_risk: f64,
    #[serde(default)]
    pub is_exterior: bool,
    #[serde(default)]
    pub has_stairwell: bool,
    #[serde(default)]
    pub fuel_level: FuelLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_adjacent<I, S>(mut self, adjacent: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.adjacent = adjacent.into_iter().map(Into::into).collect();
        self
    }

    pub fn exterior(mut self) -> Self {
        self.is_exterior = true;
        self
    }

    pub fn stairwell(mut self) -> Self {
        self.has_stairwell = true;
        self
    }

    pub fn with_fuel(mut self, fuel: FuelLevel) -> Self {
        self.fuel_level = fuel;
        self
    }

    pub fn with_fire(mut self, intensity: f64) -> Self {
        self.fire_intensity = intensity;
        self
    }

    pub fn with_structural(mut self, risk: f64) -> Self {
        self.structural_risk = risk;
        self
    }

    pub fn with_smoke(mut self, risk: f64) -> Self {
        self.smoke_risk = risk;
        self
    }

    pub fn on_floor(mut self, floor: u32, room_type: impl Into<String>) -> Self {
        self.floor = Some(floor);
        self.room_type = Some(room_type.into());
        self
    }

    /// Weight of any edge entering this room.
    pub fn hazard_weight(&self) -> f64 {
        hazard_weight(self.fire_intensity, self.structural_risk, self.smoke_risk)
    }

    /// Worst of the three hazard dimensions.
    pub fn combined_risk(&self) -> f64 {
        self.fire_intensity
            .max(self.structural_risk)
            .max(self.smoke_risk)
    }

    pub(crate) fn clamp_hazards(&mut self) {
        self.fire_intensity = super::clamp_unit(self.fire_intensity);
        self.structural_risk = super::clamp_unit(self.structural_risk);
        self.smoke_risk = super::clamp_unit(self.smoke_risk);
    }
}
