use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruckAssignment {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: u32,
}

impl TruckAssignment {
    pub fn new(kind: &str, count: u32) -> Self {
        Self {
            kind: kind.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub item: String,
    pub quantity: u32,
    /// `critical | recommended`
    pub priority: String,
}

impl EquipmentItem {
    pub fn new(item: &str, quantity: u32, priority: &str) -> Self {
        Self {
            item: item.to_string(),
            quantity,
            priority: priority.to_string(),
        }
    }
}

/// Output of the personnel team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonnelRecommendation {
    pub firefighters: u32,
    pub trucks: Vec<TruckAssignment>,
    pub equipment: Vec<EquipmentItem>,
    pub eta_containment_min: u32,
    pub strategy: String,
    pub alarm_level: u8,
    pub staging_location: String,
    pub priority_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}
