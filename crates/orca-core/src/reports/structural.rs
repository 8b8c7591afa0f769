use serde::{Deserialize, Serialize};

use super::lenient_score;

/// Qualitative collapse risk reported by the structural team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapseRisk {
    #[default]
    None,
    Low,
    Moderate,
    High,
    Imminent,
    #[serde(other)]
    Unknown,
}

impl CollapseRisk {
    /// Structural risk floor applied to every room.
    pub fn floor(self) -> f64 {
        match self {
            CollapseRisk::None | CollapseRisk::Unknown => 0.0,
            CollapseRisk::Low => 0.1,
            CollapseRisk::Moderate => 0.3,
            CollapseRisk::High => 0.7,
            CollapseRisk::Imminent => 1.0,
        }
    }

    pub fn is_severe(self) -> bool {
        matches!(self, CollapseRisk::High | CollapseRisk::Imminent)
    }

    pub fn is_compromised(self) -> bool {
        matches!(
            self,
            CollapseRisk::Moderate | CollapseRisk::High | CollapseRisk::Imminent
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockageSeverity {
    #[default]
    Partial,
    Complete,
    #[serde(other)]
    Unknown,
}

impl BlockageSeverity {
    pub fn is_complete(self) -> bool {
        self == BlockageSeverity::Complete
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedPassage {
    #[serde(default)]
    pub passage: String,
    /// `fire | debris | structural_failure | smoke`
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub severity: BlockageSeverity,
}

impl BlockedPassage {
    pub fn new(
        passage: impl Into<String>,
        reason: impl Into<String>,
        severity: BlockageSeverity,
    ) -> Self {
        Self {
            passage: passage.into(),
            reason: reason.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralObject {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub location_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradationTimeline {
    #[serde(default)]
    pub minutes_to_concern: Option<u32>,
    #[serde(default)]
    pub minutes_to_critical: Option<u32>,
    #[serde(default)]
    pub factors: Vec<String>,
}

/// Output of the structural team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralReport {
    #[serde(default)]
    pub objects: Vec<StructuralObject>,
    /// 10 = fully sound, 1-3 = collapse risk.
    #[serde(default, deserialize_with = "lenient_score")]
    pub integrity_score: Option<u32>,
    #[serde(default)]
    pub blocked_passages: Vec<BlockedPassage>,
    #[serde(default)]
    pub collapse_risk: CollapseRisk,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation_timeline: Option<DegradationTimeline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl StructuralReport {
    pub fn with_integrity(mut self, score: u32) -> Self {
        self.integrity_score = Some(score);
        self
    }

    pub fn with_collapse_risk(mut self, risk: CollapseRisk) -> Self {
        self.collapse_risk = risk;
        self
    }

    pub fn with_blocked(
        mut self,
        passage: impl Into<String>,
        reason: impl Into<String>,
        severity: BlockageSeverity,
    ) -> Self {
        self.blocked_passages
            .push(BlockedPassage::new(passage, reason, severity));
        self
    }
}
