//! Team result schemas
//!
//! One fixed JSON shape per stage. Vision output is free text, so every
//! field is defaulted and qualitative levels fall back to an `Unknown`
//! variant instead of failing the whole result.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

mod evacuation;
mod fire;
mod personnel;
mod structural;

pub use evacuation::{CivilianRoute, EvacuationPlan, FirefighterRoute, RoomRisk};
pub use fire::{FireLocation, FireSeverityReport, FuelSource, SmokeDensity};
pub use personnel::{EquipmentItem, PersonnelRecommendation, TruckAssignment};
pub use structural::{
    BlockageSeverity, BlockedPassage, CollapseRisk, DegradationTimeline, StructuralObject,
    StructuralReport,
};

/// Lower-cased label used by the fuzzy room matcher.
pub(crate) fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Integer score that also accepts floats (rounded) and numeric strings.
/// Anything else reads as absent rather than failing the whole result.
pub(crate) fn lenient_score<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(score_from_value))
}

fn score_from_value(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(number.round().min(f64::from(u32::MAX)) as u32)
}
