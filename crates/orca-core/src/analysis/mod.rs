//! Deterministic team brains
//!
//! - evacuation: route planning from fire and structural results
//! - personnel: NFPA-style deployment recommendation
//! - fallback: canned vision results used when the backend is unavailable

mod evacuation;
mod fallback;
mod personnel;

pub use evacuation::{compute_evacuation_routes, room_risk_scores, SECONDS_PER_ROOM};
pub use fallback::{fallback_fire_severity, fallback_structural};
pub use personnel::{alarm_level, containment_eta_minutes, recommend_personnel, STAGING_LOCATION};

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
