//! Team dispatch
//!
//! Routes a frame to the brain of one team. Vision teams ask the backend
//! and substitute the canned fallback on failure; evacuation and personnel
//! are computed locally from upstream context.

use std::sync::Arc;

use orca_core::analysis::{
    compute_evacuation_routes, fallback_fire_severity, fallback_structural, recommend_personnel,
};
use orca_core::building::{layout, Room};
use orca_core::types::{to_team_result, TeamResult, TeamType, UpstreamContext};

use crate::backend::VisionBackend;

pub struct TeamAnalyzer {
    backend: Arc<dyn VisionBackend>,
    rooms: Vec<Room>,
}

impl TeamAnalyzer {
    /// Analyzer over the demo floor.
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self::with_layout(backend, layout::demo_floor())
    }

    pub fn with_layout(backend: Arc<dyn VisionBackend>, rooms: Vec<Room>) -> Self {
        Self { backend, rooms }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Full result of `team` for one frame given whatever upstream is known.
    pub async fn analyze(
        &self,
        frame: &str,
        team: TeamType,
        context: &UpstreamContext,
    ) -> TeamResult {
        match team {
            TeamType::FireSeverity | TeamType::Structural => {
                self.analyze_vision(frame, team, context).await
            }
            TeamType::Evacuation => {
                let fire = context.fire_severity();
                let structural = context.structural();
                to_team_result(&compute_evacuation_routes(
                    fire.as_ref(),
                    structural.as_ref(),
                    frame,
                    Some(self.rooms.as_slice()),
                ))
            }
            TeamType::Personnel => {
                let fire = context.fire_severity();
                let structural = context.structural();
                let evacuation = context.evacuation();
                to_team_result(&recommend_personnel(
                    fire.as_ref(),
                    structural.as_ref(),
                    evacuation.as_ref(),
                    frame,
                ))
            }
        }
    }

    /// Vision result for a fire or structural frame, never failing.
    pub async fn analyze_vision(
        &self,
        frame: &str,
        team: TeamType,
        context: &UpstreamContext,
    ) -> TeamResult {
        match self.backend.analyze(frame, team, context).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    team = %team,
                    frame = %frame,
                    backend = %self.backend.name(),
                    error = %e,
                    "vision analysis failed, using fallback result"
                );
                fallback_for(team, frame)
            }
        }
    }
}

fn fallback_for(team: TeamType, frame: &str) -> TeamResult {
    match team {
        TeamType::Structural => to_team_result(&fallback_structural(frame)),
        _ => to_team_result(&fallback_fire_severity(frame)),
    }
}
