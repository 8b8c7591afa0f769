//! Agent instance
//!
//! One redundant worker of a team. Runs the two-phase protocol: an
//! independent pass over each frame, then a merge with upstream context.

use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use serde_json::{json, Value};

use orca_core::types::{AgentStatus, TeamResult, TeamType, UpstreamContext};

use crate::analyzer::TeamAnalyzer;

pub struct AgentInstance {
    instance_id: String,
    team: TeamType,
    status: AgentStatus,
    analyzer: Arc<TeamAnalyzer>,
}

impl AgentInstance {
    pub fn new(team: TeamType, index: usize, analyzer: Arc<TeamAnalyzer>) -> Self {
        Self {
            instance_id: format!("{}_{}", team, index),
            team,
            status: AgentStatus::Idle,
            analyzer,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn team(&self) -> TeamType {
        self.team
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Phase 1: one result per frame, derived from the frame alone.
    pub async fn analyze_independent(&mut self, frames: &[String]) -> Vec<TeamResult> {
        self.status = AgentStatus::AnalyzingIndependent;
        let this = &*self;
        join_all(frames.iter().map(|frame| this.independent_for_frame(frame))).await
    }

    async fn independent_for_frame(&self, frame: &str) -> TeamResult {
        let mut result = TeamResult::new();
        match self.team {
            TeamType::FireSeverity | TeamType::Structural => {
                // no upstream yet: structural runs without fire context
                let empty = UpstreamContext::new();
                result = self.analyzer.analyze_vision(frame, self.team, &empty).await;
            }
            TeamType::Evacuation => {
                let exits: Vec<Value> = self
                    .analyzer
                    .rooms()
                    .iter()
                    .filter(|room| room.is_exterior)
                    .map(|room| json!({"exit_id": room.name, "has_stairwell": room.has_stairwell}))
                    .collect();
                result.insert(
                    "independent_analysis".to_string(),
                    json!({
                        "exits_identified": exits,
                        "rooms_mapped": self.analyzer.rooms().len(),
                        "spatial_graph_built": true,
                    }),
                );
            }
            TeamType::Personnel => {
                result.insert(
                    "independent_analysis".to_string(),
                    json!({
                        "scene_type": "structure_fire",
                        "estimated_building_size": "medium",
                        "baseline_response": "2-alarm",
                    }),
                );
            }
        }
        // instance fields win over anything the backend reported
        result.extend(self.base(frame));
        result
    }

    /// Phase 2: fold upstream context into each independent result.
    pub async fn merge_upstream(
        &mut self,
        independent: Vec<TeamResult>,
        upstream: &UpstreamContext,
    ) -> Vec<TeamResult> {
        self.status = AgentStatus::Merging;
        let mut merged = Vec::with_capacity(independent.len());
        for result in independent {
            merged.push(self.merge_one(result, upstream).await);
        }
        self.status = AgentStatus::Complete;
        merged
    }

    async fn merge_one(&self, mut result: TeamResult, upstream: &UpstreamContext) -> TeamResult {
        result.insert(
            "merge_timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        result.insert("phase".to_string(), Value::String("merged".to_string()));

        let fire_used = upstream.contains(TeamType::FireSeverity);
        let structural_used = upstream.contains(TeamType::Structural);
        match self.team {
            TeamType::FireSeverity => {}
            TeamType::Structural => {
                result.insert("fire_context_used".to_string(), Value::Bool(fire_used));
            }
            TeamType::Evacuation => {
                let frame = frame_of(&result);
                let plan = self.analyzer.analyze(&frame, self.team, upstream).await;
                absorb(&mut result, plan);
                result.insert("fire_context_used".to_string(), Value::Bool(fire_used));
                result.insert(
                    "structural_context_used".to_string(),
                    Value::Bool(structural_used),
                );
            }
            TeamType::Personnel => {
                let frame = frame_of(&result);
                let recommendation = self.analyzer.analyze(&frame, self.team, upstream).await;
                absorb(&mut result, recommendation);
                result.insert(
                    "context_sources".to_string(),
                    json!({
                        "fire_severity_used": fire_used,
                        "structural_used": structural_used,
                        "evacuation_used": upstream.contains(TeamType::Evacuation),
                    }),
                );
            }
        }
        result
    }

    fn base(&self, frame: &str) -> TeamResult {
        let mut base = TeamResult::new();
        base.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        base.insert("confidence".to_string(), json!(instance_confidence(&self.instance_id)));
        base.insert("frame_refs".to_string(), json!([frame]));
        base.insert("phase".to_string(), Value::String("independent".to_string()));
        base
    }
}

/// `0.85 + (hash % 10) / 100`, stable across runs and platforms.
pub fn instance_confidence(instance_id: &str) -> f64 {
    0.85 + (stable_hash(instance_id) % 10) as f64 / 100.0
}

// FNV-1a
fn stable_hash(value: &str) -> u64 {
    value.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Per-instance keys that a team brain's output never replaces.
const INSTANCE_FIELDS: [&str; 5] = [
    "timestamp",
    "confidence",
    "frame_refs",
    "phase",
    "merge_timestamp",
];

fn absorb(result: &mut TeamResult, analysis: TeamResult) {
    for (key, value) in analysis {
        if !INSTANCE_FIELDS.contains(&key.as_str()) {
            result.insert(key, value);
        }
    }
}

fn frame_of(result: &TeamResult) -> String {
    result
        .get("frame_refs")
        .and_then(Value::as_array)
        .and_then(|refs| refs.first())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
