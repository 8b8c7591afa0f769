//! Team - redundant instances of one stage, run with hybrid parallelism.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::time::MissedTickBehavior;

use orca_config::OrchestratorConfig;
use orca_core::store::{InstanceRecord, StateStore, StoreError};
use orca_core::types::{TeamResult, TeamStatus, TeamType, UpstreamContext};

use crate::agent::AgentInstance;
use crate::analyzer::TeamAnalyzer;
use crate::consensus::compute_consensus;

/// Scheduling knobs shared by every team of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamSchedule {
    pub instances_per_team: usize,
    pub poll_interval: Duration,
    pub upstream_timeout: Duration,
}

impl Default for TeamSchedule {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

impl From<&OrchestratorConfig> for TeamSchedule {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            instances_per_team: config.instances_per_team.max(1),
            poll_interval: config.poll_interval(),
            upstream_timeout: config.upstream_timeout(),
        }
    }
}

pub struct Team {
    team: TeamType,
    instances: Vec<AgentInstance>,
    schedule: TeamSchedule,
    consensus: Option<TeamResult>,
}

impl Team {
    pub fn new(team: TeamType, analyzer: Arc<TeamAnalyzer>, schedule: TeamSchedule) -> Self {
        let instances = (0..schedule.instances_per_team.max(1))
            .map(|index| AgentInstance::new(team, index, analyzer.clone()))
            .collect();
        Self {
            team,
            instances,
            schedule,
            consensus: None,
        }
    }

    pub fn team_type(&self) -> TeamType {
        self.team
    }

    pub fn instances(&self) -> &[AgentInstance] {
        &self.instances
    }

    pub fn consensus(&self) -> Option<&TeamResult> {
        self.consensus.as_ref()
    }

    /// Independent phase, upstream wait, merge, consensus, publish.
    ///
    /// Only failures to publish the consensus or the final status are
    /// returned; everything before that degrades instead of failing.
    pub async fn run_hybrid(
        &mut self,
        store: &dyn StateStore,
        simulation_id: &str,
        frames: &[String],
    ) -> Result<TeamResult, StoreError> {
        let team = self.team;
        tracing::info!(simulation_id = %simulation_id, team = %team, "team started");
        store
            .set_team_status(simulation_id, team, TeamStatus::Processing)
            .await?;

        let independent = join_all(
            self.instances
                .iter_mut()
                .map(|instance| instance.analyze_independent(frames)),
        )
        .await;
        tracing::info!(
            simulation_id = %simulation_id,
            team = %team,
            results = independent.iter().map(Vec::len).sum::<usize>(),
            "independent phase complete"
        );

        let upstream = self.wait_for_upstream(store, simulation_id).await;

        if let Err(e) = store.clear_instance_results(simulation_id, team).await {
            tracing::warn!(simulation_id = %simulation_id, team = %team, error = %e, "failed to reset instance results");
        }
        let merged = join_all(
            self.instances
                .iter_mut()
                .zip(independent)
                .map(|(instance, results)| {
                    let upstream = &upstream;
                    async move {
                        let merged = instance.merge_upstream(results, upstream).await;
                        (instance.instance_id().to_string(), merged)
                    }
                }),
        )
        .await;

        let mut finals = Vec::new();
        for (instance_id, results) in merged {
            for result in results {
                let record = InstanceRecord {
                    instance_id: instance_id.clone(),
                    result: result.clone(),
                };
                if let Err(e) = store.push_instance_result(simulation_id, team, &record).await {
                    tracing::warn!(
                        simulation_id = %simulation_id,
                        team = %team,
                        instance_id = %instance_id,
                        error = %e,
                        "failed to record instance result"
                    );
                }
                finals.push(result);
            }
        }
        tracing::debug!(simulation_id = %simulation_id, team = %team, "merge phase complete");

        let consensus = compute_consensus(&finals);
        store.set_team_result(simulation_id, team, &consensus).await?;
        store
            .set_team_status(simulation_id, team, TeamStatus::Complete)
            .await?;
        if let Err(e) = store.clear_instance_results(simulation_id, team).await {
            tracing::warn!(simulation_id = %simulation_id, team = %team, error = %e, "failed to clear instance results");
        }
        tracing::info!(
            simulation_id = %simulation_id,
            team = %team,
            instances = finals.len(),
            "consensus published"
        );

        self.consensus = Some(consensus.clone());
        Ok(consensus)
    }

    /// Poll the store until every dependency has published or the upstream
    /// timeout elapses. Returns whatever subset was found.
    pub async fn wait_for_upstream(
        &self,
        store: &dyn StateStore,
        simulation_id: &str,
    ) -> UpstreamContext {
        let team = self.team;
        let dependencies = team.dependencies();
        let mut context = UpstreamContext::new();
        if dependencies.is_empty() {
            return context;
        }

        tracing::info!(
            simulation_id = %simulation_id,
            team = %team,
            dependencies = ?dependencies,
            "waiting for upstream"
        );

        let poll = async {
            let mut ticker = tokio::time::interval(self.schedule.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for dependency in dependencies {
                    if context.contains(*dependency) {
                        continue;
                    }
                    match store.team_result(simulation_id, *dependency).await {
                        Ok(Some(result)) => {
                            tracing::info!(
                                simulation_id = %simulation_id,
                                team = %team,
                                upstream = %dependency,
                                "upstream received"
                            );
                            context.insert(*dependency, result);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(
                                simulation_id = %simulation_id,
                                team = %team,
                                upstream = %dependency,
                                error = %e,
                                "upstream read failed"
                            );
                        }
                    }
                }
                if dependencies.iter().all(|d| context.contains(*d)) {
                    break;
                }
            }
        };

        let timed_out = tokio::time::timeout(self.schedule.upstream_timeout, poll)
            .await
            .is_err();
        if timed_out {
            tracing::warn!(
                simulation_id = %simulation_id,
                team = %team,
                received = context.len(),
                expected = dependencies.len(),
                "upstream timeout, proceeding with partial context"
            );
        }
        context
    }
}
