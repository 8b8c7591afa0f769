//! Vision backend capability
//!
//! A backend turns one frame into a structured team result. Failures are
//! expected and always recovered by the caller with a fallback result.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use orca_core::types::{TeamResult, TeamType, UpstreamContext};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("vision backend unavailable")]
    Unavailable,
    #[error("vision backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn analyze(
        &self,
        frame: &str,
        team: TeamType,
        context: &UpstreamContext,
    ) -> Result<TeamResult, BackendError>;
}

/// Backend with no model behind it. Every call is `Unavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineVisionBackend;

#[async_trait]
impl VisionBackend for OfflineVisionBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn analyze(
        &self,
        _frame: &str,
        _team: TeamType,
        _context: &UpstreamContext,
    ) -> Result<TeamResult, BackendError> {
        Err(BackendError::Unavailable)
    }
}

/// Backend returning fixed results per team, for replaying recorded scenes.
#[derive(Debug, Clone, Default)]
pub struct StaticVisionBackend {
    results: HashMap<TeamType, TeamResult>,
}

impl StaticVisionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, team: TeamType, result: TeamResult) -> Self {
        self.results.insert(team, result);
        self
    }
}

#[async_trait]
impl VisionBackend for StaticVisionBackend {
    fn name(&self) -> &str {
        "static"
    }

    async fn analyze(
        &self,
        _frame: &str,
        team: TeamType,
        _context: &UpstreamContext,
    ) -> Result<TeamResult, BackendError> {
        self.results
            .get(&team)
            .cloned()
            .ok_or_else(|| BackendError::Backend(format!("no recorded result for {}", team)))
    }
}
