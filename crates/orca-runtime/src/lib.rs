//! # ORCA Runtime
//!
//! Hybrid parallel execution of the four analysis teams.
//!
//! This crate provides:
//! - VisionBackend capability and team dispatch with fallback results
//! - AgentInstance / Team two-phase protocol with upstream polling
//! - Consensus across redundant instances
//! - Orchestrator for hybrid and sequential runs
//! - Bootstrap from `orca.yaml`

mod agent;
mod analyzer;
mod backend;
mod bootstrap;
mod consensus;
mod orchestrator;
mod team;

pub use agent::{instance_confidence, AgentInstance};
pub use analyzer::TeamAnalyzer;
pub use backend::{BackendError, OfflineVisionBackend, StaticVisionBackend, VisionBackend};
pub use bootstrap::{init_tracing_if_needed, BootstrapError, RuntimeApp};
pub use consensus::{compute_consensus, AGREEMENT_SCORE, DEFAULT_CONFIDENCE};
pub use orchestrator::{ActiveSimulation, FullAnalysis, Orchestrator, OrchestratorError, RunMode};
pub use team::{Team, TeamSchedule};

// Re-export core types for convenience
pub use orca_core::prelude::*;
