//! # ORCA Core
//!
//! Core abstractions and deterministic hazard logic for ORCA.
//!
//! This crate contains:
//! - Team / Simulation / team-result definitions
//! - Building graph model and built-in layouts
//! - Fire spread simulator, route solver and metrics engine
//! - Evacuation and personnel team brains, plus fallback results
//! - The shared state store contract
//!
//! This crate does NOT care about:
//! - How teams are scheduled or run concurrently
//! - Where the shared state actually lives
//! - Which vision model produced a team result

pub mod analysis;
pub mod building;
pub mod error;
pub mod fire;
pub mod metrics;
pub mod reports;
pub mod routing;
pub mod store;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{
        compute_evacuation_routes, fallback_fire_severity, fallback_structural,
        recommend_personnel,
    };
    pub use crate::building::{layout, BuildingGraph, FuelLevel, Room};
    pub use crate::error::RequestError;
    pub use crate::fire::{build_spread_timeline, predict, SpreadPrediction, SpreadTimelineEntry};
    pub use crate::metrics::{MetricsEngine, MetricsSnapshot};
    pub use crate::reports::{
        EvacuationPlan, FireSeverityReport, PersonnelRecommendation, StructuralReport,
    };
    pub use crate::routing::{RiskLevel, RouteResult, RouteSolver};
    pub use crate::store::{InstanceRecord, SimulationEvent, StateStore, StoreError};
    pub use crate::types::{
        AgentStatus, Simulation, SimulationStatus, TeamResult, TeamStatus, TeamType,
        UpstreamContext,
    };
}

// Re-export key types at crate root
pub use building::{BuildingGraph, Room};
pub use error::RequestError;
pub use metrics::{MetricsEngine, MetricsSnapshot};
pub use routing::{RouteResult, RouteSolver};
pub use store::{StateStore, StoreError};
pub use types::{SimulationStatus, TeamResult, TeamStatus, TeamType, UpstreamContext};
