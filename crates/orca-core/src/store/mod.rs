//! Store module
//!
//! This module provides the shared state contract:
//! - StateStore: per-simulation status, frames, team results (async trait)
//! - SimulationEvent: the `{event, data}` payload published on every write
//!
//! Note: Implementations are in orca-stores crate

mod state_store;

pub use state_store::{InstanceRecord, SimulationEvent, StateStore};

use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
