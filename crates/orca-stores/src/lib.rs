//! # ORCA Stores
//!
//! Shared state store implementations for the ORCA runtime.
//!
//! This crate provides:
//! - InMemory StateStore
//! - Redis StateStore (keys under `{prefix}:{simulation_id}:*`)
//! - In-process EventBus

mod event_bus;
mod memory;
mod redis_store;

pub use event_bus::{BroadcastEventBus, EventBus, SimulationFeed, DEFAULT_EVENT_CAPACITY};
pub use memory::InMemoryStateStore;
pub use redis_store::RedisStateStore;

// Re-export core traits for convenience
pub use orca_core::store::{InstanceRecord, SimulationEvent, StateStore, StoreError};
