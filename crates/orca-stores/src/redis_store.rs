//! StateStore Redis implementation.
//!
//! Key layout per simulation:
//! - `{prefix}:{id}:status` / `:frames` / `:{team}` plain values
//! - `{prefix}:{id}:team_status` hash of team -> status
//! - `{prefix}:{id}:consensus:{team}` list of instance results
//! - `{prefix}:{id}:updates` pub/sub channel

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;

use orca_core::store::{InstanceRecord, SimulationEvent, StateStore, StoreError};
use orca_core::types::{SimulationStatus, TeamResult, TeamStatus, TeamType};

use crate::event_bus::{BroadcastEventBus, EventBus};

fn connection_error(e: redis::RedisError) -> StoreError {
    StoreError::Connection(e.to_string())
}

/// Redis implementation for shared multi-process state.
pub struct RedisStateStore {
    client: redis::Client,
    key_prefix: String,
    bus: Arc<dyn EventBus>,
}

impl RedisStateStore {
    /// Create a new Redis state store from a connection URL.
    pub fn new(connection_url: &str, key_prefix: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_bus(
            connection_url,
            key_prefix,
            Arc::new(BroadcastEventBus::default()),
        )
    }

    pub fn with_bus(
        connection_url: &str,
        key_prefix: impl Into<String>,
        bus: Arc<dyn EventBus>,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(connection_url).map_err(connection_error)?;
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
            bus,
        })
    }

    pub fn event_bus(&self) -> Arc<dyn EventBus> {
        self.bus.clone()
    }

    fn key(&self, simulation_id: &str, suffix: &str) -> String {
        format!("{}:{}:{}", self.key_prefix, simulation_id, suffix)
    }

    fn consensus_key(&self, simulation_id: &str, team: TeamType) -> String {
        self.key(simulation_id, &format!("consensus:{team}"))
    }

    fn updates_channel(&self, simulation_id: &str) -> String {
        self.key(simulation_id, "updates")
    }

    /// Every key a simulation can own.
    fn simulation_keys(&self, simulation_id: &str) -> Vec<String> {
        let mut keys = vec![
            self.key(simulation_id, "status"),
            self.key(simulation_id, "frames"),
            self.key(simulation_id, "team_status"),
        ];
        for team in TeamType::EXECUTION_ORDER {
            keys.push(self.key(simulation_id, team.as_str()));
            keys.push(self.consensus_key(simulation_id, team));
        }
        keys
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(connection_error)
    }

    /// Publish on the redis channel and the local bus.
    async fn notify(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        event: SimulationEvent,
    ) -> Result<(), StoreError> {
        let payload = serde_json::json!({ "event": event.event, "data": event.data });
        let channel = self.updates_channel(&event.simulation_id);
        conn.publish::<_, _, ()>(channel, payload.to_string())
            .await
            .map_err(connection_error)?;
        self.bus.publish(event).await
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn set_status(
        &self,
        simulation_id: &str,
        status: SimulationStatus,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(self.key(simulation_id, "status"), status.as_str())
            .await
            .map_err(connection_error)?;
        self.notify(&mut conn, SimulationEvent::status(simulation_id, status))
            .await
    }

    async fn status(&self, simulation_id: &str) -> Result<Option<SimulationStatus>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(self.key(simulation_id, "status"))
            .await
            .map_err(connection_error)?;
        raw.map(|s| s.parse().map_err(StoreError::Serialization))
            .transpose()
    }

    async fn set_frames(&self, simulation_id: &str, frames: &[String]) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(frames)?;
        conn.set::<_, _, ()>(self.key(simulation_id, "frames"), payload)
            .await
            .map_err(connection_error)?;
        self.notify(&mut conn, SimulationEvent::frames(simulation_id, frames))
            .await
    }

    async fn frames(&self, simulation_id: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(self.key(simulation_id, "frames"))
            .await
            .map_err(connection_error)?;
        match raw {
            Some(s) => Ok(serde_json::from_str(&s)?),
            None => Ok(Vec::new()),
        }
    }

    async fn set_team_result(
        &self,
        simulation_id: &str,
        team: TeamType,
        result: &TeamResult,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(result)?;
        conn.set::<_, _, ()>(self.key(simulation_id, team.as_str()), payload)
            .await
            .map_err(connection_error)?;
        self.notify(
            &mut conn,
            SimulationEvent::team_result(simulation_id, team, result),
        )
        .await
    }

    async fn team_result(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<Option<TeamResult>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(self.key(simulation_id, team.as_str()))
            .await
            .map_err(connection_error)?;
        raw.map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .transpose()
    }

    async fn set_team_status(
        &self,
        simulation_id: &str,
        team: TeamType,
        status: TeamStatus,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.hset::<_, _, _, ()>(
            self.key(simulation_id, "team_status"),
            team.as_str(),
            status.as_str(),
        )
        .await
        .map_err(connection_error)?;
        self.notify(
            &mut conn,
            SimulationEvent::team_status(simulation_id, team, status),
        )
        .await
    }

    async fn team_statuses(
        &self,
        simulation_id: &str,
    ) -> Result<BTreeMap<TeamType, TeamStatus>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: HashMap<String, String> = conn
            .hgetall(self.key(simulation_id, "team_status"))
            .await
            .map_err(connection_error)?;
        let mut statuses = BTreeMap::new();
        for team in TeamType::EXECUTION_ORDER {
            let status = match raw.get(team.as_str()) {
                Some(s) => s.parse().map_err(StoreError::Serialization)?,
                None => TeamStatus::default(),
            };
            statuses.insert(team, status);
        }
        Ok(statuses)
    }

    async fn push_instance_result(
        &self,
        simulation_id: &str,
        team: TeamType,
        record: &InstanceRecord,
    ) -> Result<usize, StoreError> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(record)?;
        conn.rpush(self.consensus_key(simulation_id, team), payload)
            .await
            .map_err(connection_error)
    }

    async fn instance_results(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<Vec<InstanceRecord>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Vec<String> = conn
            .lrange(self.consensus_key(simulation_id, team), 0, -1)
            .await
            .map_err(connection_error)?;
        raw.iter()
            .map(|s| serde_json::from_str(s).map_err(StoreError::from))
            .collect()
    }

    async fn clear_instance_results(
        &self,
        simulation_id: &str,
        team: TeamType,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(self.consensus_key(simulation_id, team))
            .await
            .map_err(connection_error)
    }

    async fn cleanup(&self, simulation_id: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let deleted: u64 = conn
            .del(self.simulation_keys(simulation_id))
            .await
            .map_err(connection_error)?;
        tracing::debug!(simulation_id = %simulation_id, deleted, "simulation keys removed");
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let store = RedisStateStore::new("redis://127.0.0.1/", "simulation").unwrap();
        assert_eq!(store.key("abc", "status"), "simulation:abc:status");
        assert_eq!(
            store.consensus_key("abc", TeamType::Evacuation),
            "simulation:abc:consensus:evacuation"
        );
        assert_eq!(store.updates_channel("abc"), "simulation:abc:updates");

        let keys = store.simulation_keys("abc");
        assert_eq!(keys.len(), 11);
        assert!(keys.contains(&"simulation:abc:fire_severity".to_string()));
    }

    #[test]
    fn test_invalid_url_is_connection_error() {
        assert!(matches!(
            RedisStateStore::new("not a url", "simulation"),
            Err(StoreError::Connection(_))
        ));
    }
}
