//! Live simulation updates.
//!
//! Every store write is mirrored as a [`SimulationEvent`] on the bus:
//! `status`, `frames`, `<team>` (a published consensus) and
//! `team_status:<team>`. Watchers such as a dashboard follow one run through
//! [`SimulationFeed`]; the store stays authoritative, so a lagging watcher
//! skips ahead and re-reads the store instead of failing.

use async_trait::async_trait;
use tokio::sync::broadcast;

use orca_core::store::{SimulationEvent, StoreError};

/// Matches `store.event_capacity` in the default config.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: SimulationEvent) -> Result<(), StoreError>;

    /// Receiver for every simulation's events.
    fn subscribe(&self) -> broadcast::Receiver<SimulationEvent>;

    /// Receiver limited to one simulation.
    fn watch(&self, simulation_id: &str) -> SimulationFeed {
        SimulationFeed::new(simulation_id, self.subscribe())
    }
}

/// In-process bus over a tokio broadcast channel.
pub struct BroadcastEventBus {
    tx: broadcast::Sender<SimulationEvent>,
    capacity: usize,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn watchers(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn publish(&self, event: SimulationEvent) -> Result<(), StoreError> {
        // a send error only means nobody is watching
        let _ = self.tx.send(event);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SimulationEvent> {
        self.tx.subscribe()
    }
}

/// Events of a single simulation, in publish order.
pub struct SimulationFeed {
    simulation_id: String,
    rx: broadcast::Receiver<SimulationEvent>,
    missed: u64,
}

impl SimulationFeed {
    fn new(simulation_id: &str, rx: broadcast::Receiver<SimulationEvent>) -> Self {
        Self {
            simulation_id: simulation_id.to_string(),
            rx,
            missed: 0,
        }
    }

    pub fn simulation_id(&self) -> &str {
        &self.simulation_id
    }

    /// Events dropped because this feed fell behind the channel capacity.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// Next event for this simulation, or `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<SimulationEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.simulation_id == self.simulation_id => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.missed += skipped;
                    tracing::warn!(
                        simulation_id = %self.simulation_id,
                        skipped,
                        "simulation feed lagged, events dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
