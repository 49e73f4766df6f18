//! `GossipHandle` adapter backed by the shared event bus.
//!
//! The mempool never talks to peer gossip directly (§1 Out of scope); it
//! publishes onto `shared_bus::InMemoryEventBus` and a future peer-gossip
//! subsystem subscribes to `EventTopic::Mempool`.

use std::sync::Arc;

use async_trait::async_trait;
use shared_bus::{BlockchainEvent, EventPublisher};

use crate::domain::entities::Transaction;
use crate::ports::outbound::GossipHandle;

/// Publishes `TxBroadcast` events onto a shared `EventPublisher`.
pub struct BusGossipHandle<P> {
    bus: Arc<P>,
}

impl<P> BusGossipHandle<P> {
    /// Wraps a shared event bus.
    #[must_use]
    pub fn new(bus: Arc<P>) -> Self {
        Self { bus }
    }
}

impl<P> Clone for BusGossipHandle<P> {
    fn clone(&self) -> Self {
        Self { bus: Arc::clone(&self.bus) }
    }
}

#[async_trait]
impl<P: EventPublisher + Send + Sync + 'static> GossipHandle for BusGossipHandle<P> {
    async fn broadcast(&self, tx: Transaction) {
        self.bus.publish(BlockchainEvent::TxBroadcast { tx }).await;
    }
}
