//! Per-connection outgoing queues
//!
//! Deliveries are encoded once and queued on every recipient's channel.
//! Queuing never blocks, so the room session can push while it still holds
//! a room lock; a writer task per stream drains its queue in order.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::game::state::EntityId;
use crate::net::protocol::encode;
use crate::net::room_session::Delivery;

/// One encoded message, shared by every recipient
pub type Frame = Arc<[u8]>;

/// Outgoing queue for each connected entity
#[derive(Default)]
pub struct Outbox {
    queues: RwLock<HashMap<EntityId, UnboundedSender<Frame>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh queue for `id`. A previous queue is closed, which ends
    /// the writer draining it.
    pub fn register(&self, id: EntityId) -> UnboundedReceiver<Frame> {
        let (tx, rx) = unbounded_channel();
        self.queues.write().insert(id, tx);
        rx
    }

    pub fn unregister(&self, id: EntityId) {
        self.queues.write().remove(&id);
    }

    /// Encode `delivery` and queue it for each recipient with an open queue.
    ///
    /// Returns how many queues took the frame.
    pub fn push(&self, delivery: Delivery) -> usize {
        let frame: Frame = match encode(&delivery.message) {
            Ok(payload) => payload.into(),
            Err(e) => {
                tracing::warn!("Failed to encode {}: {}", delivery.message.kind(), e);
                return 0;
            }
        };

        let queues = self.queues.read();
        delivery
            .to
            .iter()
            .filter_map(|id| queues.get(id))
            .filter(|tx| tx.send(frame.clone()).is_ok())
            .count()
    }
}
