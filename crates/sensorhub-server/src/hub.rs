//! In-process publish/subscribe hub behind the `WebSocket` endpoint.
//!
//! A thin wrapper over [`tokio::sync::broadcast`]. Publishing is
//! fire-and-forget: zero subscribers is not an error, and a subscriber that
//! falls more than [`HUB_CAPACITY`] messages behind receives
//! [`broadcast::error::RecvError::Lagged`] and skips ahead.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::events::HubMessage;

/// Capacity of the broadcast channel.
pub const HUB_CAPACITY: usize = 256;

/// Cloneable handle to the broadcast channel.
#[derive(Debug, Clone)]
pub struct Hub {
    tx: broadcast::Sender<HubMessage>,
}

impl Hub {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    /// Subscribe to every message published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<HubMessage> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish `data` on channel `event`.
    ///
    /// Returns the number of subscribers that received the message.
    pub fn publish<T: Serialize + ?Sized>(&self, event: &str, data: &T) -> usize {
        HubMessage::encode(event, data).map_or_else(
            |e| {
                warn!(event, error = %e, "Failed to encode hub message");
                0
            },
            |msg| self.send(msg),
        )
    }

    /// Publish an already-encoded message.
    pub fn send(&self, msg: HubMessage) -> usize {
        let event = msg.event.clone();
        // send returns Err only when there are zero receivers.
        let receivers = self.tx.send(msg).unwrap_or(0);
        debug!(event = %event, receivers, "Published");
        receivers
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
