//! Typed store events.
//!
//! Subscribers get their own [`broadcast::Receiver`]. Publishing with no
//! subscribers is not an error; a subscriber that falls more than the channel
//! capacity behind sees `RecvError::Lagged` and skips ahead.

use tokio::sync::broadcast;
use tracing::trace;

use stealth_core::OrderId;

/// Default number of buffered events per subscriber.
pub const EVENT_CAPACITY: usize = 64;

/// Something observable changed in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Cart contents changed; `item_count` is the new sum of quantities.
    CartChanged { item_count: u32 },
    /// A user logged in, logged out or was restored.
    SessionChanged,
    /// An order was accepted by the server.
    OrderPlaced { order_id: OrderId },
}

/// Fan-out of [`StoreEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Publish to every current subscriber.
    pub fn publish(&self, event: StoreEvent) {
        trace!(?event, subscribers = self.sender.receiver_count(), "Publishing store event");
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(StoreEvent::CartChanged { item_count: 2 });
        bus.publish(StoreEvent::SessionChanged);

        assert_eq!(rx.recv().await.unwrap(), StoreEvent::CartChanged { item_count: 2 });
        assert_eq!(rx.recv().await.unwrap(), StoreEvent::SessionChanged);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(0);
        bus.publish(StoreEvent::OrderPlaced {
            order_id: OrderId::new("o1"),
        });
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
