//! Broadcast bus delivering framework events to subscribers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::event::FrameworkEvent;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting events to all subscribers.
///
/// Publishing is synchronous and never blocks; a receiver that falls more
/// than the channel capacity behind loses the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<FrameworkEvent>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the given capacity (at least 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of receivers the event was delivered to. Having no
    /// receivers is not an error.
    pub fn publish(&self, event: FrameworkEvent) -> usize {
        let event_type = event.event_type();
        match self.sender.send(Arc::new(event)) {
            Ok(count) => {
                trace!(event_type, receiver_count = count, "Event published");
                count
            },
            Err(_) => {
                trace!(event_type, "No receivers for event");
                0
            },
        }
    }

    /// Subscribe to all events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for events from the event bus.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<FrameworkEvent>>,
}

impl EventReceiver {
    /// Receive the next event.
    ///
    /// Lagged events are skipped with a warning. Returns `None` once every
    /// bus handle has been dropped and the queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<FrameworkEvent>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<FrameworkEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }

    /// Drain every event currently queued.
    pub fn drain(&mut self) -> Vec<Arc<FrameworkEvent>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atto_core::BundleId;

    fn started(id: u64) -> FrameworkEvent {
        FrameworkEvent::BundleStarted {
            bundle_id: BundleId::new(id),
        }
    }

    #[tokio::test]
    async fn publish_and_receive_in_order() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        assert_eq!(bus.publish(started(1)), 1);
        assert_eq!(bus.publish(started(2)), 1);

        assert_eq!(*receiver.recv().await.unwrap(), started(1));
        assert_eq!(*receiver.recv().await.unwrap(), started(2));
    }

    #[test]
    fn publishing_without_receivers_is_fine() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(FrameworkEvent::FrameworkStarted), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn clones_share_the_channel() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        let clone = bus.clone();
        clone.publish(FrameworkEvent::FrameworkStopped);
        assert_eq!(
            receiver.try_recv().map(|e| e.event_type()),
            Some("framework_stopped")
        );
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn lagging_receiver_keeps_newest_events() {
        let bus = EventBus::with_capacity(2);
        let mut receiver = bus.subscribe();
        for id in 1..=4 {
            bus.publish(started(id));
        }
        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(*events[0], started(3));
        assert_eq!(*events[1], started(4));
    }

    #[tokio::test]
    async fn recv_ends_when_bus_is_dropped() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        drop(bus);
        assert!(receiver.recv().await.is_none());
    }
}
