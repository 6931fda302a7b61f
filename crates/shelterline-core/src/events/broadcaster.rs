use std::sync::Arc;

use tokio::sync::broadcast;

use super::types::ShelterEvent;

/// Default buffer size for the broadcast channel. A subscriber that lags
/// past this many events sees `Lagged` and should snapshot instead of
/// trying to catch up.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Broadcaster for shelter state-change events.
///
/// Cloneable and shareable; multiple subscribers receive events from a
/// single sender. The broadcaster is never on the critical path of a
/// storage transaction: services publish only after commit.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ShelterEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new broadcaster with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new broadcaster wrapped in an `Arc` for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received it; 0 with no active
    /// subscribers, which is not an error.
    pub fn send(&self, event: ShelterEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribe to events broadcast after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ShelterEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bed::{BedId, BedStatus};

    #[test]
    fn send_without_subscribers_is_not_an_error() {
        let broadcaster = EventBroadcaster::new();
        assert!(!broadcaster.has_subscribers());
        let delivered = broadcaster.send(ShelterEvent::BedStatusChanged {
            bed_id: BedId::new(1).unwrap(),
            from: BedStatus::Available,
            to: BedStatus::Held,
        });
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let broadcaster = EventBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        let event = ShelterEvent::BedStatusChanged {
            bed_id: BedId::new(7).unwrap(),
            from: BedStatus::Held,
            to: BedStatus::Occupied,
        };
        assert_eq!(broadcaster.send(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }
}
