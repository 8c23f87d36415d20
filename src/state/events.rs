use tokio::sync::broadcast;

use crate::dto::game::SessionEvent;

/// Default capacity of the session event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Broadcast hub fanning session events out to every subscriber.
///
/// Cloning the hub shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
