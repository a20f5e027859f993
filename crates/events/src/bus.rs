//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for
//! [`NotificationEvent`]s. Producers (API handlers, the status aggregator,
//! the offline detector) publish; the fan-out relay and any other
//! consumers subscribe. Designed to be shared via `Arc<EventBus>`.

use tokio::sync::broadcast;

use crate::envelope::NotificationEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Publishing is fire-and-forget: it never blocks, never fails, and
/// delivers at-most-once per subscriber. Events from a single producer
/// reach a given subscriber in publish order; no cross-producer ordering
/// is guaranteed.
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no active subscribers the event is silently dropped; the bus
    /// is never the system of record.
    pub fn publish(&self, event: NotificationEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus from now on. There
    /// is no backlog replay.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
