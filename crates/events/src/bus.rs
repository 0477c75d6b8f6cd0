//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the fan-out hub for [`NotificationEvent`]s. It is shared
//! via `Arc<EventBus>` across the application.

use gallery_core::notification::NotificationEvent;
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`NotificationEvent`].
pub struct EventBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it. With no
    /// subscribers the event is dropped and `0` is returned.
    pub fn publish(&self, event: NotificationEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(dropped)) => {
                tracing::debug!(
                    event_type = dropped.event_type(),
                    artwork_id = dropped.artwork.id,
                    "No subscribers for notification event",
                );
                0
            }
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
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
