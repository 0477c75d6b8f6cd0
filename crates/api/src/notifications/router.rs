//! Event-to-WebSocket routing.

use std::sync::Arc;

use gallery_core::notification::NotificationEvent;
use tokio::sync::broadcast;

use crate::ws::{text_frame, WsManager};

/// Routes notification events to WebSocket channel scopes.
///
/// Delivery is best-effort: a scope with no listeners simply receives
/// nothing, and events are never stored for later.
pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the routing loop until the [`EventBus`](gallery_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<NotificationEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.route_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event to each scope it addresses. Returns the total number
    /// of connections reached.
    pub async fn route_event(&self, event: &NotificationEvent) -> usize {
        let mut delivered = 0;
        for delivery in event.deliveries() {
            let frame = match text_frame(&delivery.message) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        event_type = event.event_type(),
                        "Failed to encode notification"
                    );
                    continue;
                }
            };
            let reached = self.ws_manager.publish(delivery.scope, frame).await;
            tracing::debug!(
                event_type = event.event_type(),
                artwork_id = event.artwork.id,
                scope = %delivery.scope,
                reached,
                "Notification delivered"
            );
            delivered += reached;
        }
        delivered
    }
}
