//! Typed publishing front for reveal-related notifications.
//!
//! Callers invoke these only after the database transaction that caused the
//! event has committed, so subscribers never hear about a rolled-back change.

use std::sync::Arc;

use gallery_core::milestones::ViewMilestones;
use gallery_core::notification::{ArtworkRef, NotificationEvent};
use gallery_core::types::DbId;

use crate::bus::EventBus;

/// Publishes [`NotificationEvent`]s onto the shared [`EventBus`].
#[derive(Clone)]
pub struct RevealNotifier {
    bus: Arc<EventBus>,
    milestones: ViewMilestones,
}

impl RevealNotifier {
    pub fn new(bus: Arc<EventBus>, milestones: ViewMilestones) -> Self {
        Self { bus, milestones }
    }

    /// Announce a hidden-to-revealed transition.
    pub fn notify_revealed(&self, artwork: ArtworkRef) {
        tracing::info!(
            artwork_id = artwork.id,
            artist_id = artwork.artist_id,
            "Artwork revealed",
        );
        self.bus.publish(NotificationEvent::artwork_revealed(artwork));
    }

    /// Announce a new comment on an artwork.
    pub fn notify_new_comment(
        &self,
        artwork: ArtworkRef,
        comment_id: DbId,
        author_id: DbId,
        author_name: impl Into<String>,
    ) {
        self.bus.publish(NotificationEvent::new_comment(
            artwork,
            comment_id,
            author_id,
            author_name,
        ));
    }

    /// Announce a view milestone if `view_count` is exactly one of the
    /// configured checkpoints. Returns whether an event was published.
    pub fn notify_view_milestone(&self, artwork: ArtworkRef, view_count: i64) -> bool {
        if !self.milestones.is_milestone(view_count) {
            return false;
        }
        tracing::debug!(artwork_id = artwork.id, view_count, "View milestone reached");
        self.bus
            .publish(NotificationEvent::view_milestone(artwork, view_count));
        true
    }
}

impl std::fmt::Debug for RevealNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealNotifier")
            .field("milestones", &self.milestones)
            .finish_non_exhaustive()
    }
}
