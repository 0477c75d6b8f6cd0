//! Notification fan-out.
//!
//! The [`NotificationRouter`] subscribes to the event bus and pushes every
//! [`NotificationEvent`](gallery_core::notification::NotificationEvent) to the
//! WebSocket scopes it addresses.

pub mod router;

pub use router::NotificationRouter;
