//! WebSocket infrastructure for real-time reveal notifications.
//!
//! Every connection joins exactly one [`ChannelScope`](gallery_core::notification::ChannelScope):
//! an artwork's watcher group or a user's personal channel. The
//! [`NotificationRouter`](crate::notifications::NotificationRouter) publishes
//! into scopes through [`WsManager`].

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::{artwork_ws_handler, notifications_ws_handler};
pub use heartbeat::{start_heartbeat, HEARTBEAT_INTERVAL};
pub use manager::{text_frame, WsManager};
