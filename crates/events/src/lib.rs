//! In-process notification plumbing for the gallery.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`RevealNotifier`]: typed entry point the reveal engine uses to announce
//!   reveals, new comments and view milestones.
//!
//! Events are transient. Nothing here persists them; a subscriber that is not
//! connected when an event fires never sees it.

pub mod bus;
pub mod notifier;

pub use bus::EventBus;
pub use notifier::RevealNotifier;
