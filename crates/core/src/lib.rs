//! Domain core for the Invisible Art Gallery.
//!
//! Pure, I/O-free building blocks shared by the database, event and API
//! crates: identifiers, the domain error type, reveal-condition evaluation,
//! view milestones, notification events and their wire format, and the
//! content cipher used for hidden artwork bytes.

pub mod artwork;
pub mod content;
pub mod error;
pub mod milestones;
pub mod notification;
pub mod reveal;
pub mod roles;
pub mod types;
