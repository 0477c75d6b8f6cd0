//! Transactional reveal logic.
//!
//! [`RevealEngine`] is the only code path that mutates view counts, inserts
//! comments and flips `is_revealed`. Each operation runs under a row lock on
//! the artwork and notifies only after its transaction commits.

pub mod reveal;

pub use reveal::{CommentOutcome, RevealEngine, ViewOutcome, ViewerInfo};
