//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods that only ever run inside the reveal transaction take
//! `&mut PgConnection`; methods used from both contexts accept any
//! [`sqlx::PgExecutor`] so callers can pass `&PgPool` or `&mut *tx`.

pub mod artwork_repo;
pub mod artwork_view_repo;
pub mod comment_repo;
pub mod reveal_condition_repo;
pub mod session_repo;
pub mod user_repo;

pub use artwork_repo::ArtworkRepo;
pub use artwork_view_repo::ArtworkViewRepo;
pub use comment_repo::CommentRepo;
pub use reveal_condition_repo::RevealConditionRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
