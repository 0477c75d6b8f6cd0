//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) where the entity is editable

pub mod artwork;
pub mod artwork_view;
pub mod comment;
pub mod reveal_condition;
pub mod session;
pub mod user;
