//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireArtist`] -- Requires the `artist` role.

pub mod auth;
pub mod rbac;
