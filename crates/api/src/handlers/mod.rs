pub mod artworks;
pub mod auth;
pub mod comments;
pub mod users;
