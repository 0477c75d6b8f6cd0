//! Well-known role name constants carried in access-token claims.

pub const ROLE_ARTIST: &str = "artist";
pub const ROLE_VIEWER: &str = "viewer";

/// Resolve the role name for a user from their `is_artist` flag.
pub fn role_for(is_artist: bool) -> &'static str {
    if is_artist {
        ROLE_ARTIST
    } else {
        ROLE_VIEWER
    }
}
