//! JWT access-token generation/validation and refresh-token helpers.
//!
//! Access tokens are HS256-signed JWTs containing a [`Claims`] payload and
//! issued by [`TOKEN_ISSUER`]. The same token authenticates REST calls and the
//! personal WebSocket channel. Refresh tokens are opaque random strings; only
//! their SHA-256 hash is stored server-side.

use chrono::{DateTime, Utc};
use gallery_core::roles::ROLE_ARTIST;
use gallery_core::types::{DbId, Timestamp};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Number of random bytes in a refresh token.
const REFRESH_TOKEN_BYTES: usize = 32;

/// `iss` claim of every access token this service mints and accepts.
pub const TOKEN_ISSUER: &str = "invisible-gallery";

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// The user's role name (`"artist"` or `"viewer"`).
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
    /// Always [`TOKEN_ISSUER`].
    pub iss: String,
}

impl Claims {
    pub fn is_artist(&self) -> bool {
        self.role == ROLE_ARTIST
    }
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }

    /// Access token lifetime in seconds, as reported to clients.
    pub fn access_expires_in_secs(&self) -> i64 {
        self.access_token_expiry_mins * 60
    }

    /// When a refresh session minted at `now` stops being accepted.
    pub fn refresh_expires_at(&self, now: DateTime<Utc>) -> Timestamp {
        now + chrono::Duration::days(self.refresh_token_expiry_days)
    }
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let exp = now + config.access_expires_in_secs();

    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
        iss: TOKEN_ISSUER.to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature, expiration and issuer.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

/// Generate a random refresh token.
///
/// Returns `(plaintext_token, sha256_hex_hash)`. The plaintext is sent to the
/// client; only the hash is persisted.
pub fn generate_refresh_token() -> (String, String) {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill(&mut bytes[..]);
    let plaintext: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

/// Compute the SHA-256 hex digest of a refresh token.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
