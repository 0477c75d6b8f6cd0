use gallery_core::artwork::DEFAULT_MAX_UPLOAD_BYTES;
use gallery_core::milestones::ViewMilestones;
use gallery_core::reveal::RevealPolicy;

use crate::auth::jwt::JwtConfig;

/// Default interval of the time-condition sweep.
const DEFAULT_REVEAL_SWEEP_INTERVAL_SECS: u64 = 60;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup of background tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// How multiple reveal conditions on one artwork combine.
    pub reveal_policy: RevealPolicy,
    /// View counts that trigger a milestone notification.
    pub view_milestones: ViewMilestones,
    /// Seconds between time-condition sweeps; `0` disables the sweep.
    pub reveal_sweep_interval_secs: u64,
    /// Secret the artwork content key is derived from.
    pub content_encryption_key: String,
    /// Largest accepted artwork upload in bytes.
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                    |
    /// |------------------------------|----------------------------|
    /// | `HOST`                       | `0.0.0.0`                  |
    /// | `PORT`                       | `3000`                     |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                       |
    /// | `REVEAL_POLICY`              | `any`                      |
    /// | `VIEW_MILESTONES`            | `10,50,100,500,1000`       |
    /// | `REVEAL_SWEEP_INTERVAL_SECS` | `60`                       |
    /// | `CONTENT_ENCRYPTION_KEY`     | **required**               |
    /// | `MAX_UPLOAD_BYTES`           | `10485760`                 |
    ///
    /// # Panics
    ///
    /// Panics on malformed values or a missing content key; misconfiguration
    /// should stop the process at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        let reveal_policy: RevealPolicy = std::env::var("REVEAL_POLICY")
            .unwrap_or_else(|_| RevealPolicy::default().to_string())
            .parse()
            .unwrap_or_else(|e| panic!("Invalid REVEAL_POLICY: {e}"));

        let view_milestones: ViewMilestones = match std::env::var("VIEW_MILESTONES") {
            Ok(raw) => raw
                .parse()
                .unwrap_or_else(|e| panic!("Invalid VIEW_MILESTONES: {e}")),
            Err(_) => ViewMilestones::default(),
        };

        let reveal_sweep_interval_secs: u64 = std::env::var("REVEAL_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_REVEAL_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("REVEAL_SWEEP_INTERVAL_SECS must be a valid u64");

        let content_encryption_key = std::env::var("CONTENT_ENCRYPTION_KEY")
            .expect("CONTENT_ENCRYPTION_KEY must be set in the environment");
        assert!(
            !content_encryption_key.is_empty(),
            "CONTENT_ENCRYPTION_KEY must not be empty"
        );

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            reveal_policy,
            view_milestones,
            reveal_sweep_interval_secs,
            content_encryption_key,
            max_upload_bytes,
        }
    }
}
