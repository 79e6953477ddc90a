//! Authentication configuration module.
//!
//! Provides the environment-level configuration surface for token secrets,
//! lifetimes, and the reset-token delivery flag.

use std::env;

/// Session authority configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret for signing access tokens
    pub access_secret: String,

    /// Secret for signing refresh tokens (falls back to `access_secret`)
    pub refresh_secret: Option<String>,

    /// Secret for signing password-reset tokens (falls back to `access_secret`)
    pub reset_secret: Option<String>,

    /// Access-token lifetime as a duration string, e.g. "15m"
    pub access_expires_in: String,

    /// Refresh-token lifetime as a duration string, e.g. "7d"
    pub refresh_expires_in: String,

    /// Reset-token lifetime as a duration string, e.g. "15m"
    pub reset_expires_in: String,

    /// Whether `forgot_password` returns the reset token directly.
    ///
    /// Only for development/test deployments; production dispatches the
    /// token out-of-band.
    pub return_reset_token: bool,

    /// Redis connection URL for the revocation store
    pub redis_url: String,
}

impl AuthConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `JWT_SECRET`: access-token signing secret (required)
    /// - `JWT_REFRESH_SECRET`: refresh-token secret (default: `JWT_SECRET`)
    /// - `JWT_RESET_SECRET`: reset-token secret (default: `JWT_SECRET`)
    /// - `JWT_ACCESS_EXPIRES_IN`: access lifetime (default: "15m")
    /// - `JWT_REFRESH_EXPIRES_IN`: refresh lifetime (default: "7d")
    /// - `JWT_RESET_EXPIRES_IN`: reset lifetime (default: "15m")
    /// - `RETURN_RESET_TOKEN`: "true" to return reset tokens to the caller (default: false)
    /// - `REDIS_URL`: revocation store URL (default: "redis://localhost:6379")
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set
    pub fn from_env() -> Self {
        Self {
            access_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            refresh_secret: env::var("JWT_REFRESH_SECRET").ok(),
            reset_secret: env::var("JWT_RESET_SECRET").ok(),
            access_expires_in: env::var("JWT_ACCESS_EXPIRES_IN")
                .unwrap_or_else(|_| "15m".to_string()),
            refresh_expires_in: env::var("JWT_REFRESH_EXPIRES_IN")
                .unwrap_or_else(|_| "7d".to_string()),
            reset_expires_in: env::var("JWT_RESET_EXPIRES_IN")
                .unwrap_or_else(|_| "15m".to_string()),
            return_reset_token: env::var("RETURN_RESET_TOKEN")
                .map(|v| v == "true")
                .unwrap_or(false),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        }
    }

    /// Create a default configuration for development
    pub fn development() -> Self {
        Self {
            access_secret: "dev_access_secret".to_string(),
            refresh_secret: None,
            reset_secret: None,
            access_expires_in: "15m".to_string(),
            refresh_expires_in: "7d".to_string(),
            reset_expires_in: "15m".to_string(),
            return_reset_token: true,
            redis_url: "redis://localhost:6379".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::development()
    }
}
