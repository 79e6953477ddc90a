//! Token codec: signing and verification of the three token kinds.
//!
//! Access, refresh, and reset tokens are compact JWTs signed under
//! independent secrets (refresh and reset fall back to the access secret
//! when no dedicated secret is configured). A token is accepted only if its
//! signature verifies under the secret for its namespace, it is not
//! expired, and its kind matches the operation being performed.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::{
    config::AuthConfig,
    errors::{AuthError, AuthResult},
    models::{AccessClaims, RefreshClaims, ResetClaims, Role, SessionId, TokenClaims, UserId},
};

/// Fallback applied when a configured duration string cannot be parsed.
///
/// Misconfiguration degrades to a 7-day lifetime instead of refusing to
/// start; this matches the deployed behavior the API relies on.
const DEFAULT_EXPIRES_SECS: i64 = 7 * 24 * 60 * 60;

/// Parse a human-readable duration string into seconds.
///
/// Accepts an integer followed by one of `s|m|h|d` (case-insensitive),
/// with optional whitespace before the unit: "15m", "7d", "30 S".
/// Unparsable input falls back to seven days.
pub fn parse_expires(value: &str) -> i64 {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, rest) = trimmed.split_at(digits_end);

    let Ok(amount) = digits.parse::<i64>() else {
        return DEFAULT_EXPIRES_SECS;
    };

    let unit = rest.trim();
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return DEFAULT_EXPIRES_SECS,
    };

    amount
        .checked_mul(multiplier)
        .unwrap_or(DEFAULT_EXPIRES_SECS)
}

/// Signs and verifies access, refresh, and reset tokens
#[derive(Clone)]
pub struct TokenCodec {
    access_secret: String,
    refresh_secret: String,
    reset_secret: String,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    reset_lifetime: Duration,
}

impl TokenCodec {
    /// Create a codec from configuration.
    ///
    /// Refresh and reset secrets fall back to the access secret when not
    /// configured separately.
    pub fn new(config: &AuthConfig) -> Self {
        let access_secret = config.access_secret.clone();
        Self {
            refresh_secret: config
                .refresh_secret
                .clone()
                .unwrap_or_else(|| access_secret.clone()),
            reset_secret: config
                .reset_secret
                .clone()
                .unwrap_or_else(|| access_secret.clone()),
            access_lifetime: Duration::seconds(parse_expires(&config.access_expires_in)),
            refresh_lifetime: Duration::seconds(parse_expires(&config.refresh_expires_in)),
            reset_lifetime: Duration::seconds(parse_expires(&config.reset_expires_in)),
            access_secret,
        }
    }

    /// Refresh-token lifetime, also used as the revocation-record TTL.
    pub fn refresh_lifetime(&self) -> Duration {
        self.refresh_lifetime
    }

    /// Issue a signed access token
    pub fn issue_access_token(&self, user_id: UserId, role: Role) -> AuthResult<String> {
        let now = Utc::now();
        let claims = TokenClaims::Access(AccessClaims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.access_lifetime).timestamp(),
        });
        self.sign(&claims, &self.access_secret)
    }

    /// Issue a signed refresh token with a fresh session id
    pub fn issue_refresh_token(
        &self,
        user_id: UserId,
        role: Role,
    ) -> AuthResult<(String, SessionId)> {
        let session_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = TokenClaims::Refresh(RefreshClaims {
            sub: user_id,
            role,
            jti: session_id,
            iat: now.timestamp(),
            exp: (now + self.refresh_lifetime).timestamp(),
        });
        let token = self.sign(&claims, &self.refresh_secret)?;
        Ok((token, session_id))
    }

    /// Issue a signed password-reset token
    pub fn issue_reset_token(&self, user_id: UserId) -> AuthResult<String> {
        let now = Utc::now();
        let claims = TokenClaims::Reset(ResetClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.reset_lifetime).timestamp(),
        });
        self.sign(&claims, &self.reset_secret)
    }

    /// Verify an access token: signature, expiry, and kind.
    pub fn verify_access(&self, token: &str) -> AuthResult<AccessClaims> {
        match self.decode(token, &self.access_secret)? {
            TokenClaims::Access(claims) => Ok(claims),
            _ => Err(AuthError::Unauthorized("Invalid token type")),
        }
    }

    /// Verify a refresh token: signature, expiry, and kind.
    ///
    /// Liveness of the embedded session id is checked separately against
    /// the revocation store; a valid signature alone is not enough.
    pub fn verify_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        match self.decode(token, &self.refresh_secret)? {
            TokenClaims::Refresh(claims) => Ok(claims),
            _ => Err(AuthError::Unauthorized("Invalid token type")),
        }
    }

    /// Verify a password-reset token: signature, expiry, and kind.
    ///
    /// Failures surface as `Validation` (the reset endpoint's 400) rather
    /// than `Unauthorized`.
    pub fn verify_reset(&self, token: &str) -> AuthResult<ResetClaims> {
        let claims = self
            .decode(token, &self.reset_secret)
            .map_err(|_| AuthError::Validation("Invalid or expired token".to_string()))?;
        match claims {
            TokenClaims::Reset(claims) => Ok(claims),
            _ => Err(AuthError::Validation("Invalid token type".to_string())),
        }
    }

    fn sign(&self, claims: &TokenClaims, secret: &str) -> AuthResult<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|_| AuthError::Unauthorized("Token could not be issued"))
    }

    fn decode(&self, token: &str, secret: &str) -> AuthResult<TokenClaims> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::Unauthorized("Invalid or expired token"))
    }
}
