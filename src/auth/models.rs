//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User ID type
pub type UserId = i64;

/// Session ID ("jti") embedded in refresh tokens and used as the revocation key
pub type SessionId = Uuid;

/// User role consumed as an opaque claim by the role gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// User record as stored in the credential store.
///
/// Deliberately does not implement `Serialize`: the password hash must never
/// appear in a response body. Convert with [`User::sanitized`] first.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker; a user is active iff this is `None`
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Strip the password hash for returning to a caller.
    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// User record with the password hash field removed
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Access + refresh token pair
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful registration or login
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: SanitizedUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Decoded claims of an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Decoded claims of a refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    pub role: Role,
    pub jti: SessionId,
    pub iat: i64,
    pub exp: i64,
}

/// Decoded claims of a password-reset token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
}

/// Claims payload carried by every signed token.
///
/// Tagged by the `type` wire field so that the three token kinds are
/// distinct variants: an access token can never be mistaken for a refresh
/// token after decoding, whatever secret it verified under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenClaims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
    Reset(ResetClaims),
}

/// Identity exposed to protected endpoints after bearer authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_user_has_no_password_field() {
        let user = User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: Role::User,
            created_at: Utc::now(),
            deleted_at: None,
        };

        let json = serde_json::to_value(user.sanitized()).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_claims_round_trip_keeps_kind_tag() {
        let claims = TokenClaims::Refresh(RefreshClaims {
            sub: 42,
            role: Role::Admin,
            jti: Uuid::new_v4(),
            iat: 0,
            exp: 1,
        });

        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
        assert_eq!(json["role"], "admin");

        let decoded: TokenClaims = serde_json::from_value(json).unwrap();
        assert!(matches!(decoded, TokenClaims::Refresh(c) if c.sub == 42));
    }
}
