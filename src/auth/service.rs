//! Session authority implementation.
//!
//! Orchestrates the registration, login, refresh-rotation, logout, and
//! password-reset flows across the credential store, password hasher,
//! token codec, and revocation store. Each flow is a short fail-fast
//! pipeline; infrastructure failures propagate to the caller and are never
//! retried here.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::{debug, warn};
use std::sync::Arc;

use super::{
    errors::{AuthError, AuthResult},
    models::{AuthSession, SessionTokens, User},
    revocation::RevocationStore,
    token::TokenCodec,
};
use crate::db::UserRepository;

/// Message shared by the unknown-email and wrong-password login failures.
/// The two cases must be indistinguishable to the caller.
const LOGIN_FAILED: &str = "Invalid email or password";

/// Session authority
///
/// Stateless per call; all shared state lives in the injected credential
/// store and revocation store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn RevocationStore>,
    codec: TokenCodec,
    return_reset_token: bool,
}

impl AuthService {
    /// Create a new session authority
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store handle
    /// * `store` - Revocation store handle
    /// * `codec` - Token codec configured with secrets and lifetimes
    /// * `return_reset_token` - Whether `forgot_password` returns the token
    ///   directly (development/test deployments only)
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn RevocationStore>,
        codec: TokenCodec,
        return_reset_token: bool,
    ) -> Self {
        Self {
            users,
            store,
            codec,
            return_reset_token,
        }
    }

    /// Register a new user
    ///
    /// The role is always `user`; role escalation is never accepted from
    /// registration input.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Malformed email or weak password
    /// * `AuthError::Conflict` - An active user with that email exists
    /// * `AuthError::SessionPersistence` - Refresh session could not be stored
    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthResult<AuthSession> {
        Self::validate_email(email)?;
        Self::validate_password(password)?;

        if self.users.find_active_by_email(email).await?.is_some() {
            return Err(AuthError::Conflict);
        }

        let password_hash = Self::hash_password(password.to_string()).await?;
        let user = self.users.create_user(name, email, &password_hash).await?;

        let tokens = self.issue_session(&user).await?;
        Ok(AuthSession {
            user: user.sanitized(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Login with email and password
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - Unknown email or wrong password, with
    ///   one undifferentiated message for both
    /// * `AuthError::SessionPersistence` - Refresh session could not be stored
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let Some(user) = self.users.find_active_by_email(email).await? else {
            return Err(AuthError::Unauthorized(LOGIN_FAILED));
        };

        let matches =
            Self::verify_password(password.to_string(), user.password_hash.clone()).await?;
        if !matches {
            return Err(AuthError::Unauthorized(LOGIN_FAILED));
        }

        let tokens = self.issue_session(&user).await?;
        Ok(AuthSession {
            user: user.sanitized(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Exchange a refresh token for a new access + refresh pair.
    ///
    /// The presented session is consumed atomically before the new one is
    /// issued: after a successful call the old refresh token is permanently
    /// unusable, and a replayed token fails even if its signature is valid.
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - Bad signature/expiry/kind, unknown or
    ///   deleted subject, or a session already ended or replayed
    /// * `AuthError::SessionPersistence` - New session could not be stored
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        let claims = self.codec.verify_refresh(refresh_token)?;

        let Some(user) = self.users.find_active_by_id(claims.sub).await? else {
            return Err(AuthError::Unauthorized("User not found"));
        };

        if !self.store.consume(user.id, &claims.jti).await? {
            return Err(AuthError::Unauthorized("Session ended or replayed"));
        }

        debug!("rotated refresh session {} for user {}", claims.jti, user.id);
        self.issue_session(&user).await
    }

    /// End the session carried by a refresh token.
    ///
    /// Idempotent by design: malformed, expired, wrong-kind, and
    /// already-revoked tokens all acknowledge success, so a caller can
    /// never probe token validity through this endpoint.
    pub async fn logout(&self, refresh_token: &str) {
        let Ok(claims) = self.codec.verify_refresh(refresh_token) else {
            return;
        };

        if let Err(err) = self.store.revoke(claims.sub, &claims.jti).await {
            warn!("failed to revoke session {} during logout: {err}", claims.jti);
        }
    }

    /// Start the password-reset flow for an email address.
    ///
    /// Returns `Ok(None)` for unknown addresses so that callers cannot
    /// enumerate accounts. The token is only returned directly when the
    /// deployment opts in; production dispatches it out-of-band.
    pub async fn forgot_password(&self, email: &str) -> AuthResult<Option<String>> {
        let Some(user) = self.users.find_active_by_email(email).await? else {
            return Ok(None);
        };

        let reset_token = self.codec.issue_reset_token(user.id)?;
        debug!("issued reset token for user {}", user.id);

        if self.return_reset_token {
            Ok(Some(reset_token))
        } else {
            Ok(None)
        }
    }

    /// Replace a user's password using a reset token.
    ///
    /// Existing refresh sessions are left untouched; only the password
    /// hash changes.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - Invalid/expired token, wrong kind, or
    ///   weak replacement password
    /// * `AuthError::NotFound` - Subject no longer exists or is deleted
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthResult<()> {
        let claims = self.codec.verify_reset(token)?;

        let Some(user) = self.users.find_active_by_id(claims.sub).await? else {
            return Err(AuthError::NotFound);
        };

        Self::validate_password(new_password)?;
        let password_hash = Self::hash_password(new_password.to_string()).await?;
        self.users.update_password(user.id, &password_hash).await?;
        Ok(())
    }

    /// Issue an access + refresh pair and persist the refresh session.
    ///
    /// A revocation-store failure here is fatal: a refresh token that was
    /// never stored would verify by signature yet be unrevocable, so the
    /// tokens are not returned unless the session record exists.
    async fn issue_session(&self, user: &User) -> AuthResult<SessionTokens> {
        let access_token = self.codec.issue_access_token(user.id, user.role)?;
        let (refresh_token, session_id) = self.codec.issue_refresh_token(user.id, user.role)?;

        self.store
            .store(user.id, &session_id, self.codec.refresh_lifetime())
            .await?;

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Hash a password on the blocking pool; argon2 is CPU-bound.
    async fn hash_password(password: String) -> AuthResult<String> {
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|_| AuthError::HashingFailed)
        })
        .await
        .map_err(|_| AuthError::HashingFailed)?
    }

    /// Verify a password against a stored hash on the blocking pool.
    async fn verify_password(password: String, hash: String) -> AuthResult<bool> {
        tokio::task::spawn_blocking(move || {
            let Ok(parsed_hash) = PasswordHash::new(&hash) else {
                return Ok(false);
            };
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|_| AuthError::HashingFailed)?
    }

    fn validate_email(email: &str) -> AuthResult<()> {
        let well_formed = email.len() >= 5
            && email.contains('@')
            && !email.starts_with('@')
            && !email.ends_with('@')
            && !email.chars().any(char::is_whitespace);
        if !well_formed {
            return Err(AuthError::Validation(
                "A valid email address is required".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_password(password: &str) -> AuthResult<()> {
        if password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
        let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());

        if !has_digit || !has_uppercase || !has_lowercase {
            return Err(AuthError::Validation(
                "Password must contain at least one number, one uppercase and one lowercase letter"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{config::AuthConfig, revocation::InMemoryRevocationStore};
    use crate::db::MemoryUserRepository;

    fn service() -> (AuthService, Arc<MemoryUserRepository>) {
        let users = Arc::new(MemoryUserRepository::new());
        let service = AuthService::new(
            users.clone(),
            Arc::new(InMemoryRevocationStore::new()),
            TokenCodec::new(&AuthConfig::development()),
            true,
        );
        (service, users)
    }

    #[tokio::test]
    async fn test_register_returns_session() {
        let (service, _) = service();

        let session = service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        assert_eq!(session.user.email, "ada@example.com");
        assert_eq!(session.user.role, crate::auth::Role::User);
        assert!(!session.access_token.is_empty());
        assert!(!session.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let (service, _) = service();

        service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        let result = service
            .register("Other Ada", "ada@example.com", "OtherPass456!")
            .await;
        assert!(matches!(result.unwrap_err(), AuthError::Conflict));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let (service, _) = service();

        let result = service.register("Ada", "ada@example.com", "weak").await;
        assert!(matches!(result.unwrap_err(), AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        let (service, _) = service();

        let result = service.register("Ada", "not-an-email", "SecurePass123!").await;
        assert!(matches!(result.unwrap_err(), AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = service();

        service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        let wrong_password = service
            .login("ada@example.com", "WrongPass123!")
            .await
            .unwrap_err();
        let unknown_email = service
            .login("ghost@nowhere.com", "SecurePass123!")
            .await
            .unwrap_err();

        assert_eq!(wrong_password.client_message(), unknown_email.client_message());
        assert_eq!(wrong_password.status_code(), 401);
        assert_eq!(unknown_email.status_code(), 401);
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (service, _) = service();

        let session = service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        let result = service.refresh(&session.access_token).await;
        assert!(matches!(result.unwrap_err(), AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_deleted_user() {
        let (service, users) = service();

        let session = service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        users.mark_deleted(session.user.id);

        let result = service.refresh(&session.refresh_token).await;
        assert!(matches!(result.unwrap_err(), AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_logout_never_fails() {
        let (service, _) = service();

        let session = service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        // Garbage, valid, then replayed: all acknowledged.
        service.logout("not.a.token").await;
        service.logout(&session.refresh_token).await;
        service.logout(&session.refresh_token).await;

        // The session really is gone.
        let result = service.refresh(&session.refresh_token).await;
        assert!(matches!(result.unwrap_err(), AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_forgot_password_hides_missing_users() {
        let (service, _) = service();

        service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        // Flag is on in the development config, so the known user gets a
        // token while the ghost gets the same success shape without one.
        let known = service.forgot_password("ada@example.com").await.unwrap();
        let ghost = service.forgot_password("ghost@nowhere.com").await.unwrap();
        assert!(known.is_some());
        assert!(ghost.is_none());
    }

    #[tokio::test]
    async fn test_forgot_password_respects_delivery_flag() {
        let users = Arc::new(MemoryUserRepository::new());
        let service = AuthService::new(
            users,
            Arc::new(InMemoryRevocationStore::new()),
            TokenCodec::new(&AuthConfig::development()),
            false,
        );

        service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        let known = service.forgot_password("ada@example.com").await.unwrap();
        let ghost = service.forgot_password("ghost@nowhere.com").await.unwrap();
        assert!(known.is_none());
        assert!(ghost.is_none());
    }

    #[tokio::test]
    async fn test_reset_password_rejects_wrong_kind() {
        let (service, _) = service();

        let session = service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        // Signed with the same fallback secret, but kind "access".
        let result = service
            .reset_password(&session.access_token, "NewPassw0rd!")
            .await;
        let err = result.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_reset_password_for_deleted_user_is_not_found() {
        let (service, users) = service();

        let session = service
            .register("Ada", "ada@example.com", "SecurePass123!")
            .await
            .unwrap();

        let token = service
            .forgot_password("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        users.mark_deleted(session.user.id);

        let result = service.reset_password(&token, "NewPassw0rd!").await;
        assert!(matches!(result.unwrap_err(), AuthError::NotFound));
    }
}
