//! Authentication module providing registration, login, and session management.
//!
//! This module implements the session authority with:
//! - Argon2id password hashing
//! - JWT access tokens (15-minute expiry by default)
//! - Rotating, revocable refresh tokens (7-day expiry by default)
//! - Single-use refresh semantics backed by a Redis revocation store
//! - Short-lived password-reset tokens
//!
//! ## Example
//!
//! ```no_run
//! use biblio_auth::auth::{AuthConfig, AuthService, RedisRevocationStore, TokenCodec};
//! use biblio_auth::db::{Database, DatabaseConfig, PgUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::from_env();
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let store = RedisRevocationStore::connect(&config.redis_url).await?;
//!     let service = AuthService::new(
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         Arc::new(store),
//!         TokenCodec::new(&config),
//!         config.return_reset_token,
//!     );
//!
//!     let session = service.login("ada@example.com", "SecurePass123!").await?;
//!     println!("access token: {}", session.access_token);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod guard;
pub mod models;
pub mod revocation;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use errors::{AuthError, AuthResult};
pub use guard::{authenticate, authorize};
pub use models::{
    AccessClaims, AuthSession, AuthenticatedUser, RefreshClaims, ResetClaims, Role, SanitizedUser,
    SessionId, SessionTokens, TokenClaims, User, UserId,
};
pub use revocation::{InMemoryRevocationStore, RedisRevocationStore, RevocationStore};
pub use service::AuthService;
pub use token::TokenCodec;
