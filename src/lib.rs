//! # Biblio Auth
//!
//! Session and token authority backing the Biblio library API.
//!
//! This crate owns the credential lifecycle for the HTTP service: issuance,
//! rotation, and revocation of signed access and refresh tokens, plus the
//! password-reset flow. Resource handlers (books, authors, reviews, ...)
//! live elsewhere and consume this crate through [`auth::AuthService`] and
//! the request guard in [`auth::guard`].
//!
//! ## Architecture
//!
//! - [`auth::TokenCodec`]: signs and verifies the three token kinds
//!   (access, refresh, reset) over independent secrets.
//! - [`auth::RevocationStore`]: Redis-backed session liveness tracking;
//!   a refresh token is only usable while its session record exists.
//! - [`auth::AuthService`]: orchestrates register, login, refresh
//!   rotation, logout, and password reset.
//! - [`db`]: PostgreSQL credential store with soft-delete-aware lookups.
//!
//! ## Example
//!
//! ```no_run
//! use biblio_auth::auth::{AuthConfig, AuthService, InMemoryRevocationStore, TokenCodec};
//! use biblio_auth::db::MemoryUserRepository;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::development();
//!     let service = AuthService::new(
//!         Arc::new(MemoryUserRepository::new()),
//!         Arc::new(InMemoryRevocationStore::new()),
//!         TokenCodec::new(&config),
//!         config.return_reset_token,
//!     );
//!
//!     let session = service
//!         .register("Ada", "ada@example.com", "SecurePass123!")
//!         .await?;
//!     println!("registered user {}", session.user.id);
//!     Ok(())
//! }
//! ```

/// Session authority: tokens, revocation, and the auth flows.
pub mod auth;
pub use auth::{AuthError, AuthResult, AuthService, TokenCodec};

/// Credential store: PostgreSQL connection pooling and user lookups.
pub mod db;
pub use db::{Database, UserRepository};
