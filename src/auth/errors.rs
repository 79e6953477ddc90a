//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input (weak password, bad email, invalid reset token)
    #[error("{0}")]
    Validation(String),

    /// Bad credentials, invalid/expired/wrong-kind token, or revoked session
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Role not permitted for this operation
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Duplicate registration
    #[error("Email is already registered")]
    Conflict,

    /// Reset target user missing
    #[error("User not found")]
    NotFound,

    /// Revocation store unavailable while a session had to be persisted
    #[error("Session could not be saved, please try again")]
    SessionPersistence,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,
}

impl AuthError {
    /// HTTP status code equivalent for this error kind.
    ///
    /// The boundary layer maps errors onto responses with this code; the
    /// kind/message pair is the whole externally visible surface.
    pub const fn status_code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::Unauthorized(_) => 401,
            AuthError::Forbidden => 403,
            AuthError::NotFound => 404,
            AuthError::Conflict => 409,
            AuthError::SessionPersistence | AuthError::Database(_) | AuthError::HashingFailed => {
                500
            }
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database and hashing errors are sanitized to prevent information
    /// disclosure about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::HashingFailed => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
