//! Request-boundary guard: bearer-token authentication and role gating.
//!
//! Framework-free equivalents of HTTP middleware. The boundary layer hands
//! in the raw `Authorization` header value and gets back either a decoded
//! identity for downstream role checks or a typed failure.

use super::{
    errors::{AuthError, AuthResult},
    models::{AuthenticatedUser, Role},
    token::TokenCodec,
};

/// Authenticate an `Authorization: Bearer <token>` header as an access token.
///
/// Rejects a missing header, a malformed scheme, an invalid or expired
/// signature, and non-access token kinds, uniformly as `Unauthorized`.
pub fn authenticate(
    codec: &TokenCodec,
    authorization: Option<&str>,
) -> AuthResult<AuthenticatedUser> {
    let token = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthError::Unauthorized("Authorization token missing"))?;

    let claims = codec.verify_access(token)?;
    Ok(AuthenticatedUser {
        id: claims.sub,
        role: claims.role,
    })
}

/// Gate an authenticated identity on a set of permitted roles.
///
/// A missing identity is `Unauthorized` and is checked before role
/// membership; a present identity with a role outside the set is
/// `Forbidden`.
pub fn authorize(identity: Option<&AuthenticatedUser>, allowed: &[Role]) -> AuthResult<()> {
    let Some(identity) = identity else {
        return Err(AuthError::Unauthorized("Authentication is required"));
    };

    if !allowed.contains(&identity.role) {
        return Err(AuthError::Forbidden);
    }

    Ok(())
}
