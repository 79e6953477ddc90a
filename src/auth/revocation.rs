//! Revocation store: session liveness tracking for refresh tokens.
//!
//! A refresh token is self-contained and signed, so it cannot be recalled
//! by itself; revocability comes from an indirection through this store.
//! Every issued refresh token gets a record keyed by its session id, plus
//! membership in a per-user session set, both with TTL equal to the
//! refresh-token lifetime. Rotation and logout delete the record; a token
//! whose record is gone is dead regardless of its signature.
//!
//! Only this module constructs raw keys.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client, Script};
use subtle::ConstantTimeEq;

use super::{
    errors::{AuthError, AuthResult},
    models::{SessionId, UserId},
};

/// Key holding the owning user id for a live refresh session
fn refresh_token_key(session_id: &SessionId) -> String {
    format!("refresh:token:{session_id}")
}

/// Set of live session ids for a user
fn user_sessions_key(user_id: UserId) -> String {
    format!("user:{user_id}:refresh_tokens")
}

/// Trait for revocation store operations
///
/// Implementations must make [`consume`](RevocationStore::consume) atomic:
/// two concurrent calls for the same session id must not both return
/// `true`. That single primitive is what enforces single-use refresh
/// semantics under concurrent rotation.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record a freshly issued refresh session.
    ///
    /// Sets the token key to the owning user id with the given TTL, adds
    /// the session id to the user's session set, and resets the set's TTL.
    async fn store(&self, user_id: UserId, session_id: &SessionId, ttl: Duration)
        -> AuthResult<()>;

    /// Delete a refresh session. Idempotent: revoking an unknown or
    /// already-revoked session succeeds silently.
    async fn revoke(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<()>;

    /// Whether the session exists and is owned by `user_id`.
    async fn is_active(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<bool>;

    /// Atomically delete the session and report whether it was live and
    /// owned by `user_id`. Exactly one concurrent caller observes `true`.
    async fn consume(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<bool>;
}

/// Redis-backed revocation store.
///
/// Holds an explicitly constructed connection handle; callers create it
/// with [`connect`](RedisRevocationStore::connect) and inject it into the
/// session authority rather than sharing a process-global client.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl RedisRevocationStore {
    /// Connect to the revocation store
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    /// Check if the store connection is healthy
    pub async fn health_check(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn store(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        ttl: Duration,
    ) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let ttl_secs = ttl.num_seconds().max(0) as u64;
        let token_key = refresh_token_key(session_id);
        let set_key = user_sessions_key(user_id);

        let result: redis::RedisResult<()> = async {
            let _: () = conn
                .set_ex(&token_key, user_id.to_string(), ttl_secs)
                .await?;
            let _: () = conn.sadd(&set_key, session_id.to_string()).await?;
            let _: () = conn.expire(&set_key, ttl_secs as i64).await?;
            Ok(())
        }
        .await;

        result.map_err(|err| {
            error!("failed to store refresh session {session_id}: {err}");
            AuthError::SessionPersistence
        })
    }

    async fn revoke(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<()> {
        let mut conn = self.conn.clone();
        let token_key = refresh_token_key(session_id);
        let set_key = user_sessions_key(user_id);

        let result: redis::RedisResult<()> = async {
            let _: () = conn.del(&token_key).await?;
            let _: () = conn.srem(&set_key, session_id.to_string()).await?;
            Ok(())
        }
        .await;

        result.map_err(|err| {
            error!("failed to revoke refresh session {session_id}: {err}");
            AuthError::SessionPersistence
        })
    }

    async fn is_active(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<bool> {
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn
            .get(refresh_token_key(session_id))
            .await
            .map_err(|err| {
                error!("failed to read refresh session {session_id}: {err}");
                AuthError::SessionPersistence
            })?;

        let expected = user_id.to_string();
        Ok(stored
            .map(|value| bool::from(value.as_bytes().ct_eq(expected.as_bytes())))
            .unwrap_or(false))
    }

    async fn consume(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<bool> {
        // GET/compare/DEL as one script so that of two concurrent rotations
        // presenting the same token, exactly one wins.
        let script = Script::new(
            r#"
            if redis.call('GET', KEYS[1]) == ARGV[1] then
                redis.call('DEL', KEYS[1])
                redis.call('SREM', KEYS[2], ARGV[2])
                return 1
            end
            return 0
            "#,
        );

        let mut conn = self.conn.clone();
        let consumed: i64 = script
            .key(refresh_token_key(session_id))
            .key(user_sessions_key(user_id))
            .arg(user_id.to_string())
            .arg(session_id.to_string())
            .invoke_async(&mut conn)
            .await
            .map_err(|err| {
                error!("failed to consume refresh session {session_id}: {err}");
                AuthError::SessionPersistence
            })?;

        Ok(consumed == 1)
    }
}

/// In-memory revocation store for tests and local development.
///
/// Implements the same contract as the Redis store, including TTL: expired
/// sessions are treated as absent.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    sessions: Mutex<HashMap<SessionId, (UserId, DateTime<Utc>)>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_owner(
        sessions: &HashMap<SessionId, (UserId, DateTime<Utc>)>,
        session_id: &SessionId,
    ) -> Option<UserId> {
        sessions
            .get(session_id)
            .filter(|(_, deadline)| *deadline > Utc::now())
            .map(|(owner, _)| *owner)
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn store(
        &self,
        user_id: UserId,
        session_id: &SessionId,
        ttl: Duration,
    ) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.insert(*session_id, (user_id, Utc::now() + ttl));
        Ok(())
    }

    async fn revoke(&self, _user_id: UserId, session_id: &SessionId) -> AuthResult<()> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(session_id);
        Ok(())
    }

    async fn is_active(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<bool> {
        let sessions = self.sessions.lock().unwrap();
        Ok(Self::live_owner(&sessions, session_id) == Some(user_id))
    }

    async fn consume(&self, user_id: UserId, session_id: &SessionId) -> AuthResult<bool> {
        let mut sessions = self.sessions.lock().unwrap();
        if Self::live_owner(&sessions, session_id) == Some(user_id) {
            sessions.remove(session_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_key_schemas() {
        let session_id = Uuid::nil();
        assert_eq!(
            refresh_token_key(&session_id),
            "refresh:token:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(user_sessions_key(42), "user:42:refresh_tokens");
    }

    #[tokio::test]
    async fn test_store_then_is_active() {
        let store = InMemoryRevocationStore::new();
        let session_id = Uuid::new_v4();

        store.store(1, &session_id, Duration::days(7)).await.unwrap();
        assert!(store.is_active(1, &session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_active_rejects_wrong_owner() {
        let store = InMemoryRevocationStore::new();
        let session_id = Uuid::new_v4();

        store.store(1, &session_id, Duration::days(7)).await.unwrap();
        assert!(!store.is_active(2, &session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_session_is_not_active() {
        let store = InMemoryRevocationStore::new();
        let session_id = Uuid::new_v4();

        store
            .store(1, &session_id, Duration::seconds(-1))
            .await
            .unwrap();
        assert!(!store.is_active(1, &session_id).await.unwrap());
        assert!(!store.consume(1, &session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let store = InMemoryRevocationStore::new();
        let session_id = Uuid::new_v4();

        store.store(1, &session_id, Duration::days(7)).await.unwrap();
        assert!(store.consume(1, &session_id).await.unwrap());
        assert!(!store.consume(1, &session_id).await.unwrap());
        assert!(!store.is_active(1, &session_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemoryRevocationStore::new();
        let session_id = Uuid::new_v4();

        store.store(1, &session_id, Duration::days(7)).await.unwrap();
        store.revoke(1, &session_id).await.unwrap();
        store.revoke(1, &session_id).await.unwrap();
        store.revoke(1, &Uuid::new_v4()).await.unwrap();
        assert!(!store.is_active(1, &session_id).await.unwrap());
    }
}
