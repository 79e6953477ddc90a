//! User repository: trait-based access to the credential store.
//!
//! The session authority only ever sees active users; every lookup filters
//! on the soft-delete marker, so a deleted account behaves exactly like one
//! that never existed.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::auth::{AuthResult, Role, User, UserId};

/// Trait for credential-store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user with the fixed `user` role
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> AuthResult<User>;

    /// Find an active (not soft-deleted) user by email
    async fn find_active_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Find an active (not soft-deleted) user by id
    async fn find_active_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Replace a user's password hash
    async fn update_password(&self, user_id: UserId, password_hash: &str) -> AuthResult<()>;
}

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_role(role: &str) -> Role {
    match role {
        "admin" => Role::Admin,
        _ => Role::User,
    }
}

fn map_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: parse_role(row.get("role")),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        deleted_at: row
            .get::<Option<chrono::NaiveDateTime>, _>("deleted_at")
            .map(|dt| dt.and_utc()),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> AuthResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, 'user')
            RETURNING id, name, email, password_hash, role, created_at, deleted_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_user(&row))
    }

    async fn find_active_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at, deleted_at
             FROM users WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn find_active_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role, created_at, deleted_at
             FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_user))
    }

    async fn update_password(&self, user_id: UserId, password_hash: &str) -> AuthResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory implementation for tests and local development
pub struct MemoryUserRepository {
    users: std::sync::Mutex<std::collections::HashMap<UserId, User>>,
    next_id: std::sync::Mutex<UserId>,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: std::sync::Mutex::new(std::collections::HashMap::new()),
            next_id: std::sync::Mutex::new(1),
        }
    }

    /// Preload a user record
    pub fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().insert(user.id, user);
        self
    }

    /// Set the soft-delete marker, making the user invisible to lookups
    pub fn mark_deleted(&self, user_id: UserId) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&user_id) {
            user.deleted_at = Some(chrono::Utc::now());
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> AuthResult<User> {
        let mut next_id = self.next_id.lock().unwrap();
        let id = *next_id;
        *next_id += 1;

        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::User,
            created_at: chrono::Utc::now(),
            deleted_at: None,
        };

        self.users.lock().unwrap().insert(id, user.clone());
        Ok(user)
    }

    async fn find_active_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_active_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .get(&user_id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn update_password(&self, user_id: UserId, password_hash: &str) -> AuthResult<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("admin"), Role::Admin);
        assert_eq!(parse_role("user"), Role::User);
        assert_eq!(parse_role("something_else"), Role::User);
    }

    #[tokio::test]
    async fn test_memory_create_and_find() {
        let repo = MemoryUserRepository::new();

        let user = repo
            .create_user("Ada", "ada@example.com", "hash123")
            .await
            .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.role, Role::User);

        let found = repo.find_active_by_email("ada@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, user.id);

        let missing = repo.find_active_by_email("ghost@nowhere.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_memory_soft_delete_hides_user() {
        let repo = MemoryUserRepository::new();
        let user = repo
            .create_user("Ada", "ada@example.com", "hash123")
            .await
            .unwrap();

        repo.mark_deleted(user.id);

        assert!(repo
            .find_active_by_email("ada@example.com")
            .await
            .unwrap()
            .is_none());
        assert!(repo.find_active_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_preloaded_admin() {
        let admin = User {
            id: 100,
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Admin,
            created_at: chrono::Utc::now(),
            deleted_at: None,
        };
        let repo = MemoryUserRepository::new().with_user(admin);

        let found = repo.find_active_by_id(100).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_memory_update_password() {
        let repo = MemoryUserRepository::new();
        let user = repo
            .create_user("Ada", "ada@example.com", "old_hash")
            .await
            .unwrap();

        repo.update_password(user.id, "new_hash").await.unwrap();

        let found = repo.find_active_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.password_hash, "new_hash");
    }
}
