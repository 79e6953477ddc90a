//! Database configuration module.

use std::env;

fn env_parsed(name: &str, default: &str) -> u64 {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{name} must be a valid integer"))
}

/// Credential-store configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// `DATABASE_URL` is required; pool knobs (`DB_MAX_CONNECTIONS`,
    /// `DB_MIN_CONNECTIONS`, `DB_CONNECTION_TIMEOUT`, `DB_IDLE_TIMEOUT`,
    /// `DB_MAX_LIFETIME`) have sensible defaults.
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is not set or a pool knob is not an integer
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            max_connections: env_parsed("DB_MAX_CONNECTIONS", "20") as u32,
            min_connections: env_parsed("DB_MIN_CONNECTIONS", "5") as u32,
            connection_timeout_secs: env_parsed("DB_CONNECTION_TIMEOUT", "10"),
            idle_timeout_secs: env_parsed("DB_IDLE_TIMEOUT", "600"),
            max_lifetime_secs: env_parsed("DB_MAX_LIFETIME", "1800"),
        }
    }

    /// Create a default configuration for development
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/biblio_db".to_string(),
            max_connections: 20,
            min_connections: 5,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}
