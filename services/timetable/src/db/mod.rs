//! Database layer for the timetable service.
//!
//! This module provides:
//! - Connection pool management
//! - The [`TimetableStore`] / [`TimetableTx`] storage seam
//! - A Postgres store and an in-memory store behind that seam
//!
//! The Postgres side uses SQLx.

mod error;
mod memory;
mod postgres;
mod store;

pub use error::DbError;
pub use memory::MemoryStore;
pub use postgres::{PgTimetableStore, PgTimetableTx};
pub use store::{TimetableStore, TimetableTx};

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL.
    pub database_url: String,

    /// Maximum number of connections in the pool.
    pub max_connections: u32,

    /// Minimum number of idle connections.
    pub min_connections: u32,

    /// Connection acquire timeout.
    pub acquire_timeout: Duration,

    /// Idle connection timeout.
    pub idle_timeout: Duration,

    /// Maximum lifetime of a connection.
    pub max_lifetime: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/timetable".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl DbConfig {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; pool sizing falls back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required environment variable: DATABASE_URL"))?;

        let defaults = Self::default();

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_connections);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.min_connections);

        let max_lifetime = std::env::var("DB_CONN_MAX_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_lifetime);

        Ok(Self {
            database_url,
            max_connections,
            min_connections,
            max_lifetime,
            ..defaults
        })
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect(&config.database_url)
            .await
            .map_err(DbError::Connect)?;

        info!("Database connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// Migrations are loaded at runtime from the first directory that exists.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        let candidates = vec![
            std::path::PathBuf::from("./migrations"),
            std::path::PathBuf::from("services/timetable/migrations"),
            std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations"),
        ];
        let mut last_error: Option<sqlx::migrate::MigrateError> = None;

        for dir in &candidates {
            match sqlx::migrate::Migrator::new(dir.clone()).await {
                Ok(migrator) => {
                    info!(migrations_dir = %dir.display(), "Loaded migrations");
                    migrator.run(&self.pool).await.map_err(DbError::Migration)?;
                    info!("Database migrations complete");
                    return Ok(());
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        let tried = candidates
            .iter()
            .map(|dir| dir.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        Err(DbError::MigrationDirNotFound {
            tried,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    /// Get a store handle over this pool.
    pub fn store(&self) -> PgTimetableStore {
        PgTimetableStore::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_lifetime, Duration::from_secs(1800));
    }
}
