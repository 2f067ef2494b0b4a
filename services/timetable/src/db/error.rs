//! Database error types.

use thiserror::Error;
use timetable_events::EventError;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to connect to the database.
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    /// Failed to execute a query.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),

    /// Migration directory not found in the current environment.
    #[error("migration directory not found; tried {tried}. Last error: {last_error}. Run from repo root or services/timetable.")]
    MigrationDirNotFound { tried: String, last_error: String },

    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A stored row holds a value the domain model cannot represent.
    #[error("invalid stored value in {column}: {value}")]
    InvalidRow { column: &'static str, value: String },

    /// Outbox payload could not be encoded.
    #[error("outbox payload error: {0}")]
    Payload(#[from] EventError),
}

impl DbError {
    /// Maps a write failure, translating SQLSTATE 23505 into `UniqueViolation`.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.code().as_deref() == Some("23505") {
                return DbError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        DbError::Query(err)
    }
}
