//! Service error taxonomy.

use thiserror::Error;

use crate::db::DbError;
use crate::identity::IdentityError;

/// Coarse error classes callers map onto their transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// Errors returned by timetable operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input; rejected before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The identity service denied the requester, or the role check failed.
    #[error("unauthorized")]
    Unauthorized,

    /// The requester does not exist.
    #[error("requester not found")]
    NotFound,

    /// A storage uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[source] DbError),

    #[error("identity error: {0}")]
    Identity(#[source] IdentityError),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidInput(_) => ErrorKind::InvalidInput,
            ServiceError::Unauthorized => ErrorKind::Unauthorized,
            ServiceError::NotFound => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Storage(_) | ServiceError::Identity(_) => ErrorKind::Internal,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { constraint } => ServiceError::Conflict(constraint),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<IdentityError> for ServiceError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound => ServiceError::NotFound,
            IdentityError::Unauthorized => ServiceError::Unauthorized,
            other => ServiceError::Identity(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_errors_surface_as_is() {
        assert_eq!(ServiceError::from(IdentityError::NotFound).kind(), ErrorKind::NotFound);
        assert_eq!(
            ServiceError::from(IdentityError::Unauthorized).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(ServiceError::from(IdentityError::Timeout).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_unique_violation_is_conflict() {
        let err = ServiceError::from(DbError::UniqueViolation {
            constraint: "daily_overrides_class_date_slot_key".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            ServiceError::from(DbError::Query(sqlx::Error::PoolTimedOut)).kind(),
            ErrorKind::Internal
        );
    }
}
