//! Identity service interface.
//!
//! The identity service is a black box that tells us who a requester is and
//! which roles they hold. [`authz`] turns that role set into an edit decision.

pub mod authz;
mod http;

use async_trait::async_trait;
use thiserror::Error;
use timetable_id::{ClassId, UserId};

pub use authz::{is_authorized, parse_role, Role};
pub use http::{HttpIdentityClient, USER_ID_HEADER};

/// A role as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRole {
    pub name: String,
    /// Class the role is bound to, for class-scoped roles.
    pub class_id: Option<ClassId>,
}

/// The requester as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub id: UserId,
    pub roles: Vec<IdentityRole>,
}

/// Identity lookup failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The requester does not exist.
    #[error("user not found")]
    NotFound,

    /// The identity service refused the lookup (401/403).
    #[error("identity service denied the request")]
    Unauthorized,

    /// The lookup did not finish within the configured bound.
    #[error("identity lookup timed out")]
    Timeout,

    /// No base URL was configured for the identity service.
    #[error("identity service base URL is not configured")]
    NotConfigured,

    /// The identity service answered with a status we do not handle.
    #[error("identity service unexpected status: {0}")]
    UnexpectedStatus(u16),

    /// The response body could not be used.
    #[error("invalid identity response: {0}")]
    InvalidResponse(String),

    /// Network or protocol failure.
    #[error("identity request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Looks up requesters and their roles.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn get_me(&self, user_id: UserId) -> Result<IdentityUser, IdentityError>;
}
