//! # timetable-id
//!
//! Typed identifiers for the class timetable service.
//!
//! ## Design Principles
//!
//! - IDs are UUIDs, because the identity service hands out UUIDs for users
//!   and classes and we store them as `uuid` columns
//! - Each resource gets its own newtype so a `ClassId` can never be passed
//!   where a `UserId` is expected
//! - The canonical string form is the hyphenated lowercase UUID
//!
//! Locally generated IDs (overrides, outbox events) use UUIDv7 so they sort
//! by creation time.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export uuid for consumers that need raw UUID operations
pub use uuid::Uuid;
