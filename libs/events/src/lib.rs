//! # timetable-events
//!
//! Outbox event definitions for the class timetable service.
//!
//! ## Design Principles
//!
//! - Events are written to the outbox in the same transaction as the state
//!   change they describe
//! - Outbox rows are append-only; a separate relay publishes them
//! - The payload is an opaque JSON document tagged by an event type string
//!
//! ## Event Types
//!
//! - `DailyTimetableAnnounced`: the full resolved day for a class, emitted at
//!   most once per class per civil date
//! - `TimetableUpdated`: a single slot edited after the day was announced

mod envelope;
mod error;
mod types;

pub use envelope::*;
pub use error::EventError;
pub use types::*;
