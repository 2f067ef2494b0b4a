//! Class timetable service library.
//!
//! Resolves each class's effective daily timetable from weekly defaults and
//! date-specific overrides, and queues announcement events in a transactional
//! outbox. The crate ships a `timetable` binary; the library surface exists
//! for integration testing and reuse.

pub mod api;
pub mod config;
pub mod db;
pub mod identity;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod timetable;
