//! Periodic driver for the daily announcement check.
//!
//! The worker only supplies "now" on a fixed interval. Deciding which classes
//! are due and claiming them lives in [`crate::service`], so overlapping ticks
//! from several processes are safe.

mod worker;

pub use worker::AnnouncementWorker;
