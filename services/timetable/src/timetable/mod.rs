//! Timetable domain: slot model, resolution engine and civil calendar.
//!
//! Everything in here is pure. Storage hands in default slots and overrides,
//! and the functions in [`resolve`] merge them into the effective day.

pub mod calendar;
pub mod due;
pub mod model;
pub mod resolve;

pub use calendar::{weekday_number, CivilCalendar, InvalidOffset};
pub use due::{is_announcement_due, should_emit_late_update};
pub use model::{AnnouncementSettings, DailyOverride, DefaultSlot, ResolvedSlot, SlotStatus};
pub use resolve::{apply_override, resolve_day, resolve_single_slot};
