//! Value types for weekly defaults, per-date overrides and resolved slots.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use timetable_events::{format_wire_time, TimetableSlotPayload};
use timetable_id::{ClassId, OverrideId};

/// Status of a slot on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Scheduled,
    Cancelled,
    Replaced,
}

impl SlotStatus {
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "scheduled" => Some(SlotStatus::Scheduled),
            "cancelled" => Some(SlotStatus::Cancelled),
            "replaced" => Some(SlotStatus::Replaced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Scheduled => "scheduled",
            SlotStatus::Cancelled => "cancelled",
            SlotStatus::Replaced => "replaced",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A weekly-recurring timetable entry.
///
/// Created by administrative configuration, never by this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSlot {
    pub class_id: ClassId,
    /// ISO weekday, Monday = 1 through Sunday = 7.
    pub weekday: u8,
    pub course_code: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
}

/// A per-date correction or addition, keyed by (class, date, slot index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyOverride {
    pub id: OverrideId,
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub slot_index: i32,
    pub course_code: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: Option<String>,
    pub status: SlotStatus,
}

/// The effective entry for one slot on one date. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlot {
    pub slot_index: i32,
    pub course_code: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: String,
    pub status: SlotStatus,
}

impl ResolvedSlot {
    /// An empty slot, used as the base when an override has no default.
    pub fn empty(slot_index: i32) -> Self {
        Self {
            slot_index,
            course_code: String::new(),
            start_time: None,
            end_time: None,
            venue: String::new(),
            status: SlotStatus::Scheduled,
        }
    }

    pub fn from_default(slot_index: i32, slot: &DefaultSlot) -> Self {
        Self {
            slot_index,
            course_code: slot.course_code.clone(),
            start_time: Some(slot.start_time),
            end_time: Some(slot.end_time),
            venue: slot.venue.clone(),
            status: SlotStatus::Scheduled,
        }
    }

    /// Wire form used in outbox payloads and API responses.
    pub fn to_payload(&self) -> TimetableSlotPayload {
        TimetableSlotPayload {
            slot_index: self.slot_index,
            course_code: self.course_code.clone(),
            start_time: format_wire_time(self.start_time),
            end_time: format_wire_time(self.end_time),
            venue: self.venue.clone(),
            status: self.status.as_str().to_string(),
        }
    }
}

/// Per-class announcement configuration.
///
/// `last_announced_date` is the only mutable field and the idempotency marker
/// for the daily announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementSettings {
    pub class_id: ClassId,
    /// Matrix room the relay posts to.
    pub target: String,
    pub daily_announce_time: NaiveTime,
    pub daily_template: String,
    pub update_template: String,
    pub last_announced_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_status_parse() {
        assert_eq!(SlotStatus::parse("cancelled"), Some(SlotStatus::Cancelled));
        assert_eq!(SlotStatus::parse("Cancelled"), None);
        assert_eq!(SlotStatus::parse(""), None);
    }

    #[test]
    fn test_payload_formats_unset_times_as_empty() {
        let mut slot = ResolvedSlot::empty(3);
        slot.start_time = NaiveTime::from_hms_opt(14, 0, 0);
        let payload = slot.to_payload();
        assert_eq!(payload.start_time, "14:00");
        assert_eq!(payload.end_time, "");
        assert_eq!(payload.status, "scheduled");
    }
}
