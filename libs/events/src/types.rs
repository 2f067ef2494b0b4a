//! Event payload definitions.
//!
//! Wire times are 24-hour `HH:MM` strings in the class-local calendar; an
//! unset time is the empty string.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use timetable_id::{ClassId, UserId};

// =============================================================================
// Event Type Constants
// =============================================================================

/// All event type names as constants.
pub mod event_types {
    pub const DAILY_TIMETABLE_ANNOUNCED: &str = "DailyTimetableAnnounced";
    pub const TIMETABLE_UPDATED: &str = "TimetableUpdated";
}

/// Format used for slot times on the wire.
pub const WIRE_TIME_FORMAT: &str = "%H:%M";

/// Formats an optional time-of-day for the wire.
pub fn format_wire_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format(WIRE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parses a wire time; the empty string means "unset".
pub fn parse_wire_time(value: &str) -> Result<Option<NaiveTime>, chrono::ParseError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(value, WIRE_TIME_FORMAT).map(Some)
}

// =============================================================================
// Payloads
// =============================================================================

/// One resolved slot as it appears in event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableSlotPayload {
    pub slot_index: i32,
    pub course_code: String,
    pub start_time: String,
    pub end_time: String,
    pub venue: String,
    pub status: String,
}

/// Payload for `DailyTimetableAnnounced`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTimetableAnnouncedPayload {
    pub class_id: ClassId,
    pub date: NaiveDate,
    /// Channel the relay should post to (a Matrix room id).
    pub target: String,
    pub template: String,
    pub slots: Vec<TimetableSlotPayload>,
}

/// Payload for `TimetableUpdated`.
///
/// `slots` always holds exactly the one slot that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableUpdatedPayload {
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub update_template: String,
    pub slots: Vec<TimetableSlotPayload>,
    pub updated_by: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_wire_time() {
        let t = NaiveTime::from_hms_opt(9, 5, 59).unwrap();
        assert_eq!(format_wire_time(Some(t)), "09:05");
        assert_eq!(format_wire_time(None), "");
    }

    #[test]
    fn test_parse_wire_time() {
        assert_eq!(parse_wire_time("").unwrap(), None);
        assert_eq!(
            parse_wire_time("14:30").unwrap(),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert!(parse_wire_time("2pm").is_err());
        assert!(parse_wire_time("25:00").is_err());
    }

    #[test]
    fn test_updated_payload_serialization() {
        let payload = TimetableUpdatedPayload {
            class_id: "0190b6a4-6f5e-7c3a-9d1e-2f4b5c6d7e8f".parse().unwrap(),
            date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            update_template: "Update: {slots}".to_string(),
            slots: vec![TimetableSlotPayload {
                slot_index: 2,
                course_code: "CS102".to_string(),
                start_time: "10:00".to_string(),
                end_time: String::new(),
                venue: "R2".to_string(),
                status: "cancelled".to_string(),
            }],
            updated_by: "0190b6a4-0000-7000-8000-000000000001".parse().unwrap(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["class_id"], "0190b6a4-6f5e-7c3a-9d1e-2f4b5c6d7e8f");
        assert_eq!(json["date"], "2026-10-19");
        assert_eq!(json["slots"][0]["end_time"], "");
        assert_eq!(json["updated_by"], "0190b6a4-0000-7000-8000-000000000001");
    }

    proptest! {
        #[test]
        fn prop_wire_time_is_five_chars_and_parses_back(h in 0u32..24, m in 0u32..60, s in 0u32..60) {
            let t = NaiveTime::from_hms_opt(h, m, s).unwrap();
            let wire = format_wire_time(Some(t));
            prop_assert_eq!(wire.len(), 5);
            let back = parse_wire_time(&wire).unwrap().unwrap();
            prop_assert_eq!(back, NaiveTime::from_hms_opt(h, m, 0).unwrap());
        }
    }
}
