//! Due checks for the daily announcement and for late-update notices.
//!
//! Both take the local wall-clock reading of "now" so the comparison is made
//! in the civil calendar.

use chrono::{NaiveDate, NaiveDateTime};

use super::model::AnnouncementSettings;

/// Today's announce instant in local time.
fn announce_at(settings: &AnnouncementSettings, local_now: NaiveDateTime) -> NaiveDateTime {
    local_now.date().and_time(settings.daily_announce_time)
}

/// Whether the class's daily announcement should be attempted.
///
/// True once today's announce time has been reached and the class has not
/// been announced today or later.
pub fn is_announcement_due(settings: &AnnouncementSettings, local_now: NaiveDateTime) -> bool {
    if local_now < announce_at(settings, local_now) {
        return false;
    }
    match settings.last_announced_date {
        None => true,
        Some(last) => last < local_now.date(),
    }
}

/// Whether an edit to `date` must be followed by a `TimetableUpdated` notice.
///
/// Only when `date` has already been announced and the edit arrives after
/// today's announce time.
pub fn should_emit_late_update(
    settings: &AnnouncementSettings,
    date: NaiveDate,
    local_now: NaiveDateTime,
) -> bool {
    if settings.last_announced_date != Some(date) {
        return false;
    }
    local_now > announce_at(settings, local_now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use timetable_id::ClassId;

    fn settings(last: Option<NaiveDate>) -> AnnouncementSettings {
        AnnouncementSettings {
            class_id: ClassId::new(),
            target: "!room:example.org".to_string(),
            daily_announce_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            daily_template: "daily".to_string(),
            update_template: "update".to_string(),
            last_announced_date: last,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        day(d).and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_not_due_before_announce_time() {
        assert!(!is_announcement_due(&settings(None), at(19, 6, 59)));
    }

    #[test]
    fn test_due_at_and_after_announce_time() {
        assert!(is_announcement_due(&settings(None), at(19, 7, 0)));
        assert!(is_announcement_due(&settings(Some(day(18))), at(19, 23, 0)));
    }

    #[test]
    fn test_not_due_once_announced_today_or_later() {
        assert!(!is_announcement_due(&settings(Some(day(19))), at(19, 8, 0)));
        // A backdated tick after a later announcement stays quiet.
        assert!(!is_announcement_due(&settings(Some(day(20))), at(19, 8, 0)));
    }

    #[test]
    fn test_late_update_requires_announced_date_and_past_time() {
        let announced = settings(Some(day(19)));
        assert!(should_emit_late_update(&announced, day(19), at(19, 7, 1)));
        assert!(!should_emit_late_update(&announced, day(19), at(19, 7, 0)));
        assert!(!should_emit_late_update(&announced, day(20), at(19, 9, 0)));
        assert!(!should_emit_late_update(&settings(Some(day(18))), day(19), at(19, 9, 0)));
        assert!(!should_emit_late_update(&settings(None), day(19), at(19, 9, 0)));
    }
}
