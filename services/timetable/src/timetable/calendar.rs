//! Class-local civil calendar.
//!
//! Every "today", weekday and announce-time comparison happens in local civil
//! time, never in UTC, so a tick shortly after local midnight lands on the
//! new day.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid UTC offset '{0}': expected UTC, Z or +HH:MM")]
pub struct InvalidOffset(pub String);

/// Maps instants onto local civil dates and times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CivilCalendar {
    /// A fixed UTC offset.
    Fixed(FixedOffset),
    /// The host's local zone, resolved per instant so DST changes apply.
    Host,
}

impl CivilCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        CivilCalendar::Fixed(offset)
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn host_local() -> Self {
        CivilCalendar::Host
    }

    /// Parses `UTC`, `Z`, `+HH:MM`, `-HH:MM` or `+HHMM`.
    pub fn parse_offset(value: &str) -> Result<FixedOffset, InvalidOffset> {
        let invalid = || InvalidOffset(value.to_string());
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(Utc.fix());
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
    }

    /// Local wall-clock reading of `now`.
    pub fn local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match self {
            CivilCalendar::Fixed(offset) => now.with_timezone(offset).naive_local(),
            CivilCalendar::Host => now.with_timezone(&Local).naive_local(),
        }
    }

    /// The local civil date of `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local(now).date()
    }
}

impl fmt::Display for CivilCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CivilCalendar::Fixed(offset) => write!(f, "{offset}"),
            CivilCalendar::Host => f.write_str("host local"),
        }
    }
}

/// ISO weekday number, Monday = 1 through Sunday = 7.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}
