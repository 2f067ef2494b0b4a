//! Storage seam for the timetable service.
//!
//! A [`TimetableStore`] opens [`TimetableTx`] units of work. Every mutation
//! and every outbox append happens inside one of them, so the state change and
//! its event commit or roll back together. Dropping a transaction without
//! calling [`TimetableTx::commit`] rolls it back.

use async_trait::async_trait;
use chrono::NaiveDate;
use timetable_events::TimetableEvent;
use timetable_id::{ClassId, OutboxEventId};

use super::DbError;
use crate::timetable::{AnnouncementSettings, DailyOverride, DefaultSlot};

/// Entry point to storage.
#[async_trait]
pub trait TimetableStore: Send + Sync {
    /// Begin a read-committed transaction.
    async fn begin(&self) -> Result<Box<dyn TimetableTx>, DbError>;

    /// Check that storage is reachable.
    async fn health_check(&self) -> Result<(), DbError>;
}

/// One unit of work.
#[async_trait]
pub trait TimetableTx: Send {
    /// Default slots for a class and weekday, ordered by start time with a
    /// stable tiebreak so equal start times keep their positions.
    async fn list_default_slots(
        &mut self,
        class_id: ClassId,
        weekday: u8,
    ) -> Result<Vec<DefaultSlot>, DbError>;

    /// Overrides for a class and date, ordered by slot index.
    async fn list_overrides(
        &mut self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> Result<Vec<DailyOverride>, DbError>;

    /// Insert or replace the override keyed by (class, date, slot index).
    async fn upsert_override(&mut self, over: &DailyOverride) -> Result<(), DbError>;

    /// Announcement settings for every configured class.
    async fn list_settings(&mut self) -> Result<Vec<AnnouncementSettings>, DbError>;

    /// Announcement settings for one class, if configured.
    async fn get_settings(
        &mut self,
        class_id: ClassId,
    ) -> Result<Option<AnnouncementSettings>, DbError>;

    /// Claim the daily announcement for `date`.
    ///
    /// Sets `last_announced_date = date` only when it is unset or strictly
    /// earlier. Returns whether a row was updated.
    async fn mark_announced(&mut self, class_id: ClassId, date: NaiveDate)
        -> Result<bool, DbError>;

    /// Append an unpublished event to the outbox.
    async fn insert_outbox(&mut self, event: &TimetableEvent) -> Result<OutboxEventId, DbError>;

    /// Make every write in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), DbError>;
}
