//! Postgres implementation of the timetable store.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::{
    postgres::{PgPool, PgRow},
    Postgres, Row, Transaction,
};
use timetable_events::{OutboxEvent, TimetableEvent};
use timetable_id::{ClassId, OutboxEventId, OverrideId, Uuid};
use tracing::debug;

use super::{DbError, TimetableStore, TimetableTx};
use crate::timetable::{AnnouncementSettings, DailyOverride, DefaultSlot, SlotStatus};

/// Store backed by the `timetable` schema.
#[derive(Clone)]
pub struct PgTimetableStore {
    pool: PgPool,
}

impl PgTimetableStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimetableStore for PgTimetableStore {
    async fn begin(&self) -> Result<Box<dyn TimetableTx>, DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::Query)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await
            .map_err(DbError::Query)?;
        Ok(Box::new(PgTimetableTx { tx }))
    }

    async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(())
    }
}

/// An open Postgres transaction. Rolled back on drop unless committed.
pub struct PgTimetableTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TimetableTx for PgTimetableTx {
    async fn list_default_slots(
        &mut self,
        class_id: ClassId,
        weekday: u8,
    ) -> Result<Vec<DefaultSlot>, DbError> {
        let rows = sqlx::query_as::<_, DefaultSlotRow>(
            r#"
            SELECT class_id, weekday, course_code, start_time, end_time, venue
            FROM timetable.default_slots
            WHERE class_id = $1 AND weekday = $2
            ORDER BY start_time ASC, id ASC
            "#,
        )
        .bind(class_id.as_uuid())
        .bind(i16::from(weekday))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(DbError::Query)?;

        rows.into_iter().map(DefaultSlot::try_from).collect()
    }

    async fn list_overrides(
        &mut self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> Result<Vec<DailyOverride>, DbError> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT id, class_id, date, slot_index, course_code, start_time, end_time, venue, status
            FROM timetable.daily_overrides
            WHERE class_id = $1 AND date = $2
            ORDER BY slot_index ASC
            "#,
        )
        .bind(class_id.as_uuid())
        .bind(date)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(DbError::Query)?;

        rows.into_iter().map(DailyOverride::try_from).collect()
    }

    async fn upsert_override(&mut self, over: &DailyOverride) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO timetable.daily_overrides (
                id,
                class_id,
                date,
                slot_index,
                course_code,
                start_time,
                end_time,
                venue,
                status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
            ON CONFLICT (class_id, date, slot_index)
            DO UPDATE SET
                course_code = EXCLUDED.course_code,
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                venue = EXCLUDED.venue,
                status = EXCLUDED.status,
                updated_at = now()
            "#,
        )
        .bind(over.id.as_uuid())
        .bind(over.class_id.as_uuid())
        .bind(over.date)
        .bind(over.slot_index)
        .bind(&over.course_code)
        .bind(over.start_time)
        .bind(over.end_time)
        .bind(&over.venue)
        .bind(over.status.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;

        Ok(())
    }

    async fn list_settings(&mut self) -> Result<Vec<AnnouncementSettings>, DbError> {
        let rows = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT class_id, matrix_room_id, daily_announce_time, daily_template,
                   update_template, last_announced_date
            FROM timetable.announcement_settings
            ORDER BY class_id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(DbError::Query)?;

        Ok(rows.into_iter().map(AnnouncementSettings::from).collect())
    }

    async fn get_settings(
        &mut self,
        class_id: ClassId,
    ) -> Result<Option<AnnouncementSettings>, DbError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT class_id, matrix_room_id, daily_announce_time, daily_template,
                   update_template, last_announced_date
            FROM timetable.announcement_settings
            WHERE class_id = $1
            "#,
        )
        .bind(class_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(DbError::Query)?;

        Ok(row.map(AnnouncementSettings::from))
    }

    async fn mark_announced(
        &mut self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE timetable.announcement_settings
            SET last_announced_date = $2
            WHERE class_id = $1
              AND (last_announced_date IS NULL OR last_announced_date < $2)
            "#,
        )
        .bind(class_id.as_uuid())
        .bind(date)
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_outbox(&mut self, event: &TimetableEvent) -> Result<OutboxEventId, DbError> {
        let row = OutboxEvent::new(event, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO timetable.outbox_events (
                id,
                event_type,
                payload,
                created_at,
                published
            )
            VALUES ($1, $2, $3, $4, false)
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(&row.event_type)
        .bind(&row.payload)
        .bind(row.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;

        debug!(event_id = %row.id, event_type = %row.event_type, "Outbox event queued");
        Ok(row.id)
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.tx.commit().await.map_err(DbError::Query)
    }
}

// =============================================================================
// Row types
// =============================================================================

struct DefaultSlotRow {
    class_id: Uuid,
    weekday: i16,
    course_code: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    venue: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for DefaultSlotRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            class_id: row.try_get("class_id")?,
            weekday: row.try_get("weekday")?,
            course_code: row.try_get("course_code")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            venue: row.try_get("venue")?,
        })
    }
}

impl TryFrom<DefaultSlotRow> for DefaultSlot {
    type Error = DbError;

    fn try_from(row: DefaultSlotRow) -> Result<Self, Self::Error> {
        let weekday = u8::try_from(row.weekday)
            .ok()
            .filter(|d| (1..=7).contains(d))
            .ok_or(DbError::InvalidRow {
                column: "weekday",
                value: row.weekday.to_string(),
            })?;

        Ok(DefaultSlot {
            class_id: ClassId::from_uuid(row.class_id),
            weekday,
            course_code: row.course_code,
            start_time: row.start_time,
            end_time: row.end_time,
            venue: row.venue,
        })
    }
}

struct OverrideRow {
    id: Uuid,
    class_id: Uuid,
    date: NaiveDate,
    slot_index: i32,
    course_code: Option<String>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    venue: Option<String>,
    status: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for OverrideRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            class_id: row.try_get("class_id")?,
            date: row.try_get("date")?,
            slot_index: row.try_get("slot_index")?,
            course_code: row.try_get("course_code")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            venue: row.try_get("venue")?,
            status: row.try_get("status")?,
        })
    }
}

impl TryFrom<OverrideRow> for DailyOverride {
    type Error = DbError;

    fn try_from(row: OverrideRow) -> Result<Self, Self::Error> {
        let status = SlotStatus::parse(&row.status).ok_or(DbError::InvalidRow {
            column: "status",
            value: row.status.clone(),
        })?;

        Ok(DailyOverride {
            id: OverrideId::from_uuid(row.id),
            class_id: ClassId::from_uuid(row.class_id),
            date: row.date,
            slot_index: row.slot_index,
            course_code: row.course_code,
            start_time: row.start_time,
            end_time: row.end_time,
            venue: row.venue,
            status,
        })
    }
}

struct SettingsRow {
    class_id: Uuid,
    matrix_room_id: String,
    daily_announce_time: NaiveTime,
    daily_template: String,
    update_template: String,
    last_announced_date: Option<NaiveDate>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for SettingsRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            class_id: row.try_get("class_id")?,
            matrix_room_id: row.try_get("matrix_room_id")?,
            daily_announce_time: row.try_get("daily_announce_time")?,
            daily_template: row.try_get("daily_template")?,
            update_template: row.try_get("update_template")?,
            last_announced_date: row.try_get("last_announced_date")?,
        })
    }
}

impl From<SettingsRow> for AnnouncementSettings {
    fn from(row: SettingsRow) -> Self {
        AnnouncementSettings {
            class_id: ClassId::from_uuid(row.class_id),
            target: row.matrix_room_id,
            daily_announce_time: row.daily_announce_time,
            daily_template: row.daily_template,
            update_template: row.update_template,
            last_announced_date: row.last_announced_date,
        }
    }
}
