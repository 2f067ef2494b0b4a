//! The periodic daily-announcement check.

use chrono::{DateTime, NaiveDate, Utc};
use timetable_events::{DailyTimetableAnnouncedPayload, TimetableEvent};
use timetable_id::{ClassId, OutboxEventId};
use tracing::{debug, info, instrument, warn};

use super::{resolve_in_tx, ServiceError, TimetableService};
use crate::timetable::{is_announcement_due, AnnouncementSettings};

/// Result of claiming one class's announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Announced(OutboxEventId),
    /// Another tick or process claimed the date first.
    AlreadyAnnounced,
}

/// A class whose check failed during a tick.
#[derive(Debug)]
pub struct ClassFailure {
    pub class_id: ClassId,
    pub error: ServiceError,
}

/// Statistics from one announcement tick.
#[derive(Debug, Default)]
pub struct AnnouncementReport {
    pub classes_checked: usize,
    pub not_due: usize,
    pub announced: usize,
    pub already_announced: usize,
    pub failures: Vec<ClassFailure>,
}

impl AnnouncementReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl TimetableService {
    /// Announce today's timetable for every class whose announce time has
    /// passed and which has not been announced today.
    ///
    /// Each class is claimed and enqueued in its own transaction. A failing
    /// class is recorded in the report and the rest are still checked. Only
    /// a failure to list the configured classes fails the whole tick.
    #[instrument(skip(self), fields(now = %now))]
    pub async fn emit_daily_announcement_if_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<AnnouncementReport, ServiceError> {
        let settings = {
            let mut tx = self.store.begin().await?;
            let settings = tx.list_settings().await?;
            tx.commit().await?;
            settings
        };

        let local_now = self.calendar.local(now);
        let today = local_now.date();
        let mut report = AnnouncementReport::default();

        for class in settings {
            report.classes_checked += 1;
            if !is_announcement_due(&class, local_now) {
                report.not_due += 1;
                continue;
            }

            match self.announce_class(&class, today).await {
                Ok(ClaimOutcome::Announced(event_id)) => {
                    report.announced += 1;
                    info!(
                        class_id = %class.class_id,
                        date = %today,
                        event_id = %event_id,
                        "daily timetable announced"
                    );
                }
                Ok(ClaimOutcome::AlreadyAnnounced) => {
                    report.already_announced += 1;
                    debug!(class_id = %class.class_id, "announcement already claimed");
                }
                Err(error) => {
                    warn!(
                        class_id = %class.class_id,
                        error = %error,
                        "failed to announce daily timetable"
                    );
                    report.failures.push(ClassFailure {
                        class_id: class.class_id,
                        error,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Claim `date` for one class and enqueue its announcement.
    async fn announce_class(
        &self,
        settings: &AnnouncementSettings,
        date: NaiveDate,
    ) -> Result<ClaimOutcome, ServiceError> {
        let mut tx = self.store.begin().await?;
        if !tx.mark_announced(settings.class_id, date).await? {
            return Ok(ClaimOutcome::AlreadyAnnounced);
        }

        let slots = resolve_in_tx(tx.as_mut(), settings.class_id, date).await?;
        let event = TimetableEvent::DailyTimetableAnnounced(DailyTimetableAnnouncedPayload {
            class_id: settings.class_id,
            date,
            target: settings.target.clone(),
            template: settings.daily_template.clone(),
            slots: slots.iter().map(|slot| slot.to_payload()).collect(),
        });
        let event_id = tx.insert_outbox(&event).await?;
        tx.commit().await?;
        Ok(ClaimOutcome::Announced(event_id))
    }
}
