//! The override command: validate, authorize, persist, maybe notify.

use chrono::{NaiveDate, NaiveTime};
use timetable_events::{TimetableEvent, TimetableUpdatedPayload};
use timetable_id::{ClassId, OutboxEventId, OverrideId, UserId};
use tracing::{debug, info, instrument};

use super::{ServiceError, TimetableService};
use crate::identity::{is_authorized, IdentityError, IdentityUser};
use crate::timetable::{
    resolve_single_slot, should_emit_late_update, weekday_number, DailyOverride, SlotStatus,
};

/// An edit to one slot of one class on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRequest {
    pub class_id: ClassId,
    pub slot_index: i32,
    pub course_code: String,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: String,
    pub status: String,
}

impl OverrideRequest {
    /// Check the request shape. Performs no I/O.
    pub fn validate(&self) -> Result<SlotStatus, ServiceError> {
        if self.slot_index <= 0 {
            return Err(ServiceError::invalid("slot_index must be positive"));
        }
        let status = SlotStatus::parse(&self.status).ok_or_else(|| {
            ServiceError::invalid(format!("unknown status {:?}", self.status))
        })?;
        if status != SlotStatus::Cancelled {
            if self.course_code.is_empty() {
                return Err(ServiceError::invalid("course_code is required"));
            }
            if self.start_time.is_none() {
                return Err(ServiceError::invalid("start_time is required"));
            }
            if self.end_time.is_none() {
                return Err(ServiceError::invalid("end_time is required"));
            }
            if self.venue.is_empty() {
                return Err(ServiceError::invalid("venue is required"));
            }
        }
        Ok(status)
    }

    fn to_override(&self, date: NaiveDate, status: SlotStatus) -> DailyOverride {
        DailyOverride {
            id: OverrideId::new(),
            class_id: self.class_id,
            date,
            slot_index: self.slot_index,
            course_code: non_empty(&self.course_code),
            start_time: self.start_time,
            end_time: self.end_time,
            venue: non_empty(&self.venue),
            status,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// What an accepted edit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideOutcome {
    pub date: NaiveDate,
    /// The late-update notice queued with the edit, if one was due.
    pub update_event: Option<OutboxEventId>,
}

impl TimetableService {
    /// Apply an edit to today's timetable, today being the local civil date.
    pub async fn update_today_override(
        &self,
        requester: UserId,
        request: OverrideRequest,
    ) -> Result<OverrideOutcome, ServiceError> {
        let date = self.today();
        self.create_daily_override(requester, date, request).await
    }

    /// Apply an edit to the timetable of `date`.
    #[instrument(
        skip(self, request),
        fields(
            requester = %requester,
            class_id = %request.class_id,
            date = %date,
            slot_index = request.slot_index,
        )
    )]
    pub async fn create_daily_override(
        &self,
        requester: UserId,
        date: NaiveDate,
        request: OverrideRequest,
    ) -> Result<OverrideOutcome, ServiceError> {
        let status = request.validate()?;

        let user = self.lookup_requester(requester).await?;
        if !is_authorized(&user, request.class_id) {
            debug!("requester lacks an editing role for this class");
            return Err(ServiceError::Unauthorized);
        }

        let over = request.to_override(date, status);

        let mut tx = self.store.begin().await?;
        tx.upsert_override(&over).await?;

        let mut update_event = None;
        if let Some(settings) = tx.get_settings(request.class_id).await? {
            let local_now = self.calendar.local(self.now());
            if should_emit_late_update(&settings, date, local_now) {
                let defaults = tx
                    .list_default_slots(request.class_id, weekday_number(date))
                    .await?;
                let slot = resolve_single_slot(&defaults, request.slot_index, &over);
                let event = TimetableEvent::TimetableUpdated(TimetableUpdatedPayload {
                    class_id: request.class_id,
                    date,
                    update_template: settings.update_template,
                    slots: vec![slot.to_payload()],
                    updated_by: requester,
                });
                update_event = Some(tx.insert_outbox(&event).await?);
            }
        }

        tx.commit().await?;

        info!(
            status = %status,
            late_update = update_event.is_some(),
            "override saved"
        );
        Ok(OverrideOutcome { date, update_event })
    }

    async fn lookup_requester(&self, requester: UserId) -> Result<IdentityUser, ServiceError> {
        match tokio::time::timeout(self.identity_timeout, self.identity.get_me(requester)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(IdentityError::Timeout.into()),
        }
    }
}
