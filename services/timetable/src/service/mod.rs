//! Timetable service: the override command and the daily announcement check.
//!
//! Both paths share the resolution engine and both append to the outbox in
//! the same transaction as their state change. There is no in-process locking;
//! exclusivity comes from conditional statements in storage.

mod announce;
mod error;
mod overrides;

pub use announce::{AnnouncementReport, ClaimOutcome, ClassFailure};
pub use error::{ErrorKind, ServiceError};
pub use overrides::{OverrideOutcome, OverrideRequest};

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use timetable_id::ClassId;
use tracing::instrument;

use crate::db::{TimetableStore, TimetableTx};
use crate::identity::IdentityClient;
use crate::timetable::{resolve_day, weekday_number, CivilCalendar, ResolvedSlot};

/// Default bound on the identity lookup.
pub const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Timetable operations over a store and an identity service.
#[derive(Clone)]
pub struct TimetableService {
    store: Arc<dyn TimetableStore>,
    identity: Arc<dyn IdentityClient>,
    calendar: CivilCalendar,
    identity_timeout: Duration,
    clock: Clock,
}

impl TimetableService {
    pub fn new(
        store: Arc<dyn TimetableStore>,
        identity: Arc<dyn IdentityClient>,
        calendar: CivilCalendar,
    ) -> Self {
        Self {
            store,
            identity,
            calendar,
            identity_timeout: DEFAULT_IDENTITY_TIMEOUT,
            clock: Arc::new(Utc::now),
        }
    }

    /// Bound the identity lookup on the edit path.
    pub fn with_identity_timeout(mut self, timeout: Duration) -> Self {
        self.identity_timeout = timeout;
        self
    }

    /// Replace the wall clock, for tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn calendar(&self) -> CivilCalendar {
        self.calendar
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// The local civil date right now.
    pub fn today(&self) -> NaiveDate {
        self.calendar.today(self.now())
    }

    /// Resolve the effective timetable for a class on a date.
    #[instrument(skip(self), fields(class_id = %class_id, date = %date))]
    pub async fn resolve_timetable(
        &self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> Result<Vec<ResolvedSlot>, ServiceError> {
        let mut tx = self.store.begin().await?;
        let slots = resolve_in_tx(tx.as_mut(), class_id, date).await?;
        tx.commit().await?;
        Ok(slots)
    }

    /// Check that storage is reachable.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.store.health_check().await.map_err(ServiceError::from)
    }
}

/// Resolve a whole day using reads from an open transaction.
pub(crate) async fn resolve_in_tx(
    tx: &mut dyn TimetableTx,
    class_id: ClassId,
    date: NaiveDate,
) -> Result<Vec<ResolvedSlot>, ServiceError> {
    let defaults = tx.list_default_slots(class_id, weekday_number(date)).await?;
    let overrides = tx.list_overrides(class_id, date).await?;
    Ok(resolve_day(&defaults, &overrides))
}
