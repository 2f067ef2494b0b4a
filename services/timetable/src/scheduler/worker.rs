//! Announcement background worker.
//!
//! Runs the announcement check on a periodic interval.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::service::TimetableService;

/// Worker that ticks the daily announcement check.
pub struct AnnouncementWorker {
    service: TimetableService,
    interval: Duration,
}

impl AnnouncementWorker {
    pub fn new(service: TimetableService, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Run the worker until shutdown is signaled.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting announcement worker"
        );

        // The first tick completes immediately, so a restart past the announce
        // time does not wait a full interval.
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Announcement worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run a single announcement pass.
    async fn tick(&self) {
        let report = match self
            .service
            .emit_daily_announcement_if_due(self.service.now())
            .await
        {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Announcement check failed");
                return;
            }
        };

        if report.announced > 0 || report.has_failures() {
            info!(
                classes_checked = report.classes_checked,
                announced = report.announced,
                already_announced = report.already_announced,
                failed = report.failures.len(),
                "Announcement check complete"
            );
        }
        for failure in &report.failures {
            warn!(
                class_id = %failure.class_id,
                error = %failure.error,
                "Class skipped this tick"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{NaiveTime, TimeZone, Utc};
    use timetable_id::{ClassId, UserId};

    use crate::db::MemoryStore;
    use crate::identity::{IdentityClient, IdentityError, IdentityUser};
    use crate::timetable::{AnnouncementSettings, CivilCalendar};

    struct NoIdentity;

    #[async_trait]
    impl IdentityClient for NoIdentity {
        async fn get_me(&self, _user_id: UserId) -> Result<IdentityUser, IdentityError> {
            Err(IdentityError::NotConfigured)
        }
    }

    #[tokio::test]
    async fn test_worker_announces_on_first_tick_and_stops() {
        let store = Arc::new(MemoryStore::new());
        let class_id = ClassId::new();
        store
            .put_settings(AnnouncementSettings {
                class_id,
                target: "!room:example.org".to_string(),
                daily_announce_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                daily_template: "daily".to_string(),
                update_template: "update".to_string(),
                last_announced_date: None,
            })
            .await;

        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let service = TimetableService::new(store.clone(), Arc::new(NoIdentity), CivilCalendar::utc())
            .with_clock(move || now);
        let worker = AnnouncementWorker::new(service, Duration::from_millis(20));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

        let mut announced = false;
        for _ in 0..100 {
            if !store.outbox().await.is_empty() {
                announced = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(announced);

        // Later ticks with the same clock find the date already claimed.
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.outbox().await.len(), 1);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
