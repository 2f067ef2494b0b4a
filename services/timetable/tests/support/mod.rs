//! Shared fixtures for the service and router tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use timetable_id::{ClassId, UserId};
use timetable_service::db::MemoryStore;
use timetable_service::identity::{IdentityClient, IdentityError, IdentityRole, IdentityUser};
use timetable_service::service::{OverrideRequest, TimetableService};
use timetable_service::timetable::{AnnouncementSettings, CivilCalendar, DefaultSlot};

/// A Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// An instant on `date` at `h:m` UTC. The fixtures use a UTC calendar.
pub fn at(date: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(hm(h, m)))
}

/// Identity service double with a fixed user table.
#[derive(Default)]
pub struct FakeIdentity {
    users: Mutex<HashMap<UserId, IdentityUser>>,
    calls: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl FakeIdentity {
    fn add(&self, roles: Vec<IdentityRole>) -> UserId {
        let id = UserId::new();
        self.users
            .lock()
            .unwrap()
            .insert(id, IdentityUser { id, roles });
        id
    }

    pub fn faculty(&self) -> UserId {
        self.add(vec![IdentityRole {
            name: "faculty".to_string(),
            class_id: None,
        }])
    }

    pub fn class_rep(&self, class_id: ClassId) -> UserId {
        self.add(vec![IdentityRole {
            name: "cr".to_string(),
            class_id: Some(class_id),
        }])
    }

    pub fn student(&self) -> UserId {
        self.add(vec![IdentityRole {
            name: "student".to_string(),
            class_id: None,
        }])
    }

    /// A second requester id that resolves to `user`'s record.
    pub fn alias_of(&self, user: UserId) -> UserId {
        let alias = UserId::new();
        let mut users = self.users.lock().unwrap();
        let record = users.get(&user).cloned().expect("unknown user");
        users.insert(alias, record);
        alias
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityClient for FakeIdentity {
    async fn get_me(&self, user_id: UserId) -> Result<IdentityUser, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or(IdentityError::NotFound)
    }
}

/// A class with Monday defaults CS101 09:00 R1 and CS102 10:00 R2,
/// announced daily at 07:00.
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<FakeIdentity>,
    pub service: TimetableService,
    pub class_id: ClassId,
    clock: Arc<Mutex<DateTime<Utc>>>,
}

impl Fixture {
    pub async fn new(now: DateTime<Utc>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(FakeIdentity::default());
        let clock = Arc::new(Mutex::new(now));

        let service_clock = Arc::clone(&clock);
        let service = TimetableService::new(store.clone(), identity.clone(), CivilCalendar::utc())
            .with_identity_timeout(Duration::from_secs(1))
            .with_clock(move || *service_clock.lock().unwrap());

        let fixture = Self {
            store,
            identity,
            service,
            class_id: ClassId::new(),
            clock,
        };
        fixture.add_class(fixture.class_id).await;
        fixture
    }

    pub async fn add_class(&self, class_id: ClassId) {
        for (course, start, venue) in [("CS101", 9, "R1"), ("CS102", 10, "R2")] {
            self.store
                .add_default_slot(DefaultSlot {
                    class_id,
                    weekday: 1,
                    course_code: course.to_string(),
                    start_time: hm(start, 0),
                    end_time: hm(start + 1, 0),
                    venue: venue.to_string(),
                })
                .await;
        }
        self.store
            .put_settings(AnnouncementSettings {
                class_id,
                target: "!cs-2026:example.org".to_string(),
                daily_announce_time: hm(7, 0),
                daily_template: "Today's classes".to_string(),
                update_template: "Timetable changed".to_string(),
                last_announced_date: None,
            })
            .await;
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.clock.lock().unwrap()
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        *self.clock.lock().unwrap() = now;
    }

    /// A complete "replaced" edit of `slot_index`.
    pub fn replace(&self, slot_index: i32, course: &str, venue: &str) -> OverrideRequest {
        OverrideRequest {
            class_id: self.class_id,
            slot_index,
            course_code: course.to_string(),
            start_time: Some(hm(11, 0)),
            end_time: Some(hm(12, 0)),
            venue: venue.to_string(),
            status: "replaced".to_string(),
        }
    }

    pub fn cancel(&self, slot_index: i32) -> OverrideRequest {
        OverrideRequest {
            class_id: self.class_id,
            slot_index,
            course_code: String::new(),
            start_time: None,
            end_time: None,
            venue: String::new(),
            status: "cancelled".to_string(),
        }
    }
}
