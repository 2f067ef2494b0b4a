//! In-memory timetable store for tests and local development.
//!
//! Transactions are serialized: `begin` takes the state lock and holds it
//! until the transaction is committed or dropped. Writes go to a working copy
//! that replaces the shared state on commit, so a dropped transaction leaves
//! no trace.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use timetable_events::{OutboxEvent, TimetableEvent};
use timetable_id::{ClassId, OutboxEventId};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::{DbError, TimetableStore, TimetableTx};
use crate::timetable::{AnnouncementSettings, DailyOverride, DefaultSlot};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    default_slots: Vec<DefaultSlot>,
    overrides: BTreeMap<(ClassId, NaiveDate, i32), DailyOverride>,
    settings: BTreeMap<ClassId, AnnouncementSettings>,
    outbox: Vec<OutboxEvent>,
}

/// Which writes should fail, per class.
#[derive(Debug, Default)]
struct Faults {
    outbox: HashSet<ClassId>,
    upsert: HashSet<ClassId>,
}

/// Store that keeps everything in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<AsyncMutex<MemoryState>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_default_slot(&self, slot: DefaultSlot) {
        self.state.lock().await.default_slots.push(slot);
    }

    pub async fn put_settings(&self, settings: AnnouncementSettings) {
        self.state
            .lock()
            .await
            .settings
            .insert(settings.class_id, settings);
    }

    pub async fn settings(&self, class_id: ClassId) -> Option<AnnouncementSettings> {
        self.state.lock().await.settings.get(&class_id).cloned()
    }

    pub async fn overrides(&self) -> Vec<DailyOverride> {
        self.state.lock().await.overrides.values().cloned().collect()
    }

    /// Every outbox row, oldest first.
    pub async fn outbox(&self) -> Vec<OutboxEvent> {
        self.state.lock().await.outbox.clone()
    }

    /// Make outbox appends for `class_id` fail.
    pub fn fail_outbox_for(&self, class_id: ClassId) {
        self.faults_mut().outbox.insert(class_id);
    }

    /// Make override upserts for `class_id` fail.
    pub fn fail_upsert_for(&self, class_id: ClassId) {
        self.faults_mut().upsert.insert(class_id);
    }

    fn faults_mut(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TimetableStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn TimetableTx>, DbError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            faults: Arc::clone(&self.faults),
        }))
    }

    async fn health_check(&self) -> Result<(), DbError> {
        Ok(())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryTx {
    fn should_fail(&self, pick: impl Fn(&Faults) -> bool) -> bool {
        let faults = self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        pick(&faults)
    }
}

fn injected_failure() -> DbError {
    DbError::Query(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl TimetableTx for MemoryTx {
    async fn list_default_slots(
        &mut self,
        class_id: ClassId,
        weekday: u8,
    ) -> Result<Vec<DefaultSlot>, DbError> {
        let mut slots: Vec<DefaultSlot> = self
            .working
            .default_slots
            .iter()
            .filter(|s| s.class_id == class_id && s.weekday == weekday)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn list_overrides(
        &mut self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> Result<Vec<DailyOverride>, DbError> {
        Ok(self
            .working
            .overrides
            .range((class_id, date, i32::MIN)..=(class_id, date, i32::MAX))
            .map(|(_, o)| o.clone())
            .collect())
    }

    async fn upsert_override(&mut self, over: &DailyOverride) -> Result<(), DbError> {
        if self.should_fail(|f| f.upsert.contains(&over.class_id)) {
            return Err(injected_failure());
        }

        let key = (over.class_id, over.date, over.slot_index);
        let mut stored = over.clone();
        if let Some(existing) = self.working.overrides.get(&key) {
            stored.id = existing.id;
        }
        self.working.overrides.insert(key, stored);
        Ok(())
    }

    async fn list_settings(&mut self) -> Result<Vec<AnnouncementSettings>, DbError> {
        Ok(self.working.settings.values().cloned().collect())
    }

    async fn get_settings(
        &mut self,
        class_id: ClassId,
    ) -> Result<Option<AnnouncementSettings>, DbError> {
        Ok(self.working.settings.get(&class_id).cloned())
    }

    async fn mark_announced(
        &mut self,
        class_id: ClassId,
        date: NaiveDate,
    ) -> Result<bool, DbError> {
        let Some(settings) = self.working.settings.get_mut(&class_id) else {
            return Ok(false);
        };
        match settings.last_announced_date {
            Some(last) if last >= date => Ok(false),
            _ => {
                settings.last_announced_date = Some(date);
                Ok(true)
            }
        }
    }

    async fn insert_outbox(&mut self, event: &TimetableEvent) -> Result<OutboxEventId, DbError> {
        if self.should_fail(|f| f.outbox.contains(&event.class_id())) {
            return Err(injected_failure());
        }

        let row = OutboxEvent::new(event, Utc::now())?;
        let id = row.id;
        self.working.outbox.push(row);
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        let MemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn settings(class_id: ClassId) -> AnnouncementSettings {
        AnnouncementSettings {
            class_id,
            target: "!room:example.org".to_string(),
            daily_announce_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            daily_template: "daily".to_string(),
            update_template: "update".to_string(),
            last_announced_date: None,
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        let class_id = ClassId::new();
        store.put_settings(settings(class_id)).await;
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            assert!(tx.mark_announced(class_id, date).await.unwrap());
        }

        assert_eq!(store.settings(class_id).await.unwrap().last_announced_date, None);
    }

    #[tokio::test]
    async fn test_mark_announced_is_conditional() {
        let store = MemoryStore::new();
        let class_id = ClassId::new();
        store.put_settings(settings(class_id)).await;
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.mark_announced(class_id, monday).await.unwrap());
        assert!(!tx.mark_announced(class_id, monday).await.unwrap());
        assert!(!tx.mark_announced(class_id, sunday).await.unwrap());
        assert!(!tx.mark_announced(ClassId::new(), monday).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(
            store.settings(class_id).await.unwrap().last_announced_date,
            Some(monday)
        );
    }
}
