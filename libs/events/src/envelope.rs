//! The outbox envelope: an event type tag plus an opaque JSON payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use timetable_id::{ClassId, OutboxEventId};

use crate::{
    event_types, DailyTimetableAnnouncedPayload, EventError, TimetableUpdatedPayload,
};

/// An event this service can enqueue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimetableEvent {
    DailyTimetableAnnounced(DailyTimetableAnnouncedPayload),
    TimetableUpdated(TimetableUpdatedPayload),
}

impl TimetableEvent {
    /// The event type string stored alongside the payload.
    pub fn event_type(&self) -> &'static str {
        match self {
            TimetableEvent::DailyTimetableAnnounced(_) => event_types::DAILY_TIMETABLE_ANNOUNCED,
            TimetableEvent::TimetableUpdated(_) => event_types::TIMETABLE_UPDATED,
        }
    }

    /// The class this event is about.
    pub fn class_id(&self) -> ClassId {
        match self {
            TimetableEvent::DailyTimetableAnnounced(p) => p.class_id,
            TimetableEvent::TimetableUpdated(p) => p.class_id,
        }
    }

    /// Serializes the payload into the document stored in the outbox.
    pub fn to_payload(&self) -> Result<serde_json::Value, EventError> {
        let value = match self {
            TimetableEvent::DailyTimetableAnnounced(p) => serde_json::to_value(p)?,
            TimetableEvent::TimetableUpdated(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }

    /// Rebuilds an event from a stored type tag and payload.
    pub fn from_parts(event_type: &str, payload: serde_json::Value) -> Result<Self, EventError> {
        match event_type {
            event_types::DAILY_TIMETABLE_ANNOUNCED => serde_json::from_value(payload)
                .map(TimetableEvent::DailyTimetableAnnounced)
                .map_err(|e| EventError::InvalidPayload(e.to_string())),
            event_types::TIMETABLE_UPDATED => serde_json::from_value(payload)
                .map(TimetableEvent::TimetableUpdated)
                .map_err(|e| EventError::InvalidPayload(e.to_string())),
            other => Err(EventError::UnknownEventType(other.to_string())),
        }
    }
}

/// A row in the outbox table.
///
/// Write-once: the relay flips `published`, this service never does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: OutboxEventId,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub published: bool,
}

impl OutboxEvent {
    /// Builds an unpublished outbox row for `event`.
    pub fn new(event: &TimetableEvent, created_at: DateTime<Utc>) -> Result<Self, EventError> {
        Ok(Self {
            id: OutboxEventId::new(),
            event_type: event.event_type().to_string(),
            payload: event.to_payload()?,
            created_at,
            published: false,
        })
    }

    /// Decodes the payload back into a typed event.
    pub fn decode(&self) -> Result<TimetableEvent, EventError> {
        TimetableEvent::from_parts(&self.event_type, self.payload.clone())
    }
}
