//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared as `Arc<EventBus>`. Publishing never blocks and
//! never fails from the caller's point of view: an accepted status change
//! stays accepted even when nobody is listening.

use chrono::{DateTime, Utc};
use htw_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// Dot-separated names of the events the portal publishes.
pub mod event_names {
    pub const USER_ONBOARDED: &str = "user.onboarded";
    pub const USER_UPDATED: &str = "user.updated";
    pub const USER_ROLES_CHANGED: &str = "user.roles_changed";
    pub const EVENT_CREATED: &str = "event.created";
    pub const EVENT_UPDATED: &str = "event.updated";
    /// Payload is a [`StatusChangedPayload`](super::StatusChangedPayload).
    pub const EVENT_STATUS_CHANGED: &str = "event.status_changed";
    pub const VENUE_CREATED: &str = "venue.created";
    /// Payload is a [`StatusChangedPayload`](super::StatusChangedPayload).
    pub const VENUE_STATUS_CHANGED: &str = "venue.status_changed";
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// Something that happened in the portal.
///
/// Constructed via [`PlatformEvent::new`] and enriched with
/// [`with_source`](PlatformEvent::with_source),
/// [`with_actor`](PlatformEvent::with_actor) and
/// [`with_payload`](PlatformEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// One of [`event_names`].
    pub event_type: String,

    /// Entity kind the event is about (`"event"`, `"venue"`, `"user"`).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// Acting user; `None` for system actions.
    pub actor_user_id: Option<DbId>,

    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    /// Create an event with an empty object payload.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user. `None` leaves the event attributed to the system.
    pub fn with_actor(mut self, user_id: Option<DbId>) -> Self {
        self.actor_user_id = user_id;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Decode the payload of a `*.status_changed` event.
    pub fn status_change(&self) -> Option<StatusChangedPayload> {
        match self.event_type.as_str() {
            event_names::EVENT_STATUS_CHANGED | event_names::VENUE_STATUS_CHANGED => {
                serde_json::from_value(self.payload.clone()).ok()
            }
            _ => None,
        }
    }
}

/// Payload carried by `event.status_changed` and `venue.status_changed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangedPayload {
    pub from: String,
    pub to: String,
    pub note: Option<String>,
    /// Owner of the event. Absent for venues.
    #[serde(default)]
    pub host_user_id: Option<DbId>,
    /// Event title or venue name at the time of the change.
    #[serde(default)]
    pub title: Option<String>,
}

impl StatusChangedPayload {
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "from": self.from,
            "to": self.to,
            "note": self.note,
            "host_user_id": self.host_user_id,
            "title": self.title,
        })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use htw_events::bus::{event_names, EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::new(event_names::EVENT_CREATED).with_source("event", 1));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when there are none.
    pub fn publish(&self, event: PlatformEvent) {
        tracing::debug!(
            event_type = %event.event_type,
            entity_id = ?event.source_entity_id,
            "Publishing platform event"
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
