//! Event proposal entity model and DTOs.

use htw_core::event_workflow::EventStatus;
use htw_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `events` table.
///
/// `status` is decoded through [`EventStatus`], so a row carrying a value
/// outside the vocabulary fails to load instead of leaking through.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub host_user_id: DbId,
    pub venue_id: Option<DbId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub idea_text: Option<String>,
    pub event_types: Vec<String>,
    pub audience_types: Vec<String>,
    pub capacity_target: Option<i32>,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    pub time_flexible: bool,
    pub marketing_stage: Option<String>,
    pub luma_url: Option<String>,
    /// Opaque attachment metadata; files themselves live elsewhere.
    pub attachments: serde_json::Value,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a draft event.
///
/// Vocabulary fields arrive as plain strings and are validated by the
/// caller before they reach the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub idea_text: Option<String>,
    #[serde(default)]
    pub event_types: Vec<String>,
    #[serde(default)]
    pub audience_types: Vec<String>,
    pub capacity_target: Option<i32>,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    pub time_flexible: Option<bool>,
    pub venue_id: Option<DbId>,
    pub marketing_stage: Option<String>,
    pub luma_url: Option<String>,
    pub attachments: Option<serde_json::Value>,
}

/// DTO for editing an event's fields. All fields are optional; `status` is
/// deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub idea_text: Option<String>,
    pub event_types: Option<Vec<String>>,
    pub audience_types: Option<Vec<String>>,
    pub capacity_target: Option<i32>,
    pub start_at: Option<Timestamp>,
    pub end_at: Option<Timestamp>,
    pub time_flexible: Option<bool>,
    pub venue_id: Option<DbId>,
    pub marketing_stage: Option<String>,
    pub luma_url: Option<String>,
    pub attachments: Option<serde_json::Value>,
}

impl Event {
    /// Apply an edit in memory, field by field.
    pub fn apply_update(&mut self, input: &UpdateEvent) {
        if let Some(v) = &input.title {
            self.title = Some(v.clone());
        }
        if let Some(v) = &input.description {
            self.description = Some(v.clone());
        }
        if let Some(v) = &input.idea_text {
            self.idea_text = Some(v.clone());
        }
        if let Some(v) = &input.event_types {
            self.event_types = v.clone();
        }
        if let Some(v) = &input.audience_types {
            self.audience_types = v.clone();
        }
        if let Some(v) = input.capacity_target {
            self.capacity_target = Some(v);
        }
        if let Some(v) = input.start_at {
            self.start_at = Some(v);
        }
        if let Some(v) = input.end_at {
            self.end_at = Some(v);
        }
        if let Some(v) = input.time_flexible {
            self.time_flexible = v;
        }
        if let Some(v) = input.venue_id {
            self.venue_id = Some(v);
        }
        if let Some(v) = &input.marketing_stage {
            self.marketing_stage = Some(v.clone());
        }
        if let Some(v) = &input.luma_url {
            self.luma_url = Some(v.clone());
        }
        if let Some(v) = &input.attachments {
            self.attachments = v.clone();
        }
    }
}
