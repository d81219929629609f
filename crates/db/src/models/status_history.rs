//! Append-only status history rows for events and venues.
//!
//! Both tables share one shape. Rows are never updated or deleted, so there
//! is no `updated_at` and no update DTO.

use htw_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `event_status_history` or `venue_status_history`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusHistory {
    pub id: DbId,
    /// The event or venue this row belongs to.
    pub entity_id: DbId,
    pub from_status: Option<String>,
    pub to_status: String,
    /// `None` when the change was made by the system.
    pub changed_by: Option<DbId>,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

/// A requested status change, handed to the store for a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange<S> {
    pub entity_id: DbId,
    /// Status the caller observed; the write only applies if it still holds.
    pub from: S,
    pub to: S,
    pub changed_by: Option<DbId>,
    pub note: Option<String>,
}

/// Counts of review decisions in a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct DecisionCounts {
    pub approved: i64,
    pub declined: i64,
}
