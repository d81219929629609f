//! Audit log entity models and DTOs.
//!
//! Audit rows are immutable records with no `updated_at`.

use htw_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details_json: serde_json::Value,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

impl AuditLog {
    /// The canonical content this row's hash was computed over.
    pub fn canonical_data(&self) -> String {
        htw_core::audit::canonical_entry_data(
            &self.action_type,
            self.entity_type.as_deref(),
            self.entity_id,
            self.user_id,
            &self.details_json,
        )
    }
}

/// DTO for inserting a new audit log entry. The hash is computed by the caller.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub user_id: Option<DbId>,
    pub action_type: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub details_json: serde_json::Value,
    pub integrity_hash: String,
}

/// Filter parameters for querying audit logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub user_id: Option<DbId>,
    pub action_type: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditQuery {
    /// In-memory equivalent of the SQL filter.
    pub fn matches(&self, entry: &AuditLog) -> bool {
        if self.user_id.is_some() && self.user_id != entry.user_id {
            return false;
        }
        if self.entity_id.is_some() && self.entity_id != entry.entity_id {
            return false;
        }
        if let Some(action) = &self.action_type {
            if *action != entry.action_type {
                return false;
            }
        }
        if let Some(entity_type) = &self.entity_type {
            if Some(entity_type) != entry.entity_type.as_ref() {
                return false;
            }
        }
        true
    }
}
