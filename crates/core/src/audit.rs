//! Audit trail constants and integrity hashing.
//!
//! Every platform event ends up as one append-only `audit_log` row. Rows are
//! chained: each row's hash covers its own canonical content plus the hash
//! of the row before it, so any edit or deletion breaks the chain.

use crate::hashing;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Action type constants
// ---------------------------------------------------------------------------

/// Known action types for audit log entries.
pub mod action_types {
    pub const USER_ONBOARD: &str = "user_onboard";
    pub const USER_UPDATE: &str = "user_update";
    pub const ROLE_CHANGE: &str = "role_change";
    pub const EVENT_CREATE: &str = "event_create";
    pub const EVENT_UPDATE: &str = "event_update";
    pub const EVENT_TRANSITION: &str = "event_transition";
    pub const VENUE_CREATE: &str = "venue_create";
    pub const VENUE_TRANSITION: &str = "venue_transition";
    pub const SYSTEM: &str = "system";
}

/// Map a platform event type (e.g. `event.status_changed`) to an audit action.
///
/// Unknown event types are recorded as [`action_types::SYSTEM`].
pub fn action_for_event_type(event_type: &str) -> &'static str {
    match event_type {
        "user.onboarded" => action_types::USER_ONBOARD,
        "user.updated" => action_types::USER_UPDATE,
        "user.roles_changed" => action_types::ROLE_CHANGE,
        "event.created" => action_types::EVENT_CREATE,
        "event.updated" => action_types::EVENT_UPDATE,
        "event.status_changed" => action_types::EVENT_TRANSITION,
        "venue.created" => action_types::VENUE_CREATE,
        "venue.status_changed" => action_types::VENUE_TRANSITION,
        _ => action_types::SYSTEM,
    }
}

// ---------------------------------------------------------------------------
// Integrity hash computation
// ---------------------------------------------------------------------------

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "HTW_AUDIT_CHAIN_SEED_V1";

/// Canonical string hashed for one entry.
pub fn canonical_entry_data(
    action_type: &str,
    entity_type: Option<&str>,
    entity_id: Option<DbId>,
    user_id: Option<DbId>,
    details: &serde_json::Value,
) -> String {
    format!(
        "{action_type}|{}|{}|{}|{details}",
        entity_type.unwrap_or(""),
        entity_id.map(|id| id.to_string()).unwrap_or_default(),
        user_id.map(|id| id.to_string()).unwrap_or_default(),
    )
}

/// Compute the SHA-256 integrity hash for an audit log entry.
///
/// `prev_hash` is the hash of the previous entry, or `None` for the first
/// entry in the chain (which uses a known seed value).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Walk `(entry_data, stored_hash)` pairs in id order.
///
/// Returns the index of the first entry whose stored hash does not match,
/// or `None` when the whole chain verifies.
pub fn first_broken_link<'a, I>(entries: I) -> Option<usize>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut prev: Option<String> = None;
    for (idx, (data, stored)) in entries.into_iter().enumerate() {
        let expected = compute_integrity_hash(prev.as_deref(), data);
        if expected != stored {
            return Some(idx);
        }
        prev = Some(expected);
    }
    None
}

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// Fields that should be redacted from audit log details before storage.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "credential",
    "phone",
];

/// Redact sensitive fields from a JSON value, recursing into objects and arrays.
///
/// Any key containing one of [`SENSITIVE_FIELDS`] (case-insensitive) has its
/// value replaced with `"[REDACTED]"`.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // -----------------------------------------------------------------------
    // Action mapping
    // -----------------------------------------------------------------------

    #[test]
    fn status_change_maps_to_transition() {
        assert_eq!(
            action_for_event_type("event.status_changed"),
            action_types::EVENT_TRANSITION
        );
        assert_eq!(
            action_for_event_type("venue.status_changed"),
            action_types::VENUE_TRANSITION
        );
    }

    #[test]
    fn unknown_event_type_maps_to_system() {
        assert_eq!(action_for_event_type("something.else"), action_types::SYSTEM);
    }

    // -----------------------------------------------------------------------
    // Hash chain
    // -----------------------------------------------------------------------

    #[test]
    fn first_entry_uses_seed() {
        let hash = compute_integrity_hash(None, "test_data");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, compute_integrity_hash(None, "test_data"));
    }

    #[test]
    fn chained_entry_uses_previous_hash() {
        let first = compute_integrity_hash(None, "entry_1");
        let second = compute_integrity_hash(Some(&first), "entry_2");
        assert_ne!(second, compute_integrity_hash(None, "entry_2"));
    }

    #[test]
    fn intact_chain_verifies() {
        let h1 = compute_integrity_hash(None, "a");
        let h2 = compute_integrity_hash(Some(&h1), "b");
        assert_eq!(first_broken_link([("a", h1.as_str()), ("b", h2.as_str())]), None);
    }

    #[test]
    fn tampered_entry_is_located() {
        let h1 = compute_integrity_hash(None, "a");
        let h2 = compute_integrity_hash(Some(&h1), "b");
        assert_eq!(
            first_broken_link([("a", h1.as_str()), ("B", h2.as_str())]),
            Some(1)
        );
    }

    #[test]
    fn canonical_data_is_stable() {
        let data = canonical_entry_data(
            action_types::EVENT_TRANSITION,
            Some("event"),
            Some(4),
            None,
            &json!({"to": "submitted"}),
        );
        assert_eq!(data, r#"event_transition|event|4||{"to":"submitted"}"#);
    }

    // -----------------------------------------------------------------------
    // Redaction
    // -----------------------------------------------------------------------

    #[test]
    fn nested_sensitive_fields_are_redacted() {
        let input = json!({
            "note": "ok",
            "profile": {"phone": "555-0100", "name": "Ada"},
            "items": [{"api_token": "abc"}]
        });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["note"], "ok");
        assert_eq!(out["profile"]["phone"], "[REDACTED]");
        assert_eq!(out["profile"]["name"], "Ada");
        assert_eq!(out["items"][0]["api_token"], "[REDACTED]");
    }
}
