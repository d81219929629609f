//! Field validation for event proposals.
//!
//! Drafts may be incomplete; anything past `draft` must carry a usable title
//! and description. The DB and API layers call these before every write.

use crate::error::CoreError;
use crate::types::Timestamp;

/* --------------------------------------------------------------------------
Constants
-------------------------------------------------------------------------- */

/// Maximum length of an event title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of an event description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// Maximum length of the free-form idea pitch.
pub const MAX_IDEA_TEXT_LENGTH: usize = 5_000;

/// Maximum length of a transition note.
pub const MAX_NOTE_LENGTH: usize = 2_000;

/* --------------------------------------------------------------------------
Validation functions
-------------------------------------------------------------------------- */

fn check_length(field: &str, value: Option<&str>, max: usize) -> Result<(), CoreError> {
    if let Some(v) = value {
        if v.chars().count() > max {
            return Err(CoreError::Validation(format!(
                "{field} exceeds maximum length of {max} characters"
            )));
        }
    }
    Ok(())
}

/// Validate free-text field lengths. Absent fields are fine on a draft.
pub fn validate_text_fields(
    title: Option<&str>,
    description: Option<&str>,
    idea_text: Option<&str>,
) -> Result<(), CoreError> {
    check_length("Title", title, MAX_TITLE_LENGTH)?;
    check_length("Description", description, MAX_DESCRIPTION_LENGTH)?;
    check_length("Idea text", idea_text, MAX_IDEA_TEXT_LENGTH)?;
    Ok(())
}

/// Capacity target must be non-negative when given.
pub fn validate_capacity(capacity_target: Option<i32>) -> Result<(), CoreError> {
    match capacity_target {
        Some(c) if c < 0 => Err(CoreError::Validation(format!(
            "Capacity target must be non-negative, got {c}"
        ))),
        _ => Ok(()),
    }
}

/// When both ends are given, the event must end after it starts.
pub fn validate_time_window(
    start_at: Option<Timestamp>,
    end_at: Option<Timestamp>,
) -> Result<(), CoreError> {
    if let (Some(start), Some(end)) = (start_at, end_at) {
        if end <= start {
            return Err(CoreError::Validation(
                "Event end time must be after its start time".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validate an optional transition note.
pub fn validate_note(note: Option<&str>) -> Result<(), CoreError> {
    check_length("Note", note, MAX_NOTE_LENGTH)
}

/// An event leaving `draft` must have a non-blank title and description.
pub fn validate_ready_for_review(
    title: Option<&str>,
    description: Option<&str>,
) -> Result<(), CoreError> {
    let has_title = title.is_some_and(|t| !t.trim().is_empty());
    let has_description = description.is_some_and(|d| !d.trim().is_empty());

    let mut missing = Vec::new();
    if !has_title {
        missing.push("title");
    }
    if !has_description {
        missing.push("description");
    }
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "Event is missing required fields for review: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
