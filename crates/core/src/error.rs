use crate::types::DbId;

/// Domain error taxonomy shared by every layer.
///
/// Each workflow rejection has its own variant so callers can tell a role
/// mismatch apart from an illegal edge or a stale read.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid transition for {entity}: '{from}' -> '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Concurrent modification of {entity} {id}: status changed since it was read")]
    ConcurrentModification { entity: &'static str, id: DbId },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether the caller may retry the same request after explicit user action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::UpstreamUnavailable(_))
    }
}
