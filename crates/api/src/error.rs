use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use htw_core::error::CoreError;
use htw_db::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A malformed request (bad path/query value) with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error; the message is logged, never returned.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Core(err.into())
    }
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::InvalidTransition { entity, from, to } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_TRANSITION",
                    format!("{entity} cannot move from '{from}' to '{to}'"),
                ),
                CoreError::ConcurrentModification { entity, id } => (
                    StatusCode::CONFLICT,
                    "CONCURRENT_MODIFICATION",
                    format!("{entity} {id} was changed by someone else; reload it and try again"),
                ),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::UpstreamUnavailable(msg) => {
                    tracing::warn!(error = %msg, "Store unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "UPSTREAM_UNAVAILABLE",
                        "The data store is temporarily unavailable".to_string(),
                    )
                }
                CoreError::Internal(msg) => internal(msg),
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if matches!(&self, AppError::Core(core) if core.is_retryable()) {
            body["retryable"] = json!(true);
        }

        (status, axum::Json(body)).into_response()
    }
}
