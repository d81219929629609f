//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server is
//! involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use htw_api::error::AppError;
use htw_core::error::CoreError;
use http_body_util::BodyExt;

/// Convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Event",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Event with id 42 not found");
}

#[tokio::test]
async fn invalid_transition_returns_422_naming_both_statuses() {
    let err = AppError::Core(CoreError::InvalidTransition {
        entity: "Event",
        from: "submitted".into(),
        to: "approved".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "INVALID_TRANSITION");
    assert_eq!(json["error"], "Event cannot move from 'submitted' to 'approved'");
    assert!(json.get("retryable").is_none());
}

#[tokio::test]
async fn concurrent_modification_returns_409() {
    let err = AppError::Core(CoreError::ConcurrentModification {
        entity: "Event",
        id: 7,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONCURRENT_MODIFICATION");
}

#[tokio::test]
async fn forbidden_and_unauthorized_are_distinct() {
    let (status, json) = error_to_response(CoreError::Forbidden("staff only".into()).into()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["error"], "staff only");

    let (status, json) =
        error_to_response(CoreError::Unauthorized("Missing token".into()).into()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let (status, json) =
        error_to_response(CoreError::Validation("Title is required".into()).into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Title is required");
}

#[tokio::test]
async fn upstream_unavailable_returns_503_marked_retryable() {
    let err = AppError::Core(CoreError::UpstreamUnavailable("pool timed out at 10.0.0.5".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "UPSTREAM_UNAVAILABLE");
    assert_eq!(json["error"], "The data store is temporarily unavailable");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("secret database credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("invalid id".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}
