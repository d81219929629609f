//! Onboarding, profile and role assignment over HTTP.

mod common;

use axum::http::StatusCode;
use common::{body_json, TestApp};
use htw_core::roles::Role;
use serde_json::json;

#[tokio::test]
async fn request_without_token_is_unauthorized() {
    let app = TestApp::new();
    let response = app.get("/api/v1/me").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn valid_token_without_profile_must_onboard() {
    let app = TestApp::new();
    let response = app.get_auth("/api/v1/me", "newcomer").await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Onboarding required"));
}

#[tokio::test]
async fn onboarding_creates_profile_with_chosen_roles() {
    let app = TestApp::new();
    let response = app
        .post_json_auth(
            "/api/v1/me",
            "ada",
            json!({ "name": "Ada", "org": "Analytical", "roles": ["event_host", "venue_host"] }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "ada@example.com");
    assert_eq!(json["data"]["roles"], json!(["event_host", "venue_host"]));

    let me = body_json(app.get_auth("/api/v1/me", "ada").await).await;
    assert_eq!(me["data"]["name"], "Ada");
}

#[tokio::test]
async fn onboarding_twice_is_a_conflict() {
    let app = TestApp::new();
    let body = json!({ "name": "Ada", "roles": ["event_host"] });
    app.post_json_auth("/api/v1/me", "ada", body.clone()).await;

    let response = app.post_json_auth("/api/v1/me", "ada", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn staff_role_cannot_be_self_assigned() {
    let app = TestApp::new();
    let response = app
        .post_json_auth("/api/v1/me", "mallory", json!({ "name": "M", "roles": ["htw_staff"] }))
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn onboarding_rejects_unknown_or_empty_roles() {
    let app = TestApp::new();

    let unknown = app
        .post_json_auth("/api/v1/me", "x", json!({ "name": "X", "roles": ["wizard"] }))
        .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let empty = app
        .post_json_auth("/api/v1/me", "y", json!({ "name": "Y", "roles": [] }))
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_update_keeps_roles() {
    let app = TestApp::new();
    app.seed_user("ada", &[Role::EventHost]).await;

    let response = app
        .put_json_auth("/api/v1/me", "ada", json!({ "bio": "Runs the demo nights", "roles": ["htw_staff"] }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["bio"], "Runs the demo nights");
    assert_eq!(json["data"]["roles"], json!(["event_host"]));
}

#[tokio::test]
async fn staff_replace_roles_and_changes_apply_on_next_request() {
    let app = TestApp::new();
    app.seed_user("staff", &[Role::HtwStaff]).await;
    let host = app.seed_user("ada", &[Role::EventHost]).await;

    let before = app.get_auth("/api/v1/dashboard/staff", "ada").await;
    assert_eq!(before.status(), StatusCode::FORBIDDEN);

    let response = app
        .put_json_auth(
            &format!("/api/v1/admin/users/{}/roles", host.id),
            "staff",
            json!({ "roles": ["event_host", "htw_staff"] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let after = app.get_auth("/api/v1/dashboard/staff", "ada").await;
    assert_eq!(after.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_staff_cannot_assign_roles() {
    let app = TestApp::new();
    let host = app.seed_user("ada", &[Role::EventHost]).await;

    let response = app
        .put_json_auth(
            &format!("/api/v1/admin/users/{}/roles", host.id),
            "ada",
            json!({ "roles": ["htw_staff"] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_assignment_requires_a_non_empty_set() {
    let app = TestApp::new();
    app.seed_user("staff", &[Role::HtwStaff]).await;
    let host = app.seed_user("ada", &[Role::EventHost]).await;

    let response = app
        .put_json_auth(
            &format!("/api/v1/admin/users/{}/roles", host.id),
            "staff",
            json!({ "roles": [] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
