//! The review queue as seen by hosts and staff.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_draft, walk, TestApp};
use htw_core::roles::Role;

fn event_ids(json: &serde_json::Value) -> Vec<i64> {
    json["data"]["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn host_view_shows_only_own_events_newest_first() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;
    app.seed_user("other", &[Role::EventHost]).await;
    let first = create_draft(&app, "host").await;
    let second = create_draft(&app, "host").await;
    create_draft(&app, "other").await;

    let json = body_json(app.get_auth("/api/v1/events", "host").await).await;
    assert_eq!(json["data"]["view"], "host");
    assert_eq!(event_ids(&json), vec![second, first]);
}

#[tokio::test]
async fn staff_view_defaults_to_events_needing_attention() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;
    app.seed_user("staff", &[Role::HtwStaff]).await;
    let _draft = create_draft(&app, "host").await;
    let submitted = create_draft(&app, "host").await;
    let reviewing = create_draft(&app, "host").await;
    let approved = create_draft(&app, "host").await;
    walk(&app, submitted, &[("host", "submitted")]).await;
    walk(&app, reviewing, &[("host", "submitted"), ("staff", "in_review")]).await;
    walk(
        &app,
        approved,
        &[("host", "submitted"), ("staff", "in_review"), ("staff", "approved")],
    )
    .await;

    let json = body_json(app.get_auth("/api/v1/events", "staff").await).await;
    assert_eq!(json["data"]["view"], "staff");
    assert_eq!(event_ids(&json), vec![submitted, reviewing]);

    let filtered = body_json(
        app.get_auth("/api/v1/events?status=approved,draft", "staff")
            .await,
    )
    .await;
    assert_eq!(event_ids(&filtered).len(), 2);
}

#[tokio::test]
async fn hosts_cannot_request_the_staff_view() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;

    let response = app.get_auth("/api/v1/events?view=staff", "host").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn staff_who_host_can_switch_views() {
    let app = TestApp::new();
    app.seed_user("both", &[Role::EventHost, Role::HtwStaff]).await;
    let own = create_draft(&app, "both").await;

    let host_view = body_json(app.get_auth("/api/v1/events?view=host", "both").await).await;
    assert_eq!(event_ids(&host_view), vec![own]);

    let staff_view = body_json(app.get_auth("/api/v1/events?view=staff", "both").await).await;
    assert!(event_ids(&staff_view).is_empty());
}

#[tokio::test]
async fn venue_hosts_have_no_queue() {
    let app = TestApp::new();
    app.seed_user("venue", &[Role::VenueHost]).await;

    let response = app.get_auth("/api/v1/events", "venue").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn pagination_is_clamped_and_echoed() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;
    for _ in 0..3 {
        create_draft(&app, "host").await;
    }

    let json = body_json(
        app.get_auth("/api/v1/events?limit=2&offset=1", "host")
            .await,
    )
    .await;
    assert_eq!(json["data"]["limit"], 2);
    assert_eq!(json["data"]["offset"], 1);
    assert_eq!(event_ids(&json).len(), 2);

    let clamped = body_json(
        app.get_auth("/api/v1/events?limit=0&offset=-5", "host")
            .await,
    )
    .await;
    assert_eq!(clamped["data"]["offset"], 0);
    assert!(clamped["data"]["limit"].as_i64().unwrap() >= 1);
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let app = TestApp::new();
    app.seed_user("staff", &[Role::HtwStaff]).await;

    let response = app.get_auth("/api/v1/events?status=pending", "staff").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
