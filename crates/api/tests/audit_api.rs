//! The audit trail: persistence from the bus, listing and chain verification.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, create_draft, walk, TestApp};
use htw_core::roles::Role;
use htw_db::models::audit::{AuditQuery, CreateAuditLog};
use htw_db::WorkflowStore;
use htw_events::AuditPersistence;
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Start audit persistence on the app's bus. Must run before the actions
/// whose events should be recorded.
fn start_persistence(app: &TestApp) -> CancellationToken {
    let cancel = CancellationToken::new();
    tokio::spawn(AuditPersistence::run(
        Arc::clone(&app.store) as Arc<dyn WorkflowStore>,
        app.bus.subscribe(),
        app.config.store_timeout(),
        cancel.clone(),
    ));
    cancel
}

/// Poll until at least `count` audit rows exist.
async fn wait_for_entries(app: &TestApp, count: usize) {
    for _ in 0..100 {
        let rows = app
            .store
            .list_audit(&AuditQuery::default(), 500, 0)
            .await
            .unwrap();
        if rows.len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("audit persistence did not record {count} entries");
}

#[tokio::test]
async fn transitions_are_recorded_and_filterable() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;
    app.seed_user("staff", &[Role::HtwStaff]).await;
    let cancel = start_persistence(&app);

    let id = create_draft(&app, "host").await;
    walk(&app, id, &[("host", "submitted"), ("staff", "in_review")]).await;
    // event.created + two status changes
    wait_for_entries(&app, 3).await;

    let response = app
        .get_auth(
            &format!("/api/v1/admin/audit?action_type=event_transition&entity_id={id}"),
            "staff",
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(rows.len(), 2);
    assert!(rows
        .iter()
        .all(|r| r["entity_type"] == "event" && r["entity_id"] == id));

    cancel.cancel();
}

#[tokio::test]
async fn audit_is_staff_only() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;

    assert_eq!(
        app.get_auth("/api/v1/admin/audit", "host").await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get_auth("/api/v1/admin/audit/verify", "host").await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn intact_chain_verifies() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;
    app.seed_user("staff", &[Role::HtwStaff]).await;
    let cancel = start_persistence(&app);

    let id = create_draft(&app, "host").await;
    walk(&app, id, &[("host", "submitted")]).await;
    wait_for_entries(&app, 2).await;

    let report = body_json(app.get_auth("/api/v1/admin/audit/verify", "staff").await).await;
    assert_eq!(report["data"]["intact"], true);
    assert_eq!(report["data"]["total_entries"], 2);
    assert!(report["data"]["first_broken_id"].is_null());

    cancel.cancel();
}

#[tokio::test]
async fn forged_entry_breaks_the_chain() {
    let app = TestApp::new();
    app.seed_user("host", &[Role::EventHost]).await;
    app.seed_user("staff", &[Role::HtwStaff]).await;
    let cancel = start_persistence(&app);

    create_draft(&app, "host").await;
    wait_for_entries(&app, 1).await;
    cancel.cancel();

    let forged = app
        .store
        .append_audit(&CreateAuditLog {
            user_id: None,
            action_type: "event_transition".into(),
            entity_type: Some("event".into()),
            entity_id: Some(1),
            details_json: json!({ "to": "published" }),
            integrity_hash: "0".repeat(64),
        })
        .await
        .unwrap();

    let report = body_json(app.get_auth("/api/v1/admin/audit/verify", "staff").await).await;
    assert_eq!(report["data"]["intact"], false);
    assert_eq!(report["data"]["first_broken_id"], forged.id);
}
