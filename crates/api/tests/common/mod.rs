#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use htw_api::auth::jwt::{generate_access_token, JwtConfig};
use htw_api::config::{LogFormat, ServerConfig};
use htw_api::router::build_app_router;
use htw_api::state::AppState;
use htw_core::roles::Role;
use htw_db::models::user::{CreateUser, User};
use htw_db::{MemoryStore, WorkflowStore};
use htw_events::EventBus;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and a short store timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: None,
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        store_timeout_secs: 2,
        completion_sweep_interval_secs: 300,
        log_format: LogFormat::Pretty,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The full application router over an in-memory store.
///
/// The store and bus are exposed so tests can seed data, simulate outages
/// and observe published events.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub bus: Arc<EventBus>,
    pub state: AppState,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(EventBus::default());
        let state = AppState::new(
            Arc::clone(&store) as Arc<dyn WorkflowStore>,
            config.clone(),
            Arc::clone(&bus),
        );
        let router = build_app_router(state.clone(), &config);
        Self {
            router,
            store,
            bus,
            state,
            config,
        }
    }

    /// A valid access token for the identity `subject`.
    pub fn token(&self, subject: &str) -> String {
        let email = format!("{subject}@example.com");
        generate_access_token(subject, Some(email.as_str()), &self.config.jwt).unwrap()
    }

    /// Insert an onboarded user directly into the store.
    pub async fn seed_user(&self, subject: &str, roles: &[Role]) -> User {
        self.store
            .create_user(&CreateUser {
                auth_subject: subject.to_string(),
                email: format!("{subject}@example.com"),
                name: subject.to_string(),
                org: None,
                roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_auth(&self, uri: &str, subject: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", self.token(subject)))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post_json_auth(
        &self,
        uri: &str,
        subject: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.json_auth(Method::POST, uri, subject, body).await
    }

    pub async fn put_json_auth(
        &self,
        uri: &str,
        subject: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        self.json_auth(Method::PUT, uri, subject, body).await
    }

    async fn json_auth(
        &self,
        method: Method,
        uri: &str,
        subject: &str,
        body: serde_json::Value,
    ) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.token(subject)))
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Workflow fixtures
// ---------------------------------------------------------------------------

/// Create a complete draft through the API as `host` and return its id.
pub async fn create_draft(app: &TestApp, host: &str) -> i64 {
    let response = app
        .post_json_auth(
            "/api/v1/events",
            host,
            serde_json::json!({
                "title": "AI founders mixer",
                "description": "Drinks and lightning demos",
                "event_types": ["mixer"],
                "audience_types": ["founders"],
                "capacity_target": 80
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Request a transition through the API.
pub async fn transition(
    app: &TestApp,
    event_id: i64,
    subject: &str,
    to_status: &str,
) -> Response<Body> {
    app.post_json_auth(
        &format!("/api/v1/events/{event_id}/transition"),
        subject,
        serde_json::json!({ "to_status": to_status }),
    )
    .await
}

/// Drive an event through `steps`, asserting every step succeeds.
pub async fn walk(app: &TestApp, event_id: i64, steps: &[(&str, &str)]) {
    for (subject, to_status) in steps {
        let response = transition(app, event_id, subject, to_status).await;
        assert_eq!(response.status(), 200, "{subject} -> {to_status}");
    }
}
