pub mod admin;
pub mod dashboard;
pub mod events;
pub mod health;
pub mod me;
pub mod venues;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /me                               onboard (POST), get, update
///
/// /admin/users/{id}/roles           replace role set (staff)
/// /admin/audit                      list audit entries (staff)
/// /admin/audit/verify               verify the hash chain (staff)
///
/// /events                           create draft, review queue
/// /events/{id}                      get, update
/// /events/{id}/transition           change status (POST)
/// /events/{id}/history              status history
///
/// /venues                           create, list
/// /venues/{id}                      get
/// /venues/{id}/transition           change status (POST, staff)
/// /venues/{id}/history              status history
///
/// /dashboard/host                   host counters
/// /dashboard/staff                  staff counters
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Onboarding and profile.
        .nest("/me", me::router())
        // Role assignment and audit trail.
        .nest("/admin", admin::router())
        // Event proposals and the review queue.
        .nest("/events", events::router())
        // Venue listings and approval.
        .nest("/venues", venues::router())
        .nest("/dashboard", dashboard::router())
}
