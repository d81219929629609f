//! Route definitions for staff administration.
//!
//! Every handler enforces `htw_staff` through its extractor.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// PUT  /users/{id}/roles   -> set_user_roles
/// GET  /audit              -> list_audit (?user_id, action_type, entity_type, entity_id, limit, offset)
/// GET  /audit/verify       -> verify_audit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/roles", put(admin::set_user_roles))
        .route("/audit", get(admin::list_audit))
        .route("/audit/verify", get(admin::verify_audit))
}
