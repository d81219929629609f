use axum::routing::get;
use axum::Router;

use crate::handlers::dashboard;
use crate::state::AppState;

/// Routes mounted at `/dashboard`.
///
/// ```text
/// GET  /host    -> host_stats
/// GET  /staff   -> staff_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/host", get(dashboard::host_stats))
        .route("/staff", get(dashboard::staff_stats))
}
