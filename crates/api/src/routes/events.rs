//! Route definitions for event proposals.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// POST  /                   -> create_event
/// GET   /                   -> list_events (?view, status, limit, offset)
/// GET   /{id}               -> get_event
/// PUT   /{id}               -> update_event
/// POST  /{id}/transition    -> transition_event
/// GET   /{id}/history       -> event_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route("/{id}", get(events::get_event).put(events::update_event))
        .route("/{id}/transition", post(events::transition_event))
        .route("/{id}/history", get(events::event_history))
}
