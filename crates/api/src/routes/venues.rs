//! Route definitions for venue listings.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::venues;
use crate::state::AppState;

/// Routes mounted at `/venues`.
///
/// ```text
/// POST  /                   -> create_venue
/// GET   /                   -> list_venues (?status, limit, offset)
/// GET   /{id}               -> get_venue
/// POST  /{id}/transition    -> transition_venue
/// GET   /{id}/history       -> venue_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(venues::list_venues).post(venues::create_venue))
        .route("/{id}", get(venues::get_venue))
        .route("/{id}/transition", post(venues::transition_venue))
        .route("/{id}/history", get(venues::venue_history))
}
