//! HTTP handlers, one module per resource.

pub mod admin;
pub mod dashboard;
pub mod events;
pub mod me;
pub mod venues;

use htw_core::error::CoreError;
use htw_core::types::DbId;
use htw_db::models::event::Event;
use htw_db::models::venue::Venue;
use htw_events::PlatformEvent;

use crate::error::AppResult;
use crate::middleware::current_user::CurrentUser;
use crate::state::AppState;

/// Load an event or fail with 404.
pub async fn load_event(state: &AppState, id: DbId) -> AppResult<Event> {
    Ok(state
        .call(state.store.find_event(id))
        .await?
        .ok_or(CoreError::NotFound { entity: "Event", id })?)
}

/// Load a venue or fail with 404.
pub async fn load_venue(state: &AppState, id: DbId) -> AppResult<Venue> {
    Ok(state
        .call(state.store.find_venue(id))
        .await?
        .ok_or(CoreError::NotFound { entity: "Venue", id })?)
}

/// Events are visible to their owner and to staff.
pub fn ensure_can_view_event(user: &CurrentUser, event: &Event) -> Result<(), CoreError> {
    if user.actor.is_user(event.host_user_id) || user.actor.is_staff() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Only the event's host and staff may view it".into(),
        ))
    }
}

/// Publish a non-transition event on behalf of `user`.
pub fn publish(state: &AppState, user: &CurrentUser, event: PlatformEvent) {
    state.event_bus.publish(event.with_actor(Some(user.id())));
}
