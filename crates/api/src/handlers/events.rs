//! Handlers for event proposals: authoring, the review queue, transitions
//! and history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use htw_core::edges::Authority;
use htw_core::error::CoreError;
use htw_core::event_validation::{
    validate_capacity, validate_ready_for_review, validate_text_fields, validate_time_window,
};
use htw_core::event_workflow::{actor_satisfies, available_transitions, EventStatus};
use htw_core::queue::QueueView;
use htw_core::types::DbId;
use htw_core::vocabulary::{parse_all, to_names, AudienceType, EventType};
use htw_db::models::event::{CreateEvent, Event, UpdateEvent};
use htw_db::models::status_history::StatusHistory;
use htw_events::{event_names, PlatformEvent};
use serde::{Deserialize, Serialize};

use crate::engine::queue::{list_events_for_actor, QueuePage, QueueRequest};
use crate::engine::TransitionRequest;
use crate::error::AppResult;
use crate::handlers::{ensure_can_view_event, load_event, publish};
use crate::middleware::current_user::CurrentUser;
use crate::middleware::rbac::RequireEventHost;
use crate::query::split_csv;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /events`.
#[derive(Debug, Default, Deserialize)]
pub struct QueueParams {
    /// `host` or `staff`.
    pub view: Option<String>,
    /// Comma-separated statuses.
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// An event plus the statuses the caller may move it to.
#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub available_transitions: Vec<EventStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub to_status: String,
    pub note: Option<String>,
    /// Status the client last displayed; stale values are rejected.
    pub expected_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventTransitionResponse {
    pub event: Event,
    /// `None` when the request was a no-op.
    pub history: Option<StatusHistory>,
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Validate vocabulary names and return them deduplicated in canonical form.
fn normalize<T>(values: &[String]) -> Result<Vec<String>, CoreError>
where
    T: std::str::FromStr<Err = CoreError> + Copy + PartialEq + std::fmt::Display,
{
    Ok(to_names(&parse_all::<T>(values)?))
}

async fn ensure_venue_accepts_events(state: &AppState, venue_id: DbId) -> AppResult<()> {
    let venue = state.call(state.store.find_venue(venue_id)).await?;
    match venue {
        Some(v) if v.status.accepts_events() => Ok(()),
        Some(v) => Err(CoreError::Validation(format!(
            "Venue {venue_id} is '{}' and cannot host events",
            v.status
        ))
        .into()),
        None => Err(CoreError::Validation(format!("Venue {venue_id} does not exist")).into()),
    }
}

// ---------------------------------------------------------------------------
// Authoring
// ---------------------------------------------------------------------------

/// POST /api/v1/events
///
/// Create a draft owned by the caller. Requires `event_host`.
pub async fn create_event(
    RequireEventHost(host): RequireEventHost,
    State(state): State<AppState>,
    Json(mut input): Json<CreateEvent>,
) -> AppResult<impl IntoResponse> {
    input.event_types = normalize::<EventType>(&input.event_types)?;
    input.audience_types = normalize::<AudienceType>(&input.audience_types)?;
    validate_text_fields(
        input.title.as_deref(),
        input.description.as_deref(),
        input.idea_text.as_deref(),
    )?;
    validate_capacity(input.capacity_target)?;
    validate_time_window(input.start_at, input.end_at)?;
    if let Some(venue_id) = input.venue_id {
        ensure_venue_accepts_events(&state, venue_id).await?;
    }

    let event = state.call(state.store.create_event(host.id(), &input)).await?;

    tracing::info!(event_id = event.id, user_id = host.id(), "Event draft created");
    publish(
        &state,
        &host,
        PlatformEvent::new(event_names::EVENT_CREATED)
            .with_source("event", event.id)
            .with_payload(serde_json::json!({ "title": event.title })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// GET /api/v1/events/{id}
pub async fn get_event(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EventDetail>>> {
    let event = load_event(&state, id).await?;
    ensure_can_view_event(&current, &event)?;

    let available_transitions = available_transitions(event.status, &current.actor, event.host_user_id);
    Ok(Json(DataResponse {
        data: EventDetail {
            event,
            available_transitions,
        },
    }))
}

/// PUT /api/v1/events/{id}
///
/// Edit fields while the event is `draft` or `changes_requested`. Only the
/// owning host may edit; `status` is never touched here.
pub async fn update_event(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateEvent>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = load_event(&state, id).await?;
    if !actor_satisfies(&current.actor, Authority::Host, event.host_user_id) {
        return Err(CoreError::Forbidden("Only the event's host may edit it".into()).into());
    }
    if !event.status.is_host_editable() {
        return Err(CoreError::Conflict(format!(
            "Event cannot be edited while '{}'",
            event.status
        ))
        .into());
    }

    if let Some(types) = &input.event_types {
        input.event_types = Some(normalize::<EventType>(types)?);
    }
    if let Some(types) = &input.audience_types {
        input.audience_types = Some(normalize::<AudienceType>(types)?);
    }
    validate_text_fields(
        input.title.as_deref(),
        input.description.as_deref(),
        input.idea_text.as_deref(),
    )?;
    validate_capacity(input.capacity_target)?;
    validate_time_window(
        input.start_at.or(event.start_at),
        input.end_at.or(event.end_at),
    )?;
    if event.status.requires_complete_fields() {
        validate_ready_for_review(
            input.title.as_deref().or(event.title.as_deref()),
            input.description.as_deref().or(event.description.as_deref()),
        )?;
    }
    if let Some(venue_id) = input.venue_id {
        if event.venue_id != Some(venue_id) {
            ensure_venue_accepts_events(&state, venue_id).await?;
        }
    }

    let updated = state
        .call(state.store.update_event(id, event.status, &input))
        .await?
        .ok_or_else(|| {
            CoreError::Conflict(
                "Event changed status while it was being edited; reload and try again".into(),
            )
        })?;

    tracing::info!(event_id = id, user_id = current.id(), "Event updated");
    publish(
        &state,
        &current,
        PlatformEvent::new(event_names::EVENT_UPDATED)
            .with_source("event", id)
            .with_payload(serde_json::json!({ "status": updated.status })),
    );

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// GET /api/v1/events
///
/// The review queue for the caller: own events for hosts, events needing
/// attention for staff.
pub async fn list_events(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<QueueParams>,
) -> AppResult<Json<DataResponse<QueuePage>>> {
    let view = params
        .view
        .as_deref()
        .map(str::parse::<QueueView>)
        .transpose()?;
    let statuses = split_csv(params.status.as_deref())
        .map(|names| parse_all::<EventStatus>(&names))
        .transpose()?;

    let page = list_events_for_actor(
        state.store.as_ref(),
        state.config.store_timeout(),
        &current.actor,
        QueueRequest {
            view,
            statuses,
            limit: params.limit,
            offset: params.offset,
        },
    )
    .await?;

    Ok(Json(DataResponse { data: page }))
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// POST /api/v1/events/{id}/transition
pub async fn transition_event(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<TransitionBody>,
) -> AppResult<Json<DataResponse<EventTransitionResponse>>> {
    let request = TransitionRequest {
        target: body.to_status.parse::<EventStatus>()?,
        note: body.note,
        expected_status: body
            .expected_status
            .as_deref()
            .map(str::parse::<EventStatus>)
            .transpose()?,
    };

    let outcome = state
        .engine
        .transition_event(id, request, &current.actor)
        .await?;
    let changed = outcome.is_applied();
    let (event, history) = outcome.into_parts();

    Ok(Json(DataResponse {
        data: EventTransitionResponse {
            event,
            history,
            changed,
        },
    }))
}

/// GET /api/v1/events/{id}/history
///
/// Oldest first.
pub async fn event_history(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<StatusHistory>>>> {
    let event = load_event(&state, id).await?;
    ensure_can_view_event(&current, &event)?;

    let history = state.call(state.store.event_history(id)).await?;
    Ok(Json(DataResponse { data: history }))
}
