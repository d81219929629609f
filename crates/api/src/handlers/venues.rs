//! Handlers for venue listings and venue approval.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use htw_core::error::CoreError;
use htw_core::pagination::{clamp_limit, clamp_offset};
use htw_core::roles::Role;
use htw_core::types::DbId;
use htw_core::venue_workflow::{available_venue_transitions, validate_venue_listing, VenueStatus};
use htw_db::models::status_history::StatusHistory;
use htw_db::models::venue::{CreateVenue, Venue, VenueListFilter};
use htw_events::{event_names, PlatformEvent};
use serde::{Deserialize, Serialize};

use crate::engine::TransitionRequest;
use crate::error::AppResult;
use crate::handlers::{load_venue, publish};
use crate::middleware::current_user::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct VenueListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VenueDetail {
    #[serde(flatten)]
    pub venue: Venue,
    pub available_transitions: Vec<VenueStatus>,
}

#[derive(Debug, Deserialize)]
pub struct VenueTransitionBody {
    pub to_status: String,
    pub note: Option<String>,
    pub expected_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VenueTransitionResponse {
    pub venue: Venue,
    pub history: Option<StatusHistory>,
    pub changed: bool,
}

fn is_claimant(user: &CurrentUser, venue: &Venue) -> bool {
    venue.claimed_by_user_id == Some(user.id())
}

/// POST /api/v1/venues
///
/// Venue hosts create listings claimed by themselves; staff create
/// unclaimed listings. New listings await verification.
pub async fn create_venue(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<CreateVenue>,
) -> AppResult<impl IntoResponse> {
    let claimed_by = if current.actor.has_role(Role::VenueHost) {
        Some(current.id())
    } else if current.actor.is_staff() {
        None
    } else {
        return Err(CoreError::Forbidden(
            "Creating venues requires the venue_host or htw_staff role".into(),
        )
        .into());
    };
    validate_venue_listing(&input.name, &input.address, input.capacity)?;

    let venue = state
        .call(state.store.create_venue(&input, claimed_by))
        .await?;

    tracing::info!(venue_id = venue.id, user_id = current.id(), claimed = claimed_by.is_some(), "Venue listed");
    publish(
        &state,
        &current,
        PlatformEvent::new(event_names::VENUE_CREATED)
            .with_source("venue", venue.id)
            .with_payload(serde_json::json!({ "name": venue.name })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: venue })))
}

/// GET /api/v1/venues
///
/// Staff see every venue. Venue hosts see the venues they claimed plus
/// approved ones; everyone else sees approved venues only.
pub async fn list_venues(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<VenueListParams>,
) -> AppResult<Json<DataResponse<Vec<Venue>>>> {
    let requested = params
        .status
        .as_deref()
        .map(str::parse::<VenueStatus>)
        .transpose()?;

    let (status, claimed_by_user_id) = if current.actor.is_staff() {
        (requested, None)
    } else if current.actor.has_role(Role::VenueHost) {
        (requested, Some(current.id()))
    } else {
        (Some(VenueStatus::Approved), None)
    };

    let filter = VenueListFilter {
        status,
        claimed_by_user_id,
        claimed_or_approved: claimed_by_user_id.is_some(),
        limit: clamp_limit(params.limit),
        offset: clamp_offset(params.offset),
    };
    let venues = state.call(state.store.list_venues(&filter)).await?;
    Ok(Json(DataResponse { data: venues }))
}

/// GET /api/v1/venues/{id}
pub async fn get_venue(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VenueDetail>>> {
    let venue = load_venue(&state, id).await?;
    let visible = current.actor.is_staff()
        || is_claimant(&current, &venue)
        || venue.status == VenueStatus::Approved;
    if !visible {
        return Err(CoreError::Forbidden("This venue is not publicly listed".into()).into());
    }

    let available_transitions = available_venue_transitions(venue.status, &current.actor);
    Ok(Json(DataResponse {
        data: VenueDetail {
            venue,
            available_transitions,
        },
    }))
}

/// POST /api/v1/venues/{id}/transition
///
/// Staff-only approval flow: verify, reject or suspend.
pub async fn transition_venue(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<VenueTransitionBody>,
) -> AppResult<Json<DataResponse<VenueTransitionResponse>>> {
    let request = TransitionRequest {
        target: body.to_status.parse::<VenueStatus>()?,
        note: body.note,
        expected_status: body
            .expected_status
            .as_deref()
            .map(str::parse::<VenueStatus>)
            .transpose()?,
    };

    let outcome = state
        .engine
        .transition_venue(id, request, &current.actor)
        .await?;
    let changed = outcome.is_applied();
    let (venue, history) = outcome.into_parts();

    Ok(Json(DataResponse {
        data: VenueTransitionResponse {
            venue,
            history,
            changed,
        },
    }))
}

/// GET /api/v1/venues/{id}/history
pub async fn venue_history(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<StatusHistory>>>> {
    let venue = load_venue(&state, id).await?;
    if !current.actor.is_staff() && !is_claimant(&current, &venue) {
        return Err(CoreError::Forbidden(
            "Only staff and the claiming host may view venue history".into(),
        )
        .into());
    }

    let history = state.call(state.store.venue_history(id)).await?;
    Ok(Json(DataResponse { data: history }))
}
