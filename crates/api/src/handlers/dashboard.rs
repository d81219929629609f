//! Dashboard statistics for hosts and staff.

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use htw_core::dashboard::{approval_rate, HostStats, StaffStats, APPROVAL_RATE_WINDOW_DAYS};
use htw_core::event_workflow::NEEDS_ATTENTION;
use htw_core::venue_workflow::VenueStatus;

use crate::error::AppResult;
use crate::middleware::rbac::{RequireEventHost, RequireStaff};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/dashboard/host
pub async fn host_stats(
    RequireEventHost(host): RequireEventHost,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<HostStats>>> {
    let statuses = state
        .call(state.store.event_statuses_for_host(host.id()))
        .await?;
    Ok(Json(DataResponse {
        data: HostStats::from_statuses(&statuses),
    }))
}

/// GET /api/v1/dashboard/staff
pub async fn staff_stats(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<StaffStats>>> {
    let since = Utc::now() - Duration::days(APPROVAL_RATE_WINDOW_DAYS);

    let total_events = state.call(state.store.count_events(&[])).await?;
    let pending_review = state.call(state.store.count_events(NEEDS_ATTENTION)).await?;
    let active_venues = state
        .call(state.store.count_venues(VenueStatus::Approved))
        .await?;
    let decisions = state.call(state.store.decision_counts_since(since)).await?;

    Ok(Json(DataResponse {
        data: StaffStats {
            total_events,
            pending_review,
            active_venues,
            approval_rate_30d: approval_rate(decisions.approved, decisions.declined),
        },
    }))
}
