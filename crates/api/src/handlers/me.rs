//! Handlers for the current user: onboarding and profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use htw_core::error::CoreError;
use htw_core::roles::RoleSet;
use htw_db::models::user::{CreateUser, UpdateUserProfile, User};
use htw_events::{event_names, PlatformEvent};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::publish;
use crate::middleware::auth::AuthUser;
use crate::middleware::current_user::CurrentUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Maximum length of a display name.
const MAX_NAME_LENGTH: usize = 200;

/// Body of `POST /me`.
#[derive(Debug, Deserialize)]
pub struct OnboardRequest {
    pub name: String,
    /// Falls back to the token's e-mail claim.
    pub email: Option<String>,
    pub org: Option<String>,
    pub roles: Vec<String>,
}

fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// POST /api/v1/me
///
/// Create the user row for the authenticated identity. Only self-assignable
/// roles may be chosen; staff is granted by other staff.
pub async fn onboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<OnboardRequest>,
) -> AppResult<impl IntoResponse> {
    validate_name(&input.name)?;
    let roles = RoleSet::parse_strict(&input.roles)?;
    roles.ensure_non_empty()?;
    roles.ensure_self_assignable()?;

    let email = input
        .email
        .or(auth.email)
        .filter(|e| e.contains('@'))
        .ok_or_else(|| CoreError::Validation("A valid email address is required".into()))?;

    let create = CreateUser {
        auth_subject: auth.subject,
        email,
        name: input.name.trim().to_string(),
        org: input.org,
        roles: roles.names(),
    };
    let user = state
        .call(state.store.create_user(&create))
        .await
        .map_err(|e| match e {
            CoreError::Conflict(_) => {
                AppError::Core(CoreError::Conflict("This identity is already onboarded".into()))
            }
            other => AppError::Core(other),
        })?;

    tracing::info!(user_id = user.id, roles = ?user.roles, "User onboarded");
    state.event_bus.publish(
        PlatformEvent::new(event_names::USER_ONBOARDED)
            .with_source("user", user.id)
            .with_actor(Some(user.id))
            .with_payload(serde_json::json!({ "roles": user.roles })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// GET /api/v1/me
pub async fn get_me(current: CurrentUser) -> AppResult<Json<DataResponse<User>>> {
    Ok(Json(DataResponse { data: current.user }))
}

/// PUT /api/v1/me
///
/// Update profile fields. Roles and e-mail are not editable here.
pub async fn update_me(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateUserProfile>,
) -> AppResult<Json<DataResponse<User>>> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }

    let user = state
        .call(state.store.update_user_profile(current.id(), &input))
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: current.id(),
        })?;

    publish(
        &state,
        &current,
        PlatformEvent::new(event_names::USER_UPDATED).with_source("user", user.id),
    );

    Ok(Json(DataResponse { data: user }))
}
