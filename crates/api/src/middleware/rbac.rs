//! Role-based access control extractors.
//!
//! Each extractor wraps [`CurrentUser`] and rejects requests whose stored
//! role set lacks the required role.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use htw_core::error::CoreError;
use htw_core::roles::Role;

use super::current_user::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

async fn require(
    parts: &mut Parts,
    state: &AppState,
    role: Role,
) -> Result<CurrentUser, AppError> {
    let user = CurrentUser::from_request_parts(parts, state).await?;
    if !user.actor.has_role(role) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "The {role} role is required"
        ))));
    }
    Ok(user)
}

/// Requires `htw_staff`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn staff_only(RequireStaff(staff): RequireStaff) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireStaff(pub CurrentUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, Role::HtwStaff).await.map(RequireStaff)
    }
}

/// Requires `event_host`.
pub struct RequireEventHost(pub CurrentUser);

impl FromRequestParts<AppState> for RequireEventHost {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require(parts, state, Role::EventHost)
            .await
            .map(RequireEventHost)
    }
}
