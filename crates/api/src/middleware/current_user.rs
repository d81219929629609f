//! Resolves the authenticated identity to an onboarded user.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use htw_core::actor::Actor;
use htw_core::error::CoreError;
use htw_core::types::DbId;
use htw_db::models::user::User;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// The onboarded user behind the request, with roles re-read from the store
/// on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub actor: Actor,
}

impl CurrentUser {
    pub fn id(&self) -> DbId {
        self.user.id
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;

        let user = state
            .call(state.store.find_user_by_subject(&auth.subject))
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Forbidden(
                    "Onboarding required: create your profile at POST /api/v1/me".into(),
                ))
            })?;

        let actor = Actor::User {
            id: user.id,
            roles: user.role_set(),
        };
        Ok(CurrentUser { user, actor })
    }
}
