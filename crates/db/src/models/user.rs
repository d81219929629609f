//! User entity model and DTOs.

use htw_core::roles::RoleSet;
use htw_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// Subject identifier issued by the identity provider.
    pub auth_subject: String,
    pub email: String,
    pub name: String,
    pub org: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub roles: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Parsed role set. Unknown stored names are ignored.
    pub fn role_set(&self) -> RoleSet {
        RoleSet::from_names(&self.roles)
    }
}

/// DTO for creating a user during onboarding.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub auth_subject: String,
    pub email: String,
    pub name: String,
    pub org: Option<String>,
    pub roles: Vec<String>,
}

/// Profile fields a user may edit on themselves. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserProfile {
    pub name: Option<String>,
    pub org: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}
