//! The party attempting an operation.
//!
//! An [`Actor`] is built per request from the `users` row (never from token
//! claims) and passed explicitly into every workflow check, so the checks
//! are pure functions of their inputs.

use crate::roles::{Role, RoleSet};
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// An authenticated, onboarded user.
    User { id: DbId, roles: RoleSet },
    /// Internal time-based jobs (e.g. completing past events).
    System,
}

impl Actor {
    pub fn user(id: DbId, roles: impl IntoIterator<Item = Role>) -> Self {
        Actor::User {
            id,
            roles: RoleSet::new(roles),
        }
    }

    /// The acting user id, `None` for the system actor.
    pub fn user_id(&self) -> Option<DbId> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::System => None,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        match self {
            Actor::User { roles, .. } => roles.contains(role),
            Actor::System => false,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.has_role(Role::HtwStaff)
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }

    /// True when the actor is the given user.
    pub fn is_user(&self, user_id: DbId) -> bool {
        self.user_id() == Some(user_id)
    }
}
