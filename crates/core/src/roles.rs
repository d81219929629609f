//! User roles and role sets.
//!
//! Roles are non-exclusive: one user may host events, host venues, and work
//! as staff at the same time. The stored names must match the CHECK
//! constraint on `users.roles` in `0001_create_users.sql`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::vocabulary::define_vocabulary;

define_vocabulary! {
    /// A role a user may hold.
    Role ("role") {
        /// Drafts and submits event proposals.
        EventHost => "event_host",
        /// Reviews events and verifies venues.
        HtwStaff => "htw_staff",
        /// Claims and manages venue listings.
        VenueHost => "venue_host",
    }
}

/// Roles a user may pick for themselves during onboarding.
pub const SELF_ASSIGNABLE_ROLES: &[Role] = &[Role::EventHost, Role::VenueHost];

/// An ordered, duplicate-free set of roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut set = RoleSet::default();
        for role in roles {
            set.insert(role);
        }
        set
    }

    /// Build a set from stored role names, skipping names outside the vocabulary.
    ///
    /// Reads are lenient so that a stray value in the `roles` column cannot
    /// lock a user out; writes go through [`RoleSet::parse_strict`].
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        RoleSet::new(names.iter().filter_map(|n| n.as_ref().parse().ok()))
    }

    /// Parse role names, rejecting unknown values and empty input.
    pub fn parse_strict<S: AsRef<str>>(names: &[S]) -> Result<Self, CoreError> {
        let roles = names
            .iter()
            .map(|n| n.as_ref().parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        let set = RoleSet::new(roles);
        set.ensure_non_empty()?;
        Ok(set)
    }

    pub fn insert(&mut self, role: Role) {
        if !self.0.contains(&role) {
            self.0.push(role);
            self.0.sort();
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Stored names for the `roles` TEXT[] column.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_string()).collect()
    }

    /// A user must hold at least one role once onboarded.
    pub fn ensure_non_empty(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::Validation(
                "A user must hold at least one role".to_string(),
            ));
        }
        Ok(())
    }

    /// Reject role sets a user is not allowed to grant themselves.
    pub fn ensure_self_assignable(&self) -> Result<(), CoreError> {
        if let Some(role) = self.iter().find(|r| !SELF_ASSIGNABLE_ROLES.contains(r)) {
            return Err(CoreError::Forbidden(format!(
                "Role '{role}' can only be granted by staff"
            )));
        }
        Ok(())
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        RoleSet::new(iter)
    }
}
