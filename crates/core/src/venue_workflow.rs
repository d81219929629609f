//! Venue verification lifecycle.
//!
//! A two-party flow: venue hosts (or staff) create listings in
//! `pending_verification`, and only staff move them on from there.

use crate::actor::Actor;
use crate::edges::{self, Authority, Decision, Edge};
use crate::error::CoreError;
use crate::vocabulary::define_vocabulary;

define_vocabulary! {
    /// Verification status of a venue listing.
    VenueStatus ("venue status") {
        PendingVerification => "pending_verification",
        Approved => "approved",
        Rejected => "rejected",
        Suspended => "suspended",
    }
}

/// Entity label used in error messages.
pub const ENTITY: &str = "Venue";

/// Every allowed venue status change. All of them are staff-only.
pub const VENUE_TRANSITIONS: &[Edge<VenueStatus>] = &[
    Edge::new(VenueStatus::PendingVerification, VenueStatus::Approved, Authority::Staff),
    Edge::new(VenueStatus::PendingVerification, VenueStatus::Rejected, Authority::Staff),
    Edge::new(VenueStatus::Approved, VenueStatus::Suspended, Authority::Staff),
];

impl VenueStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, VenueStatus::Rejected | VenueStatus::Suspended)
    }

    /// Only approved venues may be attached to events.
    pub fn accepts_events(self) -> bool {
        self == VenueStatus::Approved
    }
}

/// Maximum length of a venue name.
pub const MAX_VENUE_NAME_LENGTH: usize = 200;

/// Validate the required fields of a venue listing.
pub fn validate_venue_listing(
    name: &str,
    address: &str,
    capacity: Option<i32>,
) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Venue name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_VENUE_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Venue name exceeds maximum length of {MAX_VENUE_NAME_LENGTH} characters"
        )));
    }
    if address.trim().is_empty() {
        return Err(CoreError::Validation(
            "Venue address must not be empty".to_string(),
        ));
    }
    if let Some(c) = capacity {
        if c < 0 {
            return Err(CoreError::Validation(format!(
                "Venue capacity must be non-negative, got {c}"
            )));
        }
    }
    Ok(())
}

fn actor_satisfies(actor: &Actor, authority: Authority) -> bool {
    match authority {
        Authority::Staff => actor.is_staff(),
        Authority::System => actor.is_system(),
        Authority::Host => false,
    }
}

/// Check legality and authorization of moving a venue from `current` to `target`.
pub fn authorize_venue_transition(
    current: VenueStatus,
    target: VenueStatus,
    actor: &Actor,
) -> Result<Decision, CoreError> {
    edges::decide(ENTITY, VENUE_TRANSITIONS, current, target, |authority| {
        actor_satisfies(actor, authority)
    })
}

pub fn available_venue_transitions(current: VenueStatus, actor: &Actor) -> Vec<VenueStatus> {
    edges::reachable_targets(VENUE_TRANSITIONS, current, |authority| {
        actor_satisfies(actor, authority)
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::roles::Role;

    fn staff() -> Actor {
        Actor::user(1, [Role::HtwStaff])
    }

    fn venue_host() -> Actor {
        Actor::user(2, [Role::VenueHost])
    }

    #[test]
    fn staff_approves_pending_venue() {
        assert_eq!(
            authorize_venue_transition(
                VenueStatus::PendingVerification,
                VenueStatus::Approved,
                &staff()
            )
            .unwrap(),
            Decision::Apply
        );
    }

    #[test]
    fn venue_host_cannot_approve_own_listing() {
        assert_matches!(
            authorize_venue_transition(
                VenueStatus::PendingVerification,
                VenueStatus::Approved,
                &venue_host()
            ),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn rejected_and_suspended_are_terminal() {
        for status in VenueStatus::ALL {
            let outgoing = VENUE_TRANSITIONS.iter().any(|e| e.from == *status);
            assert_eq!(status.is_terminal(), !outgoing, "status {status}");
        }
    }

    #[test]
    fn suspended_venue_cannot_be_reapproved() {
        assert_matches!(
            authorize_venue_transition(VenueStatus::Suspended, VenueStatus::Approved, &staff()),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn pending_venue_cannot_be_suspended() {
        assert_matches!(
            authorize_venue_transition(
                VenueStatus::PendingVerification,
                VenueStatus::Suspended,
                &staff()
            ),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn nothing_leads_back_to_pending() {
        assert_matches!(
            authorize_venue_transition(
                VenueStatus::PendingVerification,
                VenueStatus::PendingVerification,
                &staff()
            ),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn available_transitions_for_staff() {
        assert_eq!(
            available_venue_transitions(VenueStatus::PendingVerification, &staff()),
            vec![VenueStatus::Approved, VenueStatus::Rejected]
        );
        assert!(available_venue_transitions(VenueStatus::Approved, &venue_host()).is_empty());
    }

    #[test]
    fn listing_requires_name_and_address() {
        assert!(validate_venue_listing("Loft", "1 Main St", Some(80)).is_ok());
        assert_matches!(
            validate_venue_listing("  ", "1 Main St", None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_venue_listing("Loft", "", None),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            validate_venue_listing("Loft", "1 Main St", Some(-1)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn only_approved_accepts_events() {
        assert!(VenueStatus::Approved.accepts_events());
        assert!(!VenueStatus::PendingVerification.accepts_events());
    }
}
