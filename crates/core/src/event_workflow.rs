//! Event status lifecycle.
//!
//! The edge table below is the single source of truth for which status
//! changes exist and who may make them:
//!
//! ```text
//! draft             -> submitted          host
//! submitted         -> in_review          staff
//! in_review         -> approved           staff
//! in_review         -> changes_requested  staff
//! changes_requested -> resubmitted        host
//! resubmitted       -> in_review          staff
//! approved          -> scheduled          staff
//! scheduled         -> published          staff
//! published         -> completed          staff | system
//! submitted         -> declined           staff
//! in_review         -> declined           staff
//! <non-terminal>    -> archived           staff
//! ```
//!
//! "host" always means the event's owner holding the `event_host` role.

use crate::actor::Actor;
use crate::edges::{self, Authority, Decision, Edge};
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;
use crate::vocabulary::define_vocabulary;

define_vocabulary! {
    /// Lifecycle status of an event.
    EventStatus ("event status") {
        Draft => "draft",
        Submitted => "submitted",
        InReview => "in_review",
        ChangesRequested => "changes_requested",
        Resubmitted => "resubmitted",
        Approved => "approved",
        Scheduled => "scheduled",
        Published => "published",
        Completed => "completed",
        Archived => "archived",
        Declined => "declined",
    }
}

use Authority::{Host, Staff, System};
use EventStatus::*;

/// Entity label used in error messages.
pub const ENTITY: &str = "Event";

/// Every allowed event status change.
pub const EVENT_TRANSITIONS: &[Edge<EventStatus>] = &[
    Edge::new(Draft, Submitted, Host),
    Edge::new(Submitted, InReview, Staff),
    Edge::new(InReview, Approved, Staff),
    Edge::new(InReview, ChangesRequested, Staff),
    Edge::new(ChangesRequested, Resubmitted, Host),
    Edge::new(Resubmitted, InReview, Staff),
    Edge::new(Approved, Scheduled, Staff),
    Edge::new(Scheduled, Published, Staff),
    Edge::new(Published, Completed, Staff),
    Edge::new(Published, Completed, System),
    Edge::new(Submitted, Declined, Staff),
    Edge::new(InReview, Declined, Staff),
    Edge::new(Draft, Archived, Staff),
    Edge::new(Submitted, Archived, Staff),
    Edge::new(InReview, Archived, Staff),
    Edge::new(ChangesRequested, Archived, Staff),
    Edge::new(Resubmitted, Archived, Staff),
    Edge::new(Approved, Archived, Staff),
    Edge::new(Scheduled, Archived, Staff),
    Edge::new(Published, Archived, Staff),
];

/// Statuses staff act on by default in the review queue.
pub const NEEDS_ATTENTION: &[EventStatus] = &[Submitted, InReview, Resubmitted];

impl EventStatus {
    /// No edge leaves a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Completed | Archived | Declined)
    }

    /// Whether the owning host may still edit the event's fields.
    pub fn is_host_editable(self) -> bool {
        matches!(self, Draft | ChangesRequested)
    }

    /// Any status past `draft` requires a complete title and description.
    pub fn requires_complete_fields(self) -> bool {
        self != Draft
    }
}

/// Whether `actor` satisfies `authority` for an event owned by `host_user_id`.
pub fn actor_satisfies(actor: &Actor, authority: Authority, host_user_id: DbId) -> bool {
    match authority {
        Host => actor.has_role(Role::EventHost) && actor.is_user(host_user_id),
        Staff => actor.is_staff(),
        System => actor.is_system(),
    }
}

/// Check legality and authorization of moving an event from `current` to `target`.
pub fn authorize_transition(
    current: EventStatus,
    target: EventStatus,
    actor: &Actor,
    host_user_id: DbId,
) -> Result<Decision, CoreError> {
    edges::decide(ENTITY, EVENT_TRANSITIONS, current, target, |authority| {
        actor_satisfies(actor, authority, host_user_id)
    })
}

/// Statuses `actor` could move the event to from `current`.
pub fn available_transitions(
    current: EventStatus,
    actor: &Actor,
    host_user_id: DbId,
) -> Vec<EventStatus> {
    edges::reachable_targets(EVENT_TRANSITIONS, current, |authority| {
        actor_satisfies(actor, authority, host_user_id)
    })
}
