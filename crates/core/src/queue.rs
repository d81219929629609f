//! Review queue projection rules.
//!
//! The queue is a read-only view over events. Which rows an actor sees, and
//! in what order, depends only on the resolved [`QueueView`]:
//!
//! - host view: the actor's own events, every status, newest first;
//! - staff view: events needing attention (or an explicit status set),
//!   oldest first so review stays first-in-first-out.

use crate::actor::Actor;
use crate::error::CoreError;
use crate::event_workflow::{EventStatus, NEEDS_ATTENTION};
use crate::pagination::{clamp_limit, clamp_offset};
use crate::roles::Role;
use crate::types::DbId;
use crate::vocabulary::define_vocabulary;

define_vocabulary! {
    /// Perspective the queue is rendered from.
    QueueView ("queue view") {
        Host => "host",
        Staff => "staff",
    }
}

/// Ordering by `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Store-level filter derived from an actor and their query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventListFilter {
    /// Restrict to one owner (host view).
    pub host_user_id: Option<DbId>,
    /// Empty means every status.
    pub statuses: Vec<EventStatus>,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl EventListFilter {
    /// Whether a row passes the owner and status predicates.
    pub fn matches(&self, host_user_id: DbId, status: EventStatus) -> bool {
        let owner_ok = match self.host_user_id {
            Some(owner) => owner == host_user_id,
            None => true,
        };
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&status);
        owner_ok && status_ok
    }

    /// Status names for binding as a TEXT[] parameter.
    pub fn status_names(&self) -> Vec<String> {
        self.statuses.iter().map(|s| s.as_str().to_string()).collect()
    }
}

/// Pick the view for `actor`, honoring an explicit request only when the
/// actor holds the matching role.
pub fn resolve_view(actor: &Actor, requested: Option<QueueView>) -> Result<QueueView, CoreError> {
    let can_staff = actor.is_staff();
    let can_host = actor.has_role(Role::EventHost);

    match requested {
        Some(QueueView::Staff) if can_staff => Ok(QueueView::Staff),
        Some(QueueView::Host) if can_host => Ok(QueueView::Host),
        Some(view) => Err(CoreError::Forbidden(format!(
            "The '{view}' queue view requires the {} role",
            match view {
                QueueView::Staff => Role::HtwStaff,
                QueueView::Host => Role::EventHost,
            }
        ))),
        None if can_staff => Ok(QueueView::Staff),
        None if can_host => Ok(QueueView::Host),
        None => Err(CoreError::Forbidden(
            "The review queue is available to event hosts and staff only".to_string(),
        )),
    }
}

/// Build the store filter for a resolved view.
pub fn build_filter(
    actor: &Actor,
    view: QueueView,
    statuses: Option<Vec<EventStatus>>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<EventListFilter, CoreError> {
    let statuses = statuses.unwrap_or_default();
    let (host_user_id, statuses, order) = match view {
        QueueView::Host => {
            let id = actor.user_id().ok_or_else(|| {
                CoreError::Forbidden("The host queue requires a user actor".to_string())
            })?;
            (Some(id), statuses, SortOrder::Descending)
        }
        QueueView::Staff => {
            let statuses = if statuses.is_empty() {
                NEEDS_ATTENTION.to_vec()
            } else {
                statuses
            };
            (None, statuses, SortOrder::Ascending)
        }
    };

    Ok(EventListFilter {
        host_user_id,
        statuses,
        order,
        limit: clamp_limit(limit),
        offset: clamp_offset(offset),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn host() -> Actor {
        Actor::user(7, [Role::EventHost])
    }

    fn staff() -> Actor {
        Actor::user(8, [Role::HtwStaff])
    }

    fn both() -> Actor {
        Actor::user(9, [Role::HtwStaff, Role::EventHost])
    }

    // -----------------------------------------------------------------------
    // View resolution
    // -----------------------------------------------------------------------

    #[test]
    fn staff_view_wins_by_default() {
        assert_eq!(resolve_view(&both(), None).unwrap(), QueueView::Staff);
        assert_eq!(resolve_view(&host(), None).unwrap(), QueueView::Host);
    }

    #[test]
    fn explicit_view_must_match_a_role() {
        assert_eq!(
            resolve_view(&both(), Some(QueueView::Host)).unwrap(),
            QueueView::Host
        );
        assert_matches!(
            resolve_view(&host(), Some(QueueView::Staff)),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn venue_host_only_is_forbidden() {
        let actor = Actor::user(3, [Role::VenueHost]);
        assert_matches!(resolve_view(&actor, None), Err(CoreError::Forbidden(_)));
    }

    // -----------------------------------------------------------------------
    // Filters
    // -----------------------------------------------------------------------

    #[test]
    fn host_filter_is_scoped_to_owner_and_newest_first() {
        let filter = build_filter(&host(), QueueView::Host, None, None, None).unwrap();
        assert_eq!(filter.host_user_id, Some(7));
        assert!(filter.statuses.is_empty());
        assert_eq!(filter.order, SortOrder::Descending);
        assert!(filter.matches(7, EventStatus::Archived));
        assert!(!filter.matches(8, EventStatus::Draft));
    }

    #[test]
    fn staff_filter_defaults_to_needs_attention_oldest_first() {
        let filter = build_filter(&staff(), QueueView::Staff, None, Some(500), Some(-1)).unwrap();
        assert_eq!(filter.host_user_id, None);
        assert_eq!(
            filter.statuses,
            vec![EventStatus::Submitted, EventStatus::InReview, EventStatus::Resubmitted]
        );
        assert_eq!(filter.order, SortOrder::Ascending);
        assert_eq!(filter.limit, 200);
        assert_eq!(filter.offset, 0);
        assert!(!filter.matches(1, EventStatus::Draft));
    }

    #[test]
    fn staff_filter_accepts_explicit_statuses() {
        let filter = build_filter(
            &staff(),
            QueueView::Staff,
            Some(vec![EventStatus::Approved]),
            None,
            None,
        )
        .unwrap();
        assert_eq!(filter.status_names(), vec!["approved".to_string()]);
    }

    #[test]
    fn resubmitted_and_submitted_are_equally_visible_to_staff() {
        let filter = build_filter(&staff(), QueueView::Staff, None, None, None).unwrap();
        assert!(filter.matches(1, EventStatus::Submitted));
        assert!(filter.matches(1, EventStatus::Resubmitted));
    }
}
