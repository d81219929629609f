//! The Status Transition Engine.
//!
//! [`TransitionEngine`] is the only code path that changes an event's or a
//! venue's status. For every request it:
//!
//! 1. loads the record (`NotFound`);
//! 2. compares the caller's `expected_status`, if given, with the stored
//!    status (`ConcurrentModification`);
//! 3. checks the edge table and the actor's authority (`InvalidTransition`,
//!    `Forbidden`); a self-transition by an authorized actor is a no-op;
//! 4. validates the note and, for events leaving `draft`, the required
//!    fields (`ValidationError`);
//! 5. asks the store for the conditional write plus history row; a lost
//!    race is `ConcurrentModification`. If the reply times out the record is
//!    re-read once, and a write that did commit is treated as applied;
//! 6. publishes a `*.status_changed` event to the bus.
//!
//! Failures at any step leave status and history untouched.

use std::sync::Arc;
use std::time::Duration;

use htw_core::actor::Actor;
use htw_core::edges::Decision;
use htw_core::error::CoreError;
use htw_core::event_validation::{validate_note, validate_ready_for_review};
use htw_core::event_workflow::{self, authorize_transition, EventStatus};
use htw_core::types::DbId;
use htw_core::venue_workflow::{self, authorize_venue_transition, VenueStatus};
use htw_db::models::event::Event;
use htw_db::models::status_history::{StatusChange, StatusHistory};
use htw_db::models::venue::Venue;
use htw_db::{StoreResult, WorkflowStore};
use htw_events::{event_names, EventBus, PlatformEvent, StatusChangedPayload};

use super::bounded;

/// A requested status change.
#[derive(Debug, Clone)]
pub struct TransitionRequest<S> {
    pub target: S,
    pub note: Option<String>,
    /// Status the caller last saw. When given and stale, the request fails
    /// before any authorization check.
    pub expected_status: Option<S>,
}

impl<S> TransitionRequest<S> {
    pub fn to(target: S) -> Self {
        Self {
            target,
            note: None,
            expected_status: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn expecting(mut self, status: S) -> Self {
        self.expected_status = Some(status);
        self
    }
}

/// Result of an accepted transition request.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Status changed and exactly one history row was appended.
    Applied { record: T, history: StatusHistory },
    /// Target equals the current status; nothing was written.
    Unchanged(T),
}

impl<T> Outcome<T> {
    pub fn record(&self) -> &T {
        match self {
            Outcome::Applied { record, .. } | Outcome::Unchanged(record) => record,
        }
    }

    pub fn into_parts(self) -> (T, Option<StatusHistory>) {
        match self {
            Outcome::Applied { record, history } => (record, Some(history)),
            Outcome::Unchanged(record) => (record, None),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }
}

pub struct TransitionEngine {
    store: Arc<dyn WorkflowStore>,
    bus: Arc<EventBus>,
    store_timeout: Duration,
}

impl TransitionEngine {
    pub fn new(store: Arc<dyn WorkflowStore>, bus: Arc<EventBus>, store_timeout: Duration) -> Self {
        Self {
            store,
            bus,
            store_timeout,
        }
    }

    pub fn store(&self) -> &dyn WorkflowStore {
        self.store.as_ref()
    }

    /// Run a store call under this engine's timeout.
    pub async fn call<T>(
        &self,
        fut: impl std::future::Future<Output = StoreResult<T>>,
    ) -> Result<T, CoreError> {
        bounded(self.store_timeout, fut).await
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub async fn transition_event(
        &self,
        event_id: DbId,
        request: TransitionRequest<EventStatus>,
        actor: &Actor,
    ) -> Result<Outcome<Event>, CoreError> {
        let event = self
            .call(self.store.find_event(event_id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: event_workflow::ENTITY,
                id: event_id,
            })?;

        ensure_expected(event_workflow::ENTITY, event_id, event.status, request.expected_status)?;

        let decision = authorize_transition(event.status, request.target, actor, event.host_user_id)
            .inspect_err(|e| {
                tracing::info!(
                    event_id,
                    from = %event.status,
                    to = %request.target,
                    user_id = ?actor.user_id(),
                    error = %e,
                    "Event transition rejected"
                );
            })?;
        if decision == Decision::Unchanged {
            tracing::debug!(event_id, status = %event.status, "Event already in requested status");
            return Ok(Outcome::Unchanged(event));
        }

        validate_note(request.note.as_deref())?;
        if request.target.requires_complete_fields() {
            validate_ready_for_review(event.title.as_deref(), event.description.as_deref())?;
        }

        let change = StatusChange {
            entity_id: event_id,
            from: event.status,
            to: request.target,
            changed_by: actor.user_id(),
            note: request.note,
        };
        let (updated, history) = match self.call(self.store.apply_event_transition(&change)).await {
            Ok(written) => written,
            Err(CoreError::UpstreamUnavailable(reason)) => {
                tracing::warn!(event_id, from = %change.from, to = %change.to, %reason, "Event transition write timed out");
                self.recover_event_write(&change)
                    .await?
                    .ok_or(CoreError::UpstreamUnavailable(reason))?
            }
            Err(e) => {
                tracing::warn!(event_id, from = %change.from, to = %change.to, error = %e, "Event transition write failed");
                return Err(e);
            }
        };

        tracing::info!(
            event_id,
            from = %change.from,
            to = %change.to,
            user_id = ?change.changed_by,
            "Event status changed"
        );

        self.bus.publish(
            PlatformEvent::new(event_names::EVENT_STATUS_CHANGED)
                .with_source("event", event_id)
                .with_actor(change.changed_by)
                .with_payload(
                    StatusChangedPayload {
                        from: change.from.to_string(),
                        to: change.to.to_string(),
                        note: change.note.clone(),
                        host_user_id: Some(updated.host_user_id),
                        title: updated.title.clone(),
                    }
                    .to_value(),
                ),
        );

        Ok(Outcome::Applied {
            record: updated,
            history,
        })
    }

    // -----------------------------------------------------------------------
    // Venues
    // -----------------------------------------------------------------------

    pub async fn transition_venue(
        &self,
        venue_id: DbId,
        request: TransitionRequest<VenueStatus>,
        actor: &Actor,
    ) -> Result<Outcome<Venue>, CoreError> {
        let venue = self
            .call(self.store.find_venue(venue_id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: venue_workflow::ENTITY,
                id: venue_id,
            })?;

        ensure_expected(venue_workflow::ENTITY, venue_id, venue.status, request.expected_status)?;

        if authorize_venue_transition(venue.status, request.target, actor)? == Decision::Unchanged {
            return Ok(Outcome::Unchanged(venue));
        }
        validate_note(request.note.as_deref())?;

        let change = StatusChange {
            entity_id: venue_id,
            from: venue.status,
            to: request.target,
            changed_by: actor.user_id(),
            note: request.note,
        };
        let (updated, history) = match self.call(self.store.apply_venue_transition(&change)).await {
            Ok(written) => written,
            Err(CoreError::UpstreamUnavailable(reason)) => {
                tracing::warn!(venue_id, from = %change.from, to = %change.to, %reason, "Venue transition write timed out");
                self.recover_venue_write(&change)
                    .await?
                    .ok_or(CoreError::UpstreamUnavailable(reason))?
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            venue_id,
            from = %change.from,
            to = %change.to,
            user_id = ?change.changed_by,
            "Venue status changed"
        );

        self.bus.publish(
            PlatformEvent::new(event_names::VENUE_STATUS_CHANGED)
                .with_source("venue", venue_id)
                .with_actor(change.changed_by)
                .with_payload(
                    StatusChangedPayload {
                        from: change.from.to_string(),
                        to: change.to.to_string(),
                        note: change.note.clone(),
                        host_user_id: None,
                        title: Some(updated.name.clone()),
                    }
                    .to_value(),
                ),
        );

        Ok(Outcome::Applied {
            record: updated,
            history,
        })
    }
}

// ---------------------------------------------------------------------------
// Timed-out writes
// ---------------------------------------------------------------------------

// A write whose reply timed out may still have committed. The engine re-reads
// once and adopts the write only when the newest history row is this change,
// so an accepted transition is always published.
impl TransitionEngine {
    async fn recover_event_write(
        &self,
        change: &StatusChange<EventStatus>,
    ) -> Result<Option<(Event, StatusHistory)>, CoreError> {
        let Some(event) = self.call(self.store.find_event(change.entity_id)).await? else {
            return Ok(None);
        };
        if event.status != change.to {
            return Ok(None);
        }
        let history = self.call(self.store.event_history(change.entity_id)).await?;
        Ok(newest_row_of(history, change).map(|row| {
            tracing::info!(event_id = change.entity_id, "Timed-out event transition had committed");
            (event, row)
        }))
    }

    async fn recover_venue_write(
        &self,
        change: &StatusChange<VenueStatus>,
    ) -> Result<Option<(Venue, StatusHistory)>, CoreError> {
        let Some(venue) = self.call(self.store.find_venue(change.entity_id)).await? else {
            return Ok(None);
        };
        if venue.status != change.to {
            return Ok(None);
        }
        let history = self.call(self.store.venue_history(change.entity_id)).await?;
        Ok(newest_row_of(history, change).map(|row| {
            tracing::info!(venue_id = change.entity_id, "Timed-out venue transition had committed");
            (venue, row)
        }))
    }
}

/// The newest history row (lists are oldest first) if it records `change`.
fn newest_row_of<S: std::fmt::Display>(
    history: Vec<StatusHistory>,
    change: &StatusChange<S>,
) -> Option<StatusHistory> {
    history.into_iter().last().filter(|row| {
        row.from_status.as_deref() == Some(change.from.to_string().as_str())
            && row.to_status == change.to.to_string()
            && row.changed_by == change.changed_by
    })
}

fn ensure_expected<S: PartialEq>(
    entity: &'static str,
    id: DbId,
    stored: S,
    expected: Option<S>,
) -> Result<(), CoreError> {
    match expected {
        Some(expected) if expected != stored => {
            Err(CoreError::ConcurrentModification { entity, id })
        }
        _ => Ok(()),
    }
}
