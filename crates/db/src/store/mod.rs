//! The workflow store seam.
//!
//! Everything above the DB crate talks to persistence through
//! [`WorkflowStore`]. [`PgStore`] is the production backend over the
//! repositories; [`MemoryStore`] holds the same data in process for tests
//! and local runs without Postgres. Both honor the same contract, in
//! particular that a status change is a conditional write which either
//! updates the row and appends one history entry, or does neither.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use htw_core::error::CoreError;
use htw_core::event_workflow::EventStatus;
use htw_core::queue::EventListFilter;
use htw_core::types::{DbId, Timestamp};
use htw_core::venue_workflow::VenueStatus;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};
use crate::models::event::{CreateEvent, Event, UpdateEvent};
use crate::models::status_history::{DecisionCounts, StatusChange, StatusHistory};
use crate::models::user::{CreateUser, UpdateUserProfile, User};
use crate::models::venue::{CreateVenue, Venue, VenueListFilter};

/// Errors raised by a [`WorkflowStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// A conditional status write found a different status than expected.
    #[error("{entity} {id} changed status since it was read")]
    StaleStatus { entity: &'static str, id: DbId },

    #[error("Duplicate value violates unique constraint: {0}")]
    Duplicate(String),

    /// The backend could not be reached or did not answer in time.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(ref db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::Duplicate(db_err.constraint().unwrap_or("unknown").to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::StaleStatus { entity, id } => {
                CoreError::ConcurrentModification { entity, id }
            }
            StoreError::Duplicate(constraint) => {
                CoreError::Conflict(format!("Duplicate value violates {constraint}"))
            }
            StoreError::Unavailable(msg) => CoreError::UpstreamUnavailable(msg),
            StoreError::Database(e) => CoreError::Internal(format!("Database error: {e}")),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Await a store call for at most `limit`. On expiry the call is dropped and
/// reported as [`StoreError::Unavailable`]; nothing is retried.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
        Err(StoreError::Unavailable(format!(
            "Store did not respond within {} ms",
            limit.as_millis()
        )))
    })
}

/// Persistence operations needed by the portal.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    // --- users ---

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>>;

    async fn find_user_by_subject(&self, auth_subject: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Duplicate`] when the subject is already onboarded.
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;

    async fn update_user_profile(
        &self,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> StoreResult<Option<User>>;

    async fn set_user_roles(&self, id: DbId, roles: &[String]) -> StoreResult<Option<User>>;

    // --- events ---

    async fn create_event(&self, host_user_id: DbId, input: &CreateEvent) -> StoreResult<Event>;

    async fn find_event(&self, id: DbId) -> StoreResult<Option<Event>>;

    /// Apply field edits only while the event is still in `expected_status`.
    async fn update_event(
        &self,
        id: DbId,
        expected_status: EventStatus,
        input: &UpdateEvent,
    ) -> StoreResult<Option<Event>>;

    async fn list_events(&self, filter: &EventListFilter) -> StoreResult<Vec<Event>>;

    async fn event_statuses_for_host(&self, host_user_id: DbId) -> StoreResult<Vec<EventStatus>>;

    /// Count events in any of `statuses`; empty counts all.
    async fn count_events(&self, statuses: &[EventStatus]) -> StoreResult<i64>;

    async fn events_due_for_completion(&self, now: Timestamp) -> StoreResult<Vec<Event>>;

    /// Conditional status write plus one history row, atomically.
    ///
    /// [`StoreError::StaleStatus`] when the stored status is no longer
    /// `change.from`; [`StoreError::NotFound`] when the event is gone.
    async fn apply_event_transition(
        &self,
        change: &StatusChange<EventStatus>,
    ) -> StoreResult<(Event, StatusHistory)>;

    async fn event_history(&self, event_id: DbId) -> StoreResult<Vec<StatusHistory>>;

    async fn decision_counts_since(&self, since: Timestamp) -> StoreResult<DecisionCounts>;

    // --- venues ---

    async fn create_venue(
        &self,
        input: &CreateVenue,
        claimed_by_user_id: Option<DbId>,
    ) -> StoreResult<Venue>;

    async fn find_venue(&self, id: DbId) -> StoreResult<Option<Venue>>;

    async fn list_venues(&self, filter: &VenueListFilter) -> StoreResult<Vec<Venue>>;

    async fn count_venues(&self, status: VenueStatus) -> StoreResult<i64>;

    /// Same contract as [`WorkflowStore::apply_event_transition`], for venues.
    async fn apply_venue_transition(
        &self,
        change: &StatusChange<VenueStatus>,
    ) -> StoreResult<(Venue, StatusHistory)>;

    async fn venue_history(&self, venue_id: DbId) -> StoreResult<Vec<StatusHistory>>;

    // --- audit ---

    async fn last_audit_hash(&self) -> StoreResult<Option<String>>;

    async fn append_audit(&self, entry: &CreateAuditLog) -> StoreResult<AuditLog>;

    async fn list_audit(
        &self,
        query: &AuditQuery,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<AuditLog>>;

    /// Every audit entry in id order.
    async fn audit_chain(&self) -> StoreResult<Vec<AuditLog>>;
}
