//! [`WorkflowStore`] backed by PostgreSQL through the repositories.

use async_trait::async_trait;
use htw_core::event_workflow::{self, EventStatus};
use htw_core::queue::EventListFilter;
use htw_core::types::{DbId, Timestamp};
use htw_core::venue_workflow::{self, VenueStatus};

use super::{StoreError, StoreResult, WorkflowStore};
use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};
use crate::models::event::{CreateEvent, Event, UpdateEvent};
use crate::models::status_history::{DecisionCounts, StatusChange, StatusHistory};
use crate::models::user::{CreateUser, UpdateUserProfile, User};
use crate::models::venue::{CreateVenue, Venue, VenueListFilter};
use crate::repositories::{AuditLogRepo, EventRepo, TransitionWrite, UserRepo, VenueRepo};
use crate::DbPool;

/// Production store over a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn settle<T>(
    write: TransitionWrite<T>,
    entity: &'static str,
    id: DbId,
) -> StoreResult<(T, StatusHistory)> {
    match write {
        TransitionWrite::Applied(row, history) => Ok((row, history)),
        TransitionWrite::Stale => Err(StoreError::StaleStatus { entity, id }),
        TransitionWrite::Missing => Err(StoreError::NotFound { entity, id }),
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_subject(&self, auth_subject: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_subject(&self.pool, auth_subject).await?)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn update_user_profile(
        &self,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> StoreResult<Option<User>> {
        Ok(UserRepo::update_profile(&self.pool, id, input).await?)
    }

    async fn set_user_roles(&self, id: DbId, roles: &[String]) -> StoreResult<Option<User>> {
        Ok(UserRepo::set_roles(&self.pool, id, roles).await?)
    }

    async fn create_event(&self, host_user_id: DbId, input: &CreateEvent) -> StoreResult<Event> {
        Ok(EventRepo::create(&self.pool, host_user_id, input).await?)
    }

    async fn find_event(&self, id: DbId) -> StoreResult<Option<Event>> {
        Ok(EventRepo::find_by_id(&self.pool, id).await?)
    }

    async fn update_event(
        &self,
        id: DbId,
        expected_status: EventStatus,
        input: &UpdateEvent,
    ) -> StoreResult<Option<Event>> {
        Ok(EventRepo::update(&self.pool, id, expected_status, input).await?)
    }

    async fn list_events(&self, filter: &EventListFilter) -> StoreResult<Vec<Event>> {
        Ok(EventRepo::list(&self.pool, filter).await?)
    }

    async fn event_statuses_for_host(&self, host_user_id: DbId) -> StoreResult<Vec<EventStatus>> {
        Ok(EventRepo::statuses_for_host(&self.pool, host_user_id).await?)
    }

    async fn count_events(&self, statuses: &[EventStatus]) -> StoreResult<i64> {
        Ok(EventRepo::count_by_statuses(&self.pool, statuses).await?)
    }

    async fn events_due_for_completion(&self, now: Timestamp) -> StoreResult<Vec<Event>> {
        Ok(EventRepo::due_for_completion(&self.pool, now).await?)
    }

    async fn apply_event_transition(
        &self,
        change: &StatusChange<EventStatus>,
    ) -> StoreResult<(Event, StatusHistory)> {
        let write = EventRepo::apply_status_change(&self.pool, change).await?;
        settle(write, event_workflow::ENTITY, change.entity_id)
    }

    async fn event_history(&self, event_id: DbId) -> StoreResult<Vec<StatusHistory>> {
        Ok(EventRepo::history(&self.pool, event_id).await?)
    }

    async fn decision_counts_since(&self, since: Timestamp) -> StoreResult<DecisionCounts> {
        Ok(EventRepo::decision_counts_since(&self.pool, since).await?)
    }

    async fn create_venue(
        &self,
        input: &CreateVenue,
        claimed_by_user_id: Option<DbId>,
    ) -> StoreResult<Venue> {
        Ok(VenueRepo::create(&self.pool, input, claimed_by_user_id).await?)
    }

    async fn find_venue(&self, id: DbId) -> StoreResult<Option<Venue>> {
        Ok(VenueRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_venues(&self, filter: &VenueListFilter) -> StoreResult<Vec<Venue>> {
        Ok(VenueRepo::list(&self.pool, filter).await?)
    }

    async fn count_venues(&self, status: VenueStatus) -> StoreResult<i64> {
        Ok(VenueRepo::count_by_status(&self.pool, status).await?)
    }

    async fn apply_venue_transition(
        &self,
        change: &StatusChange<VenueStatus>,
    ) -> StoreResult<(Venue, StatusHistory)> {
        let write = VenueRepo::apply_status_change(&self.pool, change).await?;
        settle(write, venue_workflow::ENTITY, change.entity_id)
    }

    async fn venue_history(&self, venue_id: DbId) -> StoreResult<Vec<StatusHistory>> {
        Ok(VenueRepo::history(&self.pool, venue_id).await?)
    }

    async fn last_audit_hash(&self) -> StoreResult<Option<String>> {
        Ok(AuditLogRepo::find_last_hash(&self.pool).await?)
    }

    async fn append_audit(&self, entry: &CreateAuditLog) -> StoreResult<AuditLog> {
        Ok(AuditLogRepo::insert(&self.pool, entry).await?)
    }

    async fn list_audit(
        &self,
        query: &AuditQuery,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<AuditLog>> {
        Ok(AuditLogRepo::query(&self.pool, query, limit, offset).await?)
    }

    async fn audit_chain(&self) -> StoreResult<Vec<AuditLog>> {
        Ok(AuditLogRepo::fetch_chain(&self.pool).await?)
    }
}
