//! In-memory implementation of [`WorkflowStore`].
//!
//! All data lives behind one `RwLock`, so a status change and its history
//! row are applied under a single write guard. Data is lost on restart.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use htw_core::event_workflow::{self, EventStatus};
use htw_core::queue::{EventListFilter, SortOrder};
use htw_core::types::{DbId, Timestamp};
use htw_core::venue_workflow::{self, VenueStatus};
use tokio::sync::RwLock;

use super::{StoreError, StoreResult, WorkflowStore};
use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};
use crate::models::event::{CreateEvent, Event, UpdateEvent};
use crate::models::status_history::{DecisionCounts, StatusChange, StatusHistory};
use crate::models::user::{CreateUser, UpdateUserProfile, User};
use crate::models::venue::{CreateVenue, Venue, VenueListFilter};

#[derive(Default)]
struct Tables {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    events: BTreeMap<DbId, Event>,
    event_history: Vec<StatusHistory>,
    venues: BTreeMap<DbId, Venue>,
    venue_history: Vec<StatusHistory>,
    audit: Vec<AuditLog>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory workflow store.
///
/// Besides plain storage it can simulate an unreachable or slow backend,
/// which is how the upstream-unavailable paths are exercised in tests.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
    latency_ms: AtomicU64,
    ack_latency_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            ack_latency_ms: AtomicU64::new(0),
        }
    }

    /// While `false`, every call fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Delay every call by `latency` before touching the data.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay the reply to a status write by `latency` after the write has
    /// been applied, like a commit whose acknowledgement is slow.
    pub fn set_ack_latency(&self, latency: Duration) {
        self.ack_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    async fn acknowledge(&self) {
        let latency = self.ack_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    async fn gate(&self) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn page<T>(rows: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    rows.skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

fn history_row<S: std::fmt::Display>(id: DbId, change: &StatusChange<S>) -> StatusHistory {
    StatusHistory {
        id,
        entity_id: change.entity_id,
        from_status: Some(change.from.to_string()),
        to_status: change.to.to_string(),
        changed_by: change.changed_by,
        note: change.note.clone(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.gate().await
    }

    // --- users ---

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        self.gate().await?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_subject(&self, auth_subject: &str) -> StoreResult<Option<User>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.auth_subject == auth_subject)
            .cloned())
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.auth_subject == input.auth_subject)
        {
            return Err(StoreError::Duplicate("users_auth_subject_key".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            auth_subject: input.auth_subject.clone(),
            email: input.email.clone(),
            name: input.name.clone(),
            org: input.org.clone(),
            bio: None,
            phone: None,
            avatar_url: None,
            roles: input.roles.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_profile(
        &self,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> StoreResult<Option<User>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(v) = &input.name {
            user.name = v.clone();
        }
        if let Some(v) = &input.org {
            user.org = Some(v.clone());
        }
        if let Some(v) = &input.bio {
            user.bio = Some(v.clone());
        }
        if let Some(v) = &input.phone {
            user.phone = Some(v.clone());
        }
        if let Some(v) = &input.avatar_url {
            user.avatar_url = Some(v.clone());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_user_roles(&self, id: DbId, roles: &[String]) -> StoreResult<Option<User>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.roles = roles.to_vec();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    // --- events ---

    async fn create_event(&self, host_user_id: DbId, input: &CreateEvent) -> StoreResult<Event> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let event = Event {
            id: tables.next_id(),
            host_user_id,
            venue_id: input.venue_id,
            title: input.title.clone(),
            description: input.description.clone(),
            idea_text: input.idea_text.clone(),
            event_types: input.event_types.clone(),
            audience_types: input.audience_types.clone(),
            capacity_target: input.capacity_target,
            start_at: input.start_at,
            end_at: input.end_at,
            time_flexible: input.time_flexible.unwrap_or(false),
            marketing_stage: input.marketing_stage.clone(),
            luma_url: input.luma_url.clone(),
            attachments: input
                .attachments
                .clone()
                .unwrap_or_else(|| serde_json::json!([])),
            status: EventStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: DbId) -> StoreResult<Option<Event>> {
        self.gate().await?;
        Ok(self.tables.read().await.events.get(&id).cloned())
    }

    async fn update_event(
        &self,
        id: DbId,
        expected_status: EventStatus,
        input: &UpdateEvent,
    ) -> StoreResult<Option<Event>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        match tables.events.get_mut(&id) {
            Some(event) if event.status == expected_status => {
                event.apply_update(input);
                event.updated_at = Utc::now();
                Ok(Some(event.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_events(&self, filter: &EventListFilter) -> StoreResult<Vec<Event>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Event> = tables
            .events
            .values()
            .filter(|e| filter.matches(e.host_user_id, e.status))
            .collect();
        rows.sort_by_key(|e| (e.created_at, e.id));
        if filter.order == SortOrder::Descending {
            rows.reverse();
        }
        Ok(page(rows.into_iter().cloned(), filter.limit, filter.offset))
    }

    async fn event_statuses_for_host(&self, host_user_id: DbId) -> StoreResult<Vec<EventStatus>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .values()
            .filter(|e| e.host_user_id == host_user_id)
            .map(|e| e.status)
            .collect())
    }

    async fn count_events(&self, statuses: &[EventStatus]) -> StoreResult<i64> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .values()
            .filter(|e| statuses.is_empty() || statuses.contains(&e.status))
            .count() as i64)
    }

    async fn events_due_for_completion(&self, now: Timestamp) -> StoreResult<Vec<Event>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<Event> = tables
            .events
            .values()
            .filter(|e| e.status == EventStatus::Published)
            .filter(|e| e.end_at.is_some_and(|end| end < now))
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.end_at);
        Ok(rows)
    }

    async fn apply_event_transition(
        &self,
        change: &StatusChange<EventStatus>,
    ) -> StoreResult<(Event, StatusHistory)> {
        self.gate().await?;
        let written = {
            let mut tables = self.tables.write().await;
            let history_id = tables.next_id();
            let entity = event_workflow::ENTITY;
            let event = tables
                .events
                .get_mut(&change.entity_id)
                .ok_or(StoreError::NotFound { entity, id: change.entity_id })?;
            if event.status != change.from {
                return Err(StoreError::StaleStatus { entity, id: change.entity_id });
            }
            event.status = change.to;
            event.updated_at = Utc::now();
            let event = event.clone();

            let history = history_row(history_id, change);
            tables.event_history.push(history.clone());
            (event, history)
        };
        self.acknowledge().await;
        Ok(written)
    }

    async fn event_history(&self, event_id: DbId) -> StoreResult<Vec<StatusHistory>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .event_history
            .iter()
            .filter(|h| h.entity_id == event_id)
            .cloned()
            .collect())
    }

    async fn decision_counts_since(&self, since: Timestamp) -> StoreResult<DecisionCounts> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut counts = DecisionCounts::default();
        for row in tables.event_history.iter().filter(|h| h.created_at >= since) {
            match row.to_status.as_str() {
                "approved" => counts.approved += 1,
                "declined" => counts.declined += 1,
                _ => {}
            }
        }
        Ok(counts)
    }

    // --- venues ---

    async fn create_venue(
        &self,
        input: &CreateVenue,
        claimed_by_user_id: Option<DbId>,
    ) -> StoreResult<Venue> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let venue = Venue {
            id: tables.next_id(),
            name: input.name.clone(),
            address: input.address.clone(),
            neighborhood: input.neighborhood.clone(),
            capacity: input.capacity,
            amenities: input.amenities.clone(),
            contact_email: input.contact_email.clone(),
            listing_visibility: input.listing_visibility.unwrap_or(true),
            claimed_by_user_id,
            status: VenueStatus::PendingVerification,
            created_at: now,
            updated_at: now,
        };
        tables.venues.insert(venue.id, venue.clone());
        Ok(venue)
    }

    async fn find_venue(&self, id: DbId) -> StoreResult<Option<Venue>> {
        self.gate().await?;
        Ok(self.tables.read().await.venues.get(&id).cloned())
    }

    async fn list_venues(&self, filter: &VenueListFilter) -> StoreResult<Vec<Venue>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Venue> = tables.venues.values().filter(|v| filter.matches(v)).collect();
        rows.sort_by_key(|v| (v.created_at, v.id));
        rows.reverse();
        Ok(page(rows.into_iter().cloned(), filter.limit, filter.offset))
    }

    async fn count_venues(&self, status: VenueStatus) -> StoreResult<i64> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables.venues.values().filter(|v| v.status == status).count() as i64)
    }

    async fn apply_venue_transition(
        &self,
        change: &StatusChange<VenueStatus>,
    ) -> StoreResult<(Venue, StatusHistory)> {
        self.gate().await?;
        let written = {
            let mut tables = self.tables.write().await;
            let history_id = tables.next_id();
            let entity = venue_workflow::ENTITY;
            let venue = tables
                .venues
                .get_mut(&change.entity_id)
                .ok_or(StoreError::NotFound { entity, id: change.entity_id })?;
            if venue.status != change.from {
                return Err(StoreError::StaleStatus { entity, id: change.entity_id });
            }
            venue.status = change.to;
            venue.updated_at = Utc::now();
            let venue = venue.clone();

            let history = history_row(history_id, change);
            tables.venue_history.push(history.clone());
            (venue, history)
        };
        self.acknowledge().await;
        Ok(written)
    }

    async fn venue_history(&self, venue_id: DbId) -> StoreResult<Vec<StatusHistory>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .venue_history
            .iter()
            .filter(|h| h.entity_id == venue_id)
            .cloned()
            .collect())
    }

    // --- audit ---

    async fn last_audit_hash(&self) -> StoreResult<Option<String>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables.audit.last().map(|e| e.integrity_hash.clone()))
    }

    async fn append_audit(&self, entry: &CreateAuditLog) -> StoreResult<AuditLog> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        let row = AuditLog {
            id: tables.next_id(),
            user_id: entry.user_id,
            action_type: entry.action_type.clone(),
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id,
            details_json: entry.details_json.clone(),
            integrity_hash: entry.integrity_hash.clone(),
            created_at: Utc::now(),
        };
        tables.audit.push(row.clone());
        Ok(row)
    }

    async fn list_audit(
        &self,
        query: &AuditQuery,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<AuditLog>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let rows = tables.audit.iter().rev().filter(|e| query.matches(e)).cloned();
        Ok(page(rows, limit, offset))
    }

    async fn audit_chain(&self) -> StoreResult<Vec<AuditLog>> {
        self.gate().await?;
        Ok(self.tables.read().await.audit.clone())
    }
}
