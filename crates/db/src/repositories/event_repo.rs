//! Repository for the `events` and `event_status_history` tables.

use htw_core::event_workflow::EventStatus;
use htw_core::queue::EventListFilter;
use htw_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use super::TransitionWrite;
use crate::models::event::{CreateEvent, Event, UpdateEvent};
use crate::models::status_history::{DecisionCounts, StatusChange, StatusHistory};

/// Column list for `events` queries.
const COLUMNS: &str = "id, host_user_id, venue_id, title, description, idea_text, \
    event_types, audience_types, capacity_target, start_at, end_at, time_flexible, \
    marketing_stage, luma_url, attachments, status, created_at, updated_at";

/// Column list for `event_status_history` queries, aliased to the shared shape.
const HISTORY_COLUMNS: &str =
    "id, event_id AS entity_id, from_status, to_status, changed_by, note, created_at";

/// Provides CRUD and status-transition operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new draft owned by `host_user_id`.
    pub async fn create(
        pool: &PgPool,
        host_user_id: DbId,
        input: &CreateEvent,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events
                (host_user_id, venue_id, title, description, idea_text, event_types,
                 audience_types, capacity_target, start_at, end_at, time_flexible,
                 marketing_stage, luma_url, attachments, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, false),
                     $12, $13, COALESCE($14, '[]'::jsonb), $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(host_user_id)
            .bind(input.venue_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.idea_text)
            .bind(&input.event_types)
            .bind(&input.audience_types)
            .bind(input.capacity_target)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.time_flexible)
            .bind(&input.marketing_stage)
            .bind(&input.luma_url)
            .bind(&input.attachments)
            .bind(EventStatus::Draft.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update editable fields while the event is still in `expected_status`.
    ///
    /// Returns `None` if the row is missing or its status moved on.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        expected_status: EventStatus,
        input: &UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                idea_text = COALESCE($5, idea_text),
                event_types = COALESCE($6, event_types),
                audience_types = COALESCE($7, audience_types),
                capacity_target = COALESCE($8, capacity_target),
                start_at = COALESCE($9, start_at),
                end_at = COALESCE($10, end_at),
                time_flexible = COALESCE($11, time_flexible),
                venue_id = COALESCE($12, venue_id),
                marketing_stage = COALESCE($13, marketing_stage),
                luma_url = COALESCE($14, luma_url),
                attachments = COALESCE($15, attachments),
                updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(expected_status.as_str())
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.idea_text)
            .bind(&input.event_types)
            .bind(&input.audience_types)
            .bind(input.capacity_target)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.time_flexible)
            .bind(input.venue_id)
            .bind(&input.marketing_stage)
            .bind(&input.luma_url)
            .bind(&input.attachments)
            .fetch_optional(pool)
            .await
    }

    /// List events matching a review-queue filter.
    pub async fn list(pool: &PgPool, filter: &EventListFilter) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE ($1::BIGINT IS NULL OR host_user_id = $1)
               AND (cardinality($2::TEXT[]) = 0 OR status = ANY($2))
             ORDER BY created_at {order}, id {order}
             LIMIT $3 OFFSET $4",
            order = filter.order.as_sql()
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(filter.host_user_id)
            .bind(filter.status_names())
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Statuses of every event owned by a host.
    pub async fn statuses_for_host(
        pool: &PgPool,
        host_user_id: DbId,
    ) -> Result<Vec<EventStatus>, sqlx::Error> {
        let names = sqlx::query_scalar::<_, String>(
            "SELECT status FROM events WHERE host_user_id = $1",
        )
        .bind(host_user_id)
        .fetch_all(pool)
        .await?;

        names
            .into_iter()
            .map(|n| n.parse::<EventStatus>().map_err(|e| sqlx::Error::Decode(Box::new(e))))
            .collect()
    }

    /// Count events in any of `statuses`; an empty slice counts every event.
    pub async fn count_by_statuses(
        pool: &PgPool,
        statuses: &[EventStatus],
    ) -> Result<i64, sqlx::Error> {
        let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM events
             WHERE cardinality($1::TEXT[]) = 0 OR status = ANY($1)",
        )
        .bind(&names)
        .fetch_one(pool)
        .await
    }

    /// Published events whose end time has passed.
    pub async fn due_for_completion(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE status = 'published' AND end_at IS NOT NULL AND end_at < $1
             ORDER BY end_at ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Conditionally move an event to a new status and append its history row.
    ///
    /// The update only matches while the row still holds `change.from`; both
    /// writes share one transaction, so readers never see one without the other.
    pub async fn apply_status_change(
        pool: &PgPool,
        change: &StatusChange<EventStatus>,
    ) -> Result<TransitionWrite<Event>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let update_query = format!(
            "UPDATE events SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Event>(&update_query)
            .bind(change.entity_id)
            .bind(change.from.as_str())
            .bind(change.to.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(event) = updated else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)",
            )
            .bind(change.entity_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;
            return Ok(if exists {
                TransitionWrite::Stale
            } else {
                TransitionWrite::Missing
            });
        };

        let history_query = format!(
            "INSERT INTO event_status_history (event_id, from_status, to_status, changed_by, note)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {HISTORY_COLUMNS}"
        );
        let history = sqlx::query_as::<_, StatusHistory>(&history_query)
            .bind(change.entity_id)
            .bind(change.from.as_str())
            .bind(change.to.as_str())
            .bind(change.changed_by)
            .bind(&change.note)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TransitionWrite::Applied(event, history))
    }

    /// Full status history of an event, oldest first.
    pub async fn history(pool: &PgPool, event_id: DbId) -> Result<Vec<StatusHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM event_status_history
             WHERE event_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, StatusHistory>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Approve/decline decisions recorded since `since`.
    pub async fn decision_counts_since(
        pool: &PgPool,
        since: Timestamp,
    ) -> Result<DecisionCounts, sqlx::Error> {
        sqlx::query_as::<_, DecisionCounts>(
            "SELECT
                COUNT(*) FILTER (WHERE to_status = 'approved')::BIGINT AS approved,
                COUNT(*) FILTER (WHERE to_status = 'declined')::BIGINT AS declined
             FROM event_status_history
             WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await
    }
}
