//! Repository for the `venues` and `venue_status_history` tables.

use htw_core::types::DbId;
use htw_core::venue_workflow::VenueStatus;
use sqlx::PgPool;

use super::TransitionWrite;
use crate::models::status_history::{StatusChange, StatusHistory};
use crate::models::venue::{CreateVenue, Venue, VenueListFilter};

/// Column list for `venues` queries.
const COLUMNS: &str = "id, name, address, neighborhood, capacity, amenities, contact_email, \
    listing_visibility, claimed_by_user_id, status, created_at, updated_at";

const HISTORY_COLUMNS: &str =
    "id, venue_id AS entity_id, from_status, to_status, changed_by, note, created_at";

/// Provides CRUD and status-transition operations for venues.
pub struct VenueRepo;

impl VenueRepo {
    /// Insert a new listing in `pending_verification`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateVenue,
        claimed_by_user_id: Option<DbId>,
    ) -> Result<Venue, sqlx::Error> {
        let query = format!(
            "INSERT INTO venues
                (name, address, neighborhood, capacity, amenities, contact_email,
                 listing_visibility, claimed_by_user_id, status)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, true), $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Venue>(&query)
            .bind(&input.name)
            .bind(&input.address)
            .bind(&input.neighborhood)
            .bind(input.capacity)
            .bind(&input.amenities)
            .bind(&input.contact_email)
            .bind(input.listing_visibility)
            .bind(claimed_by_user_id)
            .bind(VenueStatus::PendingVerification.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Venue>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM venues WHERE id = $1");
        sqlx::query_as::<_, Venue>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List venues, newest first.
    pub async fn list(pool: &PgPool, filter: &VenueListFilter) -> Result<Vec<Venue>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM venues
             WHERE ($1::TEXT IS NULL OR status = $1)
               AND ($2::BIGINT IS NULL
                    OR claimed_by_user_id = $2
                    OR ($5::BOOLEAN AND status = 'approved'))
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Venue>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.claimed_by_user_id)
            .bind(filter.limit)
            .bind(filter.offset)
            .bind(filter.claimed_or_approved)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_status(pool: &PgPool, status: VenueStatus) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*)::BIGINT FROM venues WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(pool)
            .await
    }

    /// Conditionally move a venue to a new status and append its history row.
    pub async fn apply_status_change(
        pool: &PgPool,
        change: &StatusChange<VenueStatus>,
    ) -> Result<TransitionWrite<Venue>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let update_query = format!(
            "UPDATE venues SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Venue>(&update_query)
            .bind(change.entity_id)
            .bind(change.from.as_str())
            .bind(change.to.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(venue) = updated else {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM venues WHERE id = $1)",
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
            "INSERT INTO venue_status_history (venue_id, from_status, to_status, changed_by, note)
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
        Ok(TransitionWrite::Applied(venue, history))
    }

    /// Full status history of a venue, oldest first.
    pub async fn history(pool: &PgPool, venue_id: DbId) -> Result<Vec<StatusHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM venue_status_history
             WHERE venue_id = $1
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, StatusHistory>(&query)
            .bind(venue_id)
            .fetch_all(pool)
            .await
    }
}
