//! Repository for the `audit_log` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, AuditQuery, CreateAuditLog};

/// Column list for `audit_log` SELECT queries.
const COLUMNS: &str = "id, user_id, action_type, entity_type, entity_id, \
    details_json, integrity_hash, created_at";

/// Provides append and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry.
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_log
                (user_id, action_type, entity_type, entity_id, details_json, integrity_hash)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.user_id)
            .bind(&entry.action_type)
            .bind(&entry.entity_type)
            .bind(entry.entity_id)
            .bind(&entry.details_json)
            .bind(&entry.integrity_hash)
            .fetch_one(pool)
            .await
    }

    /// Find the integrity hash of the most recent audit log entry.
    pub async fn find_last_hash(pool: &PgPool) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT integrity_hash FROM audit_log ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Query audit logs with filtering and pagination, newest first.
    pub async fn query(
        pool: &PgPool,
        params: &AuditQuery,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_log
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::TEXT IS NULL OR action_type = $2)
               AND ($3::TEXT IS NULL OR entity_type = $3)
               AND ($4::BIGINT IS NULL OR entity_id = $4)
             ORDER BY id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(params.user_id)
            .bind(&params.action_type)
            .bind(&params.entity_type)
            .bind(params.entity_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Every entry in id order, for hash chain verification.
    pub async fn fetch_chain(pool: &PgPool) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_log ORDER BY id ASC");
        sqlx::query_as::<_, AuditLog>(&query).fetch_all(pool).await
    }
}
