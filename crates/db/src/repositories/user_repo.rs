//! Repository for the `users` table.

use htw_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, UpdateUserProfile, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, auth_subject, email, name, org, bio, phone, avatar_url, \
    roles, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (auth_subject, email, name, org, roles)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.auth_subject)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.org)
            .bind(&input.roles)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by the identity provider's subject.
    pub async fn find_by_subject(
        pool: &PgPool,
        auth_subject: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE auth_subject = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(auth_subject)
            .fetch_optional(pool)
            .await
    }

    /// Update profile fields. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUserProfile,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                name = COALESCE($2, name),
                org = COALESCE($3, org),
                bio = COALESCE($4, bio),
                phone = COALESCE($5, phone),
                avatar_url = COALESCE($6, avatar_url),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.org)
            .bind(&input.bio)
            .bind(&input.phone)
            .bind(&input.avatar_url)
            .fetch_optional(pool)
            .await
    }

    /// Replace a user's role set.
    pub async fn set_roles(
        pool: &PgPool,
        id: DbId,
        roles: &[String],
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET roles = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(roles)
            .fetch_optional(pool)
            .await
    }
}
