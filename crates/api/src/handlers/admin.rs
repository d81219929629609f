//! Staff-only administration: role assignment and the audit trail.

use axum::extract::{Path, Query, State};
use axum::Json;
use htw_core::audit::first_broken_link;
use htw_core::error::CoreError;
use htw_core::pagination::{clamp_limit, clamp_offset};
use htw_core::roles::RoleSet;
use htw_core::types::DbId;
use htw_db::models::audit::{AuditLog, AuditQuery};
use htw_db::models::user::User;
use htw_events::{event_names, PlatformEvent};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::publish;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SetRolesRequest {
    pub roles: Vec<String>,
}

/// PUT /api/v1/admin/users/{id}/roles
///
/// Replace a user's role set. The new set must be non-empty.
pub async fn set_user_roles(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<SetRolesRequest>,
) -> AppResult<Json<DataResponse<User>>> {
    let roles = RoleSet::parse_strict(&input.roles)?;
    roles.ensure_non_empty()?;

    let user = state
        .call(state.store.set_user_roles(user_id, &roles.names()))
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user_id,
        })?;

    tracing::info!(
        staff_id = staff.id(),
        user_id,
        roles = ?user.roles,
        "User roles replaced"
    );
    publish(
        &state,
        &staff,
        PlatformEvent::new(event_names::USER_ROLES_CHANGED)
            .with_source("user", user_id)
            .with_payload(serde_json::json!({ "roles": user.roles })),
    );

    Ok(Json(DataResponse { data: user }))
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/audit
///
/// Newest entries first, filtered by `user_id`, `action_type`,
/// `entity_type` and `entity_id`.
pub async fn list_audit(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<DataResponse<Vec<AuditLog>>>> {
    let limit = clamp_limit(query.limit);
    let offset = clamp_offset(query.offset);
    let entries = state
        .call(state.store.list_audit(&query, limit, offset))
        .await?;
    Ok(Json(DataResponse { data: entries }))
}

#[derive(Debug, Serialize)]
pub struct ChainReport {
    pub total_entries: usize,
    pub intact: bool,
    /// Id of the first entry whose stored hash does not verify.
    pub first_broken_id: Option<DbId>,
}

/// GET /api/v1/admin/audit/verify
///
/// Recompute the hash chain over the whole audit log.
pub async fn verify_audit(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<ChainReport>>> {
    let chain = state.call(state.store.audit_chain()).await?;
    let data: Vec<String> = chain.iter().map(AuditLog::canonical_data).collect();

    let broken = first_broken_link(
        data.iter()
            .zip(&chain)
            .map(|(d, entry)| (d.as_str(), entry.integrity_hash.as_str())),
    );
    let first_broken_id = broken.map(|idx| chain[idx].id);

    if let Some(id) = first_broken_id {
        tracing::warn!(staff_id = staff.id(), entry_id = id, "Audit chain verification failed");
    }

    Ok(Json(DataResponse {
        data: ChainReport {
            total_entries: chain.len(),
            intact: first_broken_id.is_none(),
            first_broken_id,
        },
    }))
}
