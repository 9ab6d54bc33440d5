// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Admin-only API endpoints.
//!
//! These endpoints require the Admin role and provide the user overview and
//! audit log queries. Both accesses are themselves audited.

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    audit_log,
    auth::AdminOnly,
    error::ApiError,
    models::{AuditLogParams, PageParams, UserResponse},
    state::AppState,
    storage::{AuditAction, AuditLogEntry, AuditRepository, NewAuditEntry, UserRepository},
};

/// List all registered users.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(PageParams),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_users(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = UserRepository::new(state.db()).list(params.skip, params.limit)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::AdminViewUsers)
            .with_actor(&user.user_id)
            .with_resource("user", "*")
    );

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Query the audit log, newest-first.
#[utoipa::path(
    get,
    path = "/admin/audit-logs",
    params(AuditLogParams),
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Audit entries", body = [AuditLogEntry]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not authorized (admin required)")
    )
)]
pub async fn list_audit_logs(
    AdminOnly(user): AdminOnly,
    State(state): State<AppState>,
    Query(params): Query<AuditLogParams>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    let entries = AuditRepository::new(state.db()).list(
        params.skip,
        params.limit,
        params.user_id.as_deref(),
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::AdminViewAuditLogs)
            .with_actor(&user.user_id)
            .with_resource("audit_log", "*")
    );

    Ok(Json(entries))
}
