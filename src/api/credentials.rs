// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Credential CRUD endpoints.
//!
//! Every operation is scoped to the authenticated caller as owner. The
//! payload is ciphertext end to end; the server validates nothing about it.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    audit_log,
    auth::Auth,
    error::ApiError,
    models::{
        CreateCredentialRequest, CredentialListParams, CredentialListResponse, CredentialResponse,
        MessageResponse, UpdateCredentialRequest,
    },
    state::AppState,
    storage::{
        AuditAction, CategoryRepository, CredentialChanges, CredentialRepository, ListOptions,
        NewAuditEntry, NewCredential, StoredCategory, StoredCredential, VaultDatabase,
    },
};

/// Resolve a credential's category tags for display.
fn resolve_categories(db: &VaultDatabase, credential: &StoredCredential) -> Vec<StoredCategory> {
    let repo = CategoryRepository::new(db);
    credential
        .category_ids
        .iter()
        .filter_map(|id| repo.get_owned(id, &credential.owner_user_id).ok())
        .collect()
}

fn to_response(db: &VaultDatabase, credential: StoredCredential) -> CredentialResponse {
    let categories = resolve_categories(db, &credential);
    CredentialResponse::from_stored(credential, categories)
}

/// List the caller's credentials.
#[utoipa::path(
    get,
    path = "/credentials",
    params(CredentialListParams),
    tag = "Credentials",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Page of credentials with total count", body = CredentialListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_credentials(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<CredentialListParams>,
) -> Result<Json<CredentialListResponse>, ApiError> {
    let options = ListOptions {
        sort_by: params.sort_by,
        sort_direction: params.sort_direction,
        filter_category: params.filter_category,
    };
    let (page, total) = CredentialRepository::new(state.db()).list(
        &user.user_id,
        &options,
        params.skip,
        params.limit,
    )?;

    let items = page
        .into_iter()
        .map(|credential| to_response(state.db(), credential))
        .collect();
    Ok(Json(CredentialListResponse { items, total }))
}

/// Get one credential by id.
#[utoipa::path(
    get,
    path = "/credentials/{credential_id}",
    params(("credential_id" = String, Path, description = "Credential id")),
    tag = "Credentials",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The credential", body = CredentialResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn get_credential(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let credential =
        CredentialRepository::new(state.db()).get_owned(&credential_id, &user.user_id)?;
    Ok(Json(to_response(state.db(), credential)))
}

/// Create a credential.
#[utoipa::path(
    post,
    path = "/credentials",
    request_body = CreateCredentialRequest,
    tag = "Credentials",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = CredentialResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_credential(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateCredentialRequest>,
) -> Result<(StatusCode, Json<CredentialResponse>), ApiError> {
    let credential = CredentialRepository::new(state.db()).create(
        &user.user_id,
        NewCredential {
            title: request.title,
            url: request.url,
            username: request.username,
            encrypted_data: request.encrypted_data,
            encryption_iv: request.encryption_iv,
            category_ids: request.category_ids,
        },
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::CredentialCreated)
            .with_actor(&user.user_id)
            .with_resource("credential", &credential.id)
    );

    Ok((StatusCode::CREATED, Json(to_response(state.db(), credential))))
}

/// Partially update a credential.
#[utoipa::path(
    put,
    path = "/credentials/{credential_id}",
    params(("credential_id" = String, Path, description = "Credential id")),
    request_body = UpdateCredentialRequest,
    tag = "Credentials",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = CredentialResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn update_credential(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
    Json(request): Json<UpdateCredentialRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let credential = CredentialRepository::new(state.db()).update(
        &credential_id,
        &user.user_id,
        CredentialChanges {
            title: request.title,
            url: request.url,
            username: request.username,
            encrypted_data: request.encrypted_data,
            encryption_iv: request.encryption_iv,
            category_ids: request.category_ids,
        },
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::CredentialUpdated)
            .with_actor(&user.user_id)
            .with_resource("credential", &credential_id)
    );

    Ok(Json(to_response(state.db(), credential)))
}

/// Delete a credential. Shares of this credential are removed in the same
/// transaction.
#[utoipa::path(
    delete,
    path = "/credentials/{credential_id}",
    params(("credential_id" = String, Path, description = "Credential id")),
    tag = "Credentials",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn delete_credential(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    CredentialRepository::new(state.db()).delete(&credential_id, &user.user_id)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::CredentialDeleted)
            .with_actor(&user.user_id)
            .with_resource("credential", &credential_id)
    );

    Ok(Json(MessageResponse::new("Credential deleted successfully")))
}
