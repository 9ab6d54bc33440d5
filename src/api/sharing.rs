// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Credential sharing endpoints.
//!
//! The server's role in sharing is strictly custodial: it validates
//! ownership and recipient identity, enforces the one-share-per-pair
//! invariant, and stores the wrapped key material. All wrapping and
//! unwrapping happens on clients.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    audit_log,
    auth::Auth,
    error::ApiError,
    models::{
        CreateShareRequest, MessageResponse, PageParams, SharedCredentialListResponse,
        SharedCredentialResponse, SharedUserResponse, UpdateShareRequest, UserSearchParams,
    },
    state::AppState,
    storage::{
        AuditAction, CredentialRepository, DirectoryEntry, NewAuditEntry, NewShare,
        PublicKeyEntry, ShareRepository, ShareRewrap, StoreError, StoredShare, UserRepository,
        VaultDatabase,
    },
};

/// Join a share with live display metadata.
///
/// Title and usernames are resolved at read time so renames show up;
/// lookups that fail (e.g. a row mid-cascade) degrade to empty strings
/// rather than failing the listing.
fn join_display(db: &VaultDatabase, share: StoredShare) -> SharedCredentialResponse {
    let credential_title = CredentialRepository::new(db)
        .get_owned(&share.credential_id, &share.owner_user_id)
        .map(|credential| credential.title)
        .unwrap_or_default();

    let users = UserRepository::new(db);
    let owner_username = users
        .get(&share.owner_user_id)
        .map(|user| user.username)
        .unwrap_or_default();
    let recipient_username = users
        .get(&share.recipient_user_id)
        .map(|user| user.username)
        .unwrap_or_default();

    SharedCredentialResponse::from_stored(share, credential_title, owner_username, recipient_username)
}

/// Share a credential with another user.
///
/// The caller must currently own the credential; the recipient must exist
/// and have a registered public key. Re-sharing an already-shared pair is a
/// conflict, reported distinctly so clients can offer "update instead".
#[utoipa::path(
    post,
    path = "/sharing/share",
    request_body = CreateShareRequest,
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Share created", body = SharedCredentialResponse),
        (status = 400, description = "Cannot share (not owned, bad recipient, or self-share)"),
        (status = 409, description = "Already shared with this user")
    )
)]
pub async fn share_credential(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateShareRequest>,
) -> Result<Json<SharedCredentialResponse>, ApiError> {
    let share = ShareRepository::new(state.db())
        .create(
            &user.user_id,
            NewShare {
                credential_id: request.credential_id,
                recipient_user_id: request.recipient_user_id,
                encrypted_sharing_key: request.encrypted_sharing_key,
                encrypted_shared_data: request.encrypted_shared_data,
                sharing_iv: request.sharing_iv,
            },
        )
        .map_err(|e| match e {
            // Collapse "no such credential", "not yours" and "no such
            // recipient" into one answer; only "already shared" stays
            // distinguishable.
            StoreError::NotFound(_) => ApiError::bad_request("Cannot share this credential"),
            other => ApiError::from(other),
        })?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::ShareCreated)
            .with_actor(&user.user_id)
            .with_resource("share", &share.id)
            .with_details(serde_json::json!({
                "credential_id": share.credential_id,
                "recipient_user_id": share.recipient_user_id,
            }))
    );

    Ok(Json(join_display(state.db(), share)))
}

/// List shares addressed to the caller.
#[utoipa::path(
    get,
    path = "/sharing/received",
    params(PageParams),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Page of received shares with total count", body = SharedCredentialListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn received_shares(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<SharedCredentialListResponse>, ApiError> {
    let (page, total) =
        ShareRepository::new(state.db()).list_received(&user.user_id, params.skip, params.limit)?;
    let items = page
        .into_iter()
        .map(|share| join_display(state.db(), share))
        .collect();
    Ok(Json(SharedCredentialListResponse { items, total }))
}

/// List shares issued by the caller.
#[utoipa::path(
    get,
    path = "/sharing/owned",
    params(PageParams),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Page of issued shares with total count", body = SharedCredentialListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn owned_shares(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<SharedCredentialListResponse>, ApiError> {
    let (page, total) =
        ShareRepository::new(state.db()).list_owned(&user.user_id, params.skip, params.limit)?;
    let items = page
        .into_iter()
        .map(|share| join_display(state.db(), share))
        .collect();
    Ok(Json(SharedCredentialListResponse { items, total }))
}

/// Revoke a share. Owner-exclusive: for anyone else the share does not
/// exist, and the row persists.
#[utoipa::path(
    delete,
    path = "/sharing/{share_id}",
    params(("share_id" = String, Path, description = "Share id")),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Revoked", body = MessageResponse),
        (status = 404, description = "Not found (or not the issuing owner)")
    )
)]
pub async fn revoke_share(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(share_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    ShareRepository::new(state.db()).revoke(&share_id, &user.user_id)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::ShareRevoked)
            .with_actor(&user.user_id)
            .with_resource("share", &share_id)
    );

    Ok(Json(MessageResponse::new("Shared credential deleted successfully")))
}

/// Look up a user's public key for wrapping share material.
#[utoipa::path(
    get,
    path = "/sharing/users/{user_id}/public-key",
    params(("user_id" = String, Path, description = "User id")),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The user's public key", body = PublicKeyEntry),
        (status = 404, description = "No such user or no registered key")
    )
)]
pub async fn get_user_public_key(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PublicKeyEntry>, ApiError> {
    let entry = UserRepository::new(state.db()).public_key(&user_id)?;
    Ok(Json(entry))
}

/// Search the directory for share recipients.
///
/// Case-insensitive substring match, excluding the caller, capped at a
/// small fixed limit. Queries under two characters return an empty list.
#[utoipa::path(
    get,
    path = "/sharing/users/search",
    params(UserSearchParams),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Matching users", body = [DirectoryEntry]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn search_users(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<UserSearchParams>,
) -> Result<Json<Vec<DirectoryEntry>>, ApiError> {
    let results = UserRepository::new(state.db()).search(&params.q, &user.user_id)?;
    Ok(Json(results))
}

/// List the users one credential is shared with. Owner only; for everyone
/// else the credential does not exist.
#[utoipa::path(
    get,
    path = "/sharing/credential/{credential_id}/users",
    params(("credential_id" = String, Path, description = "Credential id")),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Recipients", body = [SharedUserResponse]),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn credential_shared_users(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> Result<Json<Vec<SharedUserResponse>>, ApiError> {
    let shares =
        ShareRepository::new(state.db()).list_for_credential(&credential_id, &user.user_id)?;

    let users = UserRepository::new(state.db());
    let recipients = shares
        .into_iter()
        .map(|share| {
            let username = users
                .get(&share.recipient_user_id)
                .map(|user| user.username)
                .unwrap_or_default();
            SharedUserResponse {
                id: share.recipient_user_id,
                username,
                shared_at: share.created_at,
            }
        })
        .collect();

    Ok(Json(recipients))
}

/// Fetch the share for one (credential, recipient) pair. Owner only.
#[utoipa::path(
    get,
    path = "/sharing/credential/{credential_id}/user/{user_id}",
    params(
        ("credential_id" = String, Path, description = "Credential id"),
        ("user_id" = String, Path, description = "Recipient user id")
    ),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The share", body = SharedCredentialResponse),
        (status = 404, description = "Not found (or not the issuing owner)")
    )
)]
pub async fn get_credential_sharing(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((credential_id, recipient_user_id)): Path<(String, String)>,
) -> Result<Json<SharedCredentialResponse>, ApiError> {
    let share = ShareRepository::new(state.db()).get_by_ids(
        &credential_id,
        &recipient_user_id,
        &user.user_id,
    )?;
    Ok(Json(join_display(state.db(), share)))
}

/// Re-wrap the key material of an existing share (e.g. after key
/// rotation). Owner only; the (credential, recipient) pair is immutable.
#[utoipa::path(
    put,
    path = "/sharing/credential/{credential_id}/user/{user_id}",
    params(
        ("credential_id" = String, Path, description = "Credential id"),
        ("user_id" = String, Path, description = "Recipient user id")
    ),
    request_body = UpdateShareRequest,
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Share updated", body = SharedCredentialResponse),
        (status = 404, description = "Not found (or not the issuing owner)")
    )
)]
pub async fn update_credential_sharing(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((credential_id, recipient_user_id)): Path<(String, String)>,
    Json(request): Json<UpdateShareRequest>,
) -> Result<Json<SharedCredentialResponse>, ApiError> {
    let share = ShareRepository::new(state.db()).update(
        &credential_id,
        &recipient_user_id,
        &user.user_id,
        ShareRewrap {
            encrypted_sharing_key: request.encrypted_sharing_key,
            encrypted_shared_data: request.encrypted_shared_data,
            sharing_iv: request.sharing_iv,
        },
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::ShareUpdated)
            .with_actor(&user.user_id)
            .with_resource("share", &share.id)
    );

    Ok(Json(join_display(state.db(), share)))
}

/// Revoke the share for one (credential, recipient) pair. Owner only.
#[utoipa::path(
    delete,
    path = "/sharing/credential/{credential_id}/user/{user_id}",
    params(
        ("credential_id" = String, Path, description = "Credential id"),
        ("user_id" = String, Path, description = "Recipient user id")
    ),
    tag = "Sharing",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Revoked", body = MessageResponse),
        (status = 404, description = "Not found (or not the issuing owner)")
    )
)]
pub async fn revoke_credential_sharing(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((credential_id, recipient_user_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    ShareRepository::new(state.db()).revoke_by_ids(
        &credential_id,
        &recipient_user_id,
        &user.user_id,
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::ShareRevoked)
            .with_actor(&user.user_id)
            .with_resource("credential", &credential_id)
            .with_details(serde_json::json!({"recipient_user_id": recipient_user_id}))
    );

    Ok(Json(MessageResponse::new("Shared credential deleted successfully")))
}
