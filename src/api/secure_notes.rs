// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Secure note CRUD endpoints.

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
        CreateSecureNoteRequest, MessageResponse, PageParams, SecureNoteListResponse,
        SecureNoteResponse, UpdateSecureNoteRequest,
    },
    state::AppState,
    storage::{
        AuditAction, NewAuditEntry, NewSecureNote, SecureNoteChanges, SecureNoteRepository,
    },
};

/// List the caller's secure notes.
#[utoipa::path(
    get,
    path = "/secure-notes",
    params(PageParams),
    tag = "SecureNotes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Page of notes with total count", body = SecureNoteListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_secure_notes(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<SecureNoteListResponse>, ApiError> {
    let (page, total) =
        SecureNoteRepository::new(state.db()).list(&user.user_id, params.skip, params.limit)?;
    let items = page.into_iter().map(Into::into).collect();
    Ok(Json(SecureNoteListResponse { items, total }))
}

/// Get one secure note by id.
#[utoipa::path(
    get,
    path = "/secure-notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    tag = "SecureNotes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The note", body = SecureNoteResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn get_secure_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<Json<SecureNoteResponse>, ApiError> {
    let note = SecureNoteRepository::new(state.db()).get_owned(&note_id, &user.user_id)?;
    Ok(Json(note.into()))
}

/// Create a secure note.
#[utoipa::path(
    post,
    path = "/secure-notes",
    request_body = CreateSecureNoteRequest,
    tag = "SecureNotes",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = SecureNoteResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_secure_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateSecureNoteRequest>,
) -> Result<(StatusCode, Json<SecureNoteResponse>), ApiError> {
    let note = SecureNoteRepository::new(state.db()).create(
        &user.user_id,
        NewSecureNote {
            encrypted_title: request.encrypted_title,
            encrypted_content: request.encrypted_content,
            encryption_iv: request.encryption_iv,
        },
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::NoteCreated)
            .with_actor(&user.user_id)
            .with_resource("secure_note", &note.id)
    );

    Ok((StatusCode::CREATED, Json(note.into())))
}

/// Partially update a secure note.
#[utoipa::path(
    put,
    path = "/secure-notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    request_body = UpdateSecureNoteRequest,
    tag = "SecureNotes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = SecureNoteResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn update_secure_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(note_id): Path<String>,
    Json(request): Json<UpdateSecureNoteRequest>,
) -> Result<Json<SecureNoteResponse>, ApiError> {
    let note = SecureNoteRepository::new(state.db()).update(
        &note_id,
        &user.user_id,
        SecureNoteChanges {
            encrypted_title: request.encrypted_title,
            encrypted_content: request.encrypted_content,
            encryption_iv: request.encryption_iv,
        },
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::NoteUpdated)
            .with_actor(&user.user_id)
            .with_resource("secure_note", &note_id)
    );

    Ok(Json(note.into()))
}

/// Delete a secure note.
#[utoipa::path(
    delete,
    path = "/secure-notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    tag = "SecureNotes",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn delete_secure_note(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    SecureNoteRepository::new(state.db()).delete(&note_id, &user.user_id)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::NoteDeleted)
            .with_actor(&user.user_id)
            .with_resource("secure_note", &note_id)
    );

    Ok(Json(MessageResponse::new("Secure note deleted successfully")))
}
