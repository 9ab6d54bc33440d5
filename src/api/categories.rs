// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Password category CRUD endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    audit_log,
    auth::Auth,
    error::ApiError,
    models::{CategoryResponse, CreateCategoryRequest, MessageResponse, UpdateCategoryRequest},
    state::AppState,
    storage::{AuditAction, CategoryChanges, CategoryRepository, NewAuditEntry},
};

/// List the caller's categories.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All categories", body = [CategoryResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_categories(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = CategoryRepository::new(state.db()).list(&user.user_id)?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Get one category by id.
#[utoipa::path(
    get,
    path = "/categories/{category_id}",
    params(("category_id" = String, Path, description = "Category id")),
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The category", body = CategoryResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn get_category(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = CategoryRepository::new(state.db()).get_owned(&category_id, &user.user_id)?;
    Ok(Json(category.into()))
}

/// Create a category. Names are unique per owner.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = CategoryResponse),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_category(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category =
        CategoryRepository::new(state.db()).create(&user.user_id, &request.name, request.color_hex)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::CategoryCreated)
            .with_actor(&user.user_id)
            .with_resource("category", &category.id)
    );

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// Partially update a category.
#[utoipa::path(
    put,
    path = "/categories/{category_id}",
    params(("category_id" = String, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = CategoryResponse),
        (status = 404, description = "Not found (or not yours)"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn update_category(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(category_id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = CategoryRepository::new(state.db()).update(
        &category_id,
        &user.user_id,
        CategoryChanges {
            name: request.name,
            color_hex: request.color_hex,
        },
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::CategoryUpdated)
            .with_actor(&user.user_id)
            .with_resource("category", &category_id)
    );

    Ok(Json(category.into()))
}

/// Delete a category, detaching it from the caller's credentials.
#[utoipa::path(
    delete,
    path = "/categories/{category_id}",
    params(("category_id" = String, Path, description = "Category id")),
    tag = "Categories",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found (or not yours)")
    )
)]
pub async fn delete_category(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    CategoryRepository::new(state.db()).delete(&category_id, &user.user_id)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::CategoryDeleted)
            .with_actor(&user.user_id)
            .with_resource("category", &category_id)
    );

    Ok(Json(MessageResponse::new("Category deleted successfully")))
}
