// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::Role,
    models::{
        CategoryResponse, CreateCategoryRequest, CreateCredentialRequest, CreateSecureNoteRequest,
        CreateShareRequest, CredentialListResponse, CredentialResponse, LoginRequest,
        MessageResponse, RegisterRequest, SecureNoteListResponse, SecureNoteResponse,
        SharedCredentialListResponse, SharedCredentialResponse, SharedUserResponse, TokenResponse,
        UpdateAvatarRequest, UpdateCategoryRequest, UpdateCredentialRequest, UpdateKeysRequest,
        UpdateSecureNoteRequest, UpdateShareRequest, UserResponse, UserSalts, UserStatsResponse,
    },
    state::AppState,
    storage::{
        AuditAction, AuditLogEntry, DirectoryEntry, PublicKeyEntry, SortBy, SortDirection,
    },
};

pub mod admin;
pub mod auth;
pub mod categories;
pub mod credentials;
pub mod health;
pub mod secure_notes;
pub mod sharing;
pub mod users;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/salts", get(auth::get_salts))
        .route("/auth/login", post(auth::login))
        .route("/users/me", get(users::me))
        .route("/users/me/avatar", put(users::update_avatar))
        .route("/users/keys", put(users::update_keys))
        .route("/users/me/stats", get(users::stats))
        .route(
            "/credentials",
            get(credentials::list_credentials).post(credentials::create_credential),
        )
        .route(
            "/credentials/{credential_id}",
            get(credentials::get_credential)
                .put(credentials::update_credential)
                .delete(credentials::delete_credential),
        )
        .route(
            "/secure-notes",
            get(secure_notes::list_secure_notes).post(secure_notes::create_secure_note),
        )
        .route(
            "/secure-notes/{note_id}",
            get(secure_notes::get_secure_note)
                .put(secure_notes::update_secure_note)
                .delete(secure_notes::delete_secure_note),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/{category_id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/sharing/share", post(sharing::share_credential))
        .route("/sharing/received", get(sharing::received_shares))
        .route("/sharing/owned", get(sharing::owned_shares))
        .route("/sharing/users/search", get(sharing::search_users))
        .route(
            "/sharing/users/{user_id}/public-key",
            get(sharing::get_user_public_key),
        )
        .route(
            "/sharing/credential/{credential_id}/users",
            get(sharing::credential_shared_users),
        )
        .route(
            "/sharing/credential/{credential_id}/user/{user_id}",
            get(sharing::get_credential_sharing)
                .put(sharing::update_credential_sharing)
                .delete(sharing::revoke_credential_sharing),
        )
        .route("/sharing/{share_id}", delete(sharing::revoke_share))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/audit-logs", get(admin::list_audit_logs))
        .with_state(state);

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root,
        health::health,
        auth::register,
        auth::get_salts,
        auth::login,
        users::me,
        users::update_avatar,
        users::update_keys,
        users::stats,
        credentials::list_credentials,
        credentials::get_credential,
        credentials::create_credential,
        credentials::update_credential,
        credentials::delete_credential,
        secure_notes::list_secure_notes,
        secure_notes::get_secure_note,
        secure_notes::create_secure_note,
        secure_notes::update_secure_note,
        secure_notes::delete_secure_note,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        sharing::share_credential,
        sharing::received_shares,
        sharing::owned_shares,
        sharing::revoke_share,
        sharing::get_user_public_key,
        sharing::search_users,
        sharing::credential_shared_users,
        sharing::get_credential_sharing,
        sharing::update_credential_sharing,
        sharing::revoke_credential_sharing,
        admin::list_users,
        admin::list_audit_logs
    ),
    components(
        schemas(
            MessageResponse,
            health::HealthResponse,
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            UserSalts,
            UserResponse,
            UpdateAvatarRequest,
            UpdateKeysRequest,
            UserStatsResponse,
            CreateCredentialRequest,
            UpdateCredentialRequest,
            CredentialResponse,
            CredentialListResponse,
            CreateSecureNoteRequest,
            UpdateSecureNoteRequest,
            SecureNoteResponse,
            SecureNoteListResponse,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryResponse,
            CreateShareRequest,
            UpdateShareRequest,
            SharedCredentialResponse,
            SharedCredentialListResponse,
            SharedUserResponse,
            DirectoryEntry,
            PublicKeyEntry,
            AuditLogEntry,
            AuditAction,
            SortBy,
            SortDirection,
            Role
        )
    ),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Auth", description = "Registration, login and salt lookup"),
        (name = "Users", description = "Profile, keys and stats"),
        (name = "Credentials", description = "Encrypted credential storage"),
        (name = "SecureNotes", description = "Encrypted note storage"),
        (name = "Categories", description = "Owner-scoped credential tags"),
        (name = "Sharing", description = "Per-recipient credential sharing"),
        (name = "Admin", description = "User overview and audit log queries")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSigner;
    use crate::storage::VaultDatabase;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        let state = AppState::new(Arc::new(db), Arc::new(TokenSigner::new("test-secret", 30)));

        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
