// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! User profile endpoints.

use axum::{extract::State, Json};

use crate::{
    audit_log,
    auth::Auth,
    error::ApiError,
    models::{
        MessageResponse, UpdateAvatarRequest, UpdateKeysRequest, UserResponse, UserStatsResponse,
    },
    state::AppState,
    storage::{
        AuditAction, CategoryRepository, CredentialRepository, NewAuditEntry, SecureNoteRepository,
        ShareRepository, UserRepository,
    },
};

/// Get the current authenticated user's profile.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn me(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let stored = UserRepository::new(state.db()).get(&user.user_id)?;
    Ok(Json(stored.into()))
}

/// Update the caller's avatar URL.
#[utoipa::path(
    put,
    path = "/users/me/avatar",
    request_body = UpdateAvatarRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn update_avatar(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateAvatarRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated =
        UserRepository::new(state.db()).update_avatar(&user.user_id, &request.avatar_url)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::AvatarUpdated)
            .with_actor(&user.user_id)
            .with_resource("user", &user.user_id)
    );

    Ok(Json(updated.into()))
}

/// Set the caller's asymmetric key pair.
///
/// The public key becomes the wrapping target for shares addressed to this
/// user; the private key arrives already encrypted under a key only the
/// user can derive.
#[utoipa::path(
    put,
    path = "/users/keys",
    request_body = UpdateKeysRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Keys updated", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn update_keys(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateKeysRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    UserRepository::new(state.db()).update_keys(
        &user.user_id,
        &request.public_key,
        &request.encrypted_private_key,
    )?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::KeysUpdated)
            .with_actor(&user.user_id)
            .with_resource("user", &user.user_id)
    );

    Ok(Json(MessageResponse::new("Keys updated successfully")))
}

/// Aggregate counts for the caller's dashboard.
#[utoipa::path(
    get,
    path = "/users/me/stats",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Resource counts", body = UserStatsResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn stats(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserStatsResponse>, ApiError> {
    let db = state.db();
    Ok(Json(UserStatsResponse {
        own_credentials_count: CredentialRepository::new(db).count_by_owner(&user.user_id)?,
        shared_credentials_count: ShareRepository::new(db).count_received(&user.user_id)?,
        secure_notes_count: SecureNoteRepository::new(db).count_by_owner(&user.user_id)?,
        categories_count: CategoryRepository::new(db).count_by_owner(&user.user_id)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role, TokenSigner};
    use crate::storage::{StoredUser, VaultDatabase};
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        let state = AppState::new(Arc::new(db), Arc::new(TokenSigner::new("test-secret", 30)));
        (state, temp)
    }

    fn seed_user(state: &AppState, username: &str) -> AuthenticatedUser {
        let now = Utc::now();
        let user = StoredUser {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            login_password_hash: "hash".to_string(),
            login_salt: "ls".to_string(),
            encryption_salt: "es".to_string(),
            avatar_url: None,
            public_key: None,
            encrypted_private_key: None,
            roles: vec![Role::User],
            created_at: now,
            updated_at: now,
        };
        UserRepository::new(state.db()).create(&user).unwrap();
        AuthenticatedUser {
            user_id: user.id,
            username: user.username,
            roles: vec![Role::User],
        }
    }

    #[tokio::test]
    async fn me_returns_the_profile() {
        let (state, _temp) = test_state();
        let user = seed_user(&state, "alice");

        let Json(profile) = me(Auth(user), State(state)).await.unwrap();
        assert_eq!(profile.username, "alice");
    }

    #[tokio::test]
    async fn avatar_and_keys_update_the_record() {
        let (state, _temp) = test_state();
        let user = seed_user(&state, "alice");

        update_avatar(
            Auth(user.clone()),
            State(state.clone()),
            Json(UpdateAvatarRequest {
                avatar_url: "https://example.com/a.png".to_string(),
            }),
        )
        .await
        .unwrap();

        update_keys(
            Auth(user.clone()),
            State(state.clone()),
            Json(UpdateKeysRequest {
                public_key: "pk".to_string(),
                encrypted_private_key: "epk".to_string(),
            }),
        )
        .await
        .unwrap();

        let stored = UserRepository::new(state.db()).get(&user.user_id).unwrap();
        assert_eq!(stored.avatar_url.as_deref(), Some("https://example.com/a.png"));
        assert_eq!(stored.public_key.as_deref(), Some("pk"));
        assert_eq!(stored.encrypted_private_key.as_deref(), Some("epk"));
    }

    #[tokio::test]
    async fn stats_start_at_zero() {
        let (state, _temp) = test_state();
        let user = seed_user(&state, "alice");

        let Json(stats) = stats(Auth(user), State(state)).await.unwrap();
        assert_eq!(stats.own_credentials_count, 0);
        assert_eq!(stats.shared_credentials_count, 0);
        assert_eq!(stats.secure_notes_count, 0);
        assert_eq!(stats.categories_count, 0);
    }
}
