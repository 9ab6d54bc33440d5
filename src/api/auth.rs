// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Registration, login and salt lookup.
//!
//! These are the only endpoints reachable without a bearer token (besides
//! health). Login never sees a plaintext password: the client derives a
//! verifier hash from the master password and the login salt, and the
//! server compares hashes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    audit_log,
    auth::Role,
    error::ApiError,
    models::{LoginRequest, RegisterRequest, TokenResponse, UserResponse, UserSalts},
    state::AppState,
    storage::{AuditAction, NewAuditEntry, StoredUser, UserRepository},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SaltsParams {
    /// Username to fetch salts for.
    pub username: String,
}

/// Fetch a user's salts for client-side key derivation.
///
/// Public by necessity: the client needs both salts before it can log in.
#[utoipa::path(
    get,
    path = "/auth/salts",
    params(SaltsParams),
    tag = "Auth",
    responses(
        (status = 200, description = "The user's salts", body = UserSalts),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_salts(
    State(state): State<AppState>,
    Query(params): Query<SaltsParams>,
) -> Result<Json<UserSalts>, ApiError> {
    let user = UserRepository::new(state.db())
        .find_by_username(&params.username)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserSalts {
        login_salt: user.login_salt,
        encryption_salt: user.encryption_salt,
    }))
}

/// Register a new account with the default role.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 409, description = "Username already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let mut roles = vec![Role::User];
    if state.seed_admin.as_deref() == Some(request.username.as_str()) {
        roles.push(Role::Admin);
    }

    let now = Utc::now();
    let user = StoredUser {
        id: uuid::Uuid::new_v4().to_string(),
        username: request.username,
        login_password_hash: request.login_password_hash,
        login_salt: request.login_salt,
        encryption_salt: request.encryption_salt,
        avatar_url: None,
        public_key: None,
        encrypted_private_key: None,
        roles,
        created_at: now,
        updated_at: now,
    };
    UserRepository::new(state.db()).create(&user)?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::UserRegistered)
            .with_actor(&user.id)
            .with_resource("user", &user.id)
    );

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Verify the login verifier hash and issue a bearer token.
///
/// The token embeds username and roles and is valid for a fixed window
/// (default 30 minutes); there is no refresh flow.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = UserRepository::new(state.db()).find_by_username(&request.username)?;

    let user = match user {
        Some(user) if user.login_password_hash == request.login_password_hash => user,
        _ => {
            // Anonymous entry: the claimed username goes into details, not
            // into the actor field.
            audit_log!(
                state.db(),
                NewAuditEntry::new(AuditAction::LoginFailed)
                    .with_details(serde_json::json!({"username": request.username}))
            );
            return Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "Incorrect username or password",
            ));
        }
    };

    let access_token = state
        .tokens
        .issue(&user.username, &user.roles)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    audit_log!(
        state.db(),
        NewAuditEntry::new(AuditAction::LoginSuccess)
            .with_actor(&user.id)
            .with_resource("user", &user.id)
    );

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenSigner;
    use crate::storage::{AuditRepository, VaultDatabase};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_state() -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        let state = AppState::new(Arc::new(db), Arc::new(TokenSigner::new("test-secret", 30)));
        (state, temp)
    }

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            login_password_hash: "verifier".to_string(),
            login_salt: "login-salt".to_string(),
            encryption_salt: "enc-salt".to_string(),
        }
    }

    #[tokio::test]
    async fn register_creates_account_with_default_role() {
        let (state, _temp) = test_state();

        let (status, Json(user)) = register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.username, "alice");
        assert_eq!(user.roles, vec![Role::User]);

        // Registration is audited.
        let entries = AuditRepository::new(state.db()).list(0, 10, None).unwrap();
        assert_eq!(entries[0].action, AuditAction::UserRegistered);
    }

    #[tokio::test]
    async fn register_duplicate_username_conflicts() {
        let (state, _temp) = test_state();

        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();
        let err = register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn seed_admin_gets_the_admin_role() {
        let (state, _temp) = test_state();
        let state = state.with_seed_admin(Some("root".to_string()));

        let (_, Json(user)) = register(State(state.clone()), Json(register_request("root")))
            .await
            .unwrap();
        assert!(user.roles.contains(&Role::Admin));

        let (_, Json(other)) = register(State(state), Json(register_request("alice")))
            .await
            .unwrap();
        assert!(!other.roles.contains(&Role::Admin));
    }

    #[tokio::test]
    async fn salts_are_public_but_require_an_existing_user() {
        let (state, _temp) = test_state();
        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();

        let Json(salts) = get_salts(
            State(state.clone()),
            Query(SaltsParams {
                username: "alice".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(salts.login_salt, "login-salt");
        assert_eq!(salts.encryption_salt, "enc-salt");

        let err = get_salts(
            State(state),
            Query(SaltsParams {
                username: "ghost".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_issues_a_verifiable_token() {
        let (state, _temp) = test_state();
        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();

        let Json(token) = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".to_string(),
                login_password_hash: "verifier".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(token.token_type, "bearer");

        let claims = state.tokens.verify(&token.access_token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, vec![Role::User]);
    }

    #[tokio::test]
    async fn failed_login_is_rejected_and_audited_anonymously() {
        let (state, _temp) = test_state();
        register(State(state.clone()), Json(register_request("alice")))
            .await
            .unwrap();

        let err = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "alice".to_string(),
                login_password_hash: "wrong".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let entries = AuditRepository::new(state.db()).list(0, 10, None).unwrap();
        assert_eq!(entries[0].action, AuditAction::LoginFailed);
        assert_eq!(entries[0].user_id, None);
        assert_eq!(entries[0].details.as_ref().unwrap()["username"], "alice");
    }
}
