// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims carried by a PassOwl bearer token.
///
/// Tokens are issued by this server at login and verified with the same
/// HS256 secret. The role set is embedded at issuance and fixed for the
/// token's lifetime; the validity window is fixed too — there is no refresh
/// flow, an expired token forces re-authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the username
    pub sub: String,

    /// Roles granted at issuance
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Authenticated user information resolved from a verified token.
///
/// This is the primary type used throughout the application to represent
/// the caller. The user id is resolved against the identity directory at
/// request time, so a token whose subject has disappeared never
/// authenticates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user id
    pub user_id: String,

    /// Username (the token subject)
    pub username: String,

    /// Roles embedded in the token at issuance
    pub roles: Vec<Role>,
}

impl AuthenticatedUser {
    /// Check if the user has the required role (directly or by privilege).
    pub fn has_role(&self, required: Role) -> bool {
        self.roles.iter().any(|role| role.has_privilege(required))
    }

    /// Check if this user is an admin.
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}
