// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`/`Deserialize` and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation.
//!
//! ## Patch Semantics
//!
//! Partial updates distinguish three states per field: absent = unchanged,
//! `null` = clear (only for nullable fields), value = set. Nullable fields
//! use a double `Option` via `serde_with::rust::double_option`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::Role;
use crate::storage::{
    SortBy, SortDirection, StoredCategory, StoredCredential, StoredSecureNote, StoredShare,
    StoredUser,
};

fn default_limit() -> usize {
    100
}

/// Skip/limit pagination parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct PageParams {
    /// Number of items to skip.
    #[serde(default)]
    pub skip: usize,
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

/// Plain message response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Account Models
// =============================================================================

/// Request to register a new account.
///
/// All secret-derived material is computed client-side; the server receives
/// only the verifier hash and the two salts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Desired username (globally unique, case-insensitive)
    pub username: String,
    /// Login verifier hash derived from the master password
    pub login_password_hash: String,
    /// Salt used for the login verifier derivation
    pub login_salt: String,
    /// Salt used for client-side encryption key derivation
    pub encryption_salt: String,
}

/// Request to log in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    /// Login verifier hash derived client-side
    pub login_password_hash: String,
}

/// Issued bearer token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
}

/// Salts needed by a client to derive its keys before login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSalts {
    pub login_salt: String,
    pub encryption_salt: String,
}

/// Public view of a user account. Never carries verifier material or key
/// halves.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            roles: user.roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Request to update the caller's avatar.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAvatarRequest {
    pub avatar_url: String,
}

/// Request to set the caller's asymmetric key pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateKeysRequest {
    /// Public key other users wrap shared key material against
    pub public_key: String,
    /// The private key, encrypted client-side; opaque to the server
    pub encrypted_private_key: String,
}

/// Aggregate counts for the caller's dashboard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserStatsResponse {
    pub own_credentials_count: usize,
    pub shared_credentials_count: usize,
    pub secure_notes_count: usize,
    pub categories_count: usize,
}

// =============================================================================
// Credential Models
// =============================================================================

/// Query parameters for credential listings.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CredentialListParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Sort key (`created_at` or `title`).
    pub sort_by: Option<SortBy>,
    /// Sort direction (`asc` or `desc`).
    pub sort_direction: Option<SortDirection>,
    /// Restrict to credentials tagged with this category id.
    pub filter_category: Option<String>,
}

/// Request to create a credential.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCredentialRequest {
    /// Display title
    pub title: String,
    /// Optional site URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Account username at the target site
    pub username: String,
    /// Ciphertext blob, encrypted client-side
    pub encrypted_data: String,
    /// Initialization vector for the blob
    pub encryption_iv: String,
    /// Category tags (ids owned by the caller)
    #[serde(default)]
    pub category_ids: Vec<String>,
}

/// Partial update for a credential.
///
/// Absent field = unchanged; `"url": null` clears the URL; a provided
/// `category_ids` list replaces the whole tag set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCredentialRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        with = "serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_iv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<String>>,
}

/// A credential as returned to its owner, with resolved category tags.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CredentialResponse {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub username: String,
    pub encrypted_data: String,
    pub encryption_iv: String,
    pub categories: Vec<CategoryResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialResponse {
    /// Join a stored credential with its resolved categories.
    pub fn from_stored(credential: StoredCredential, categories: Vec<StoredCategory>) -> Self {
        Self {
            id: credential.id,
            title: credential.title,
            url: credential.url,
            username: credential.username,
            encrypted_data: credential.encrypted_data,
            encryption_iv: credential.encryption_iv,
            categories: categories.into_iter().map(Into::into).collect(),
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        }
    }
}

/// Page of credentials plus the total match count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CredentialListResponse {
    pub items: Vec<CredentialResponse>,
    pub total: usize,
}

// =============================================================================
// Secure Note Models
// =============================================================================

/// Request to create a secure note. Title and content are both ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSecureNoteRequest {
    pub encrypted_title: String,
    pub encrypted_content: String,
    pub encryption_iv: String,
}

/// Partial update for a secure note. Absent field = unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateSecureNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_iv: Option<String>,
}

/// A secure note as returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SecureNoteResponse {
    pub id: String,
    pub encrypted_title: String,
    pub encrypted_content: String,
    pub encryption_iv: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredSecureNote> for SecureNoteResponse {
    fn from(note: StoredSecureNote) -> Self {
        Self {
            id: note.id,
            encrypted_title: note.encrypted_title,
            encrypted_content: note.encrypted_content,
            encryption_iv: note.encryption_iv,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Page of secure notes plus the total count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SecureNoteListResponse {
    pub items: Vec<SecureNoteResponse>,
    pub total: usize,
}

// =============================================================================
// Category Models
// =============================================================================

/// Request to create a category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    /// Display color (`#RRGGBB`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

/// Partial update for a category. `"color_hex": null` clears the color.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        with = "serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub color_hex: Option<Option<String>>,
}

/// A category as returned to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredCategory> for CategoryResponse {
    fn from(category: StoredCategory) -> Self {
        Self {
            id: category.id,
            name: category.name,
            color_hex: category.color_hex,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

// =============================================================================
// Sharing Models
// =============================================================================

/// Request to share a credential with one recipient.
///
/// The key material arrives already wrapped for the recipient's public key;
/// the multi-step wrapping happens entirely on the client before this
/// single call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateShareRequest {
    /// The credential to share (must be owned by the caller)
    pub credential_id: String,
    /// The receiving user
    pub recipient_user_id: String,
    /// Credential's symmetric key, wrapped for the recipient's public key
    pub encrypted_sharing_key: String,
    /// Credential payload re-wrapped for the recipient
    pub encrypted_shared_data: String,
    /// Initialization vector for the re-wrapped payload
    pub sharing_iv: String,
}

/// Replacement key material for an existing share.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateShareRequest {
    pub encrypted_sharing_key: String,
    pub encrypted_shared_data: String,
    pub sharing_iv: String,
}

/// A share grant with live display metadata.
///
/// `credential_title` and the usernames are joined at read time (the owner
/// may have renamed the credential after sharing); the ciphertext payload
/// is the one frozen at share time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharedCredentialResponse {
    pub id: String,
    pub credential_id: String,
    pub owner_user_id: String,
    pub recipient_user_id: String,
    pub encrypted_sharing_key: String,
    pub encrypted_shared_data: String,
    pub sharing_iv: String,
    pub created_at: DateTime<Utc>,
    /// Current credential title, joined live
    pub credential_title: String,
    /// Granting owner's username, joined live
    pub owner_username: String,
    /// Receiving user's username, joined live
    pub recipient_username: String,
}

impl SharedCredentialResponse {
    /// Join a stored share with live display metadata.
    pub fn from_stored(
        share: StoredShare,
        credential_title: String,
        owner_username: String,
        recipient_username: String,
    ) -> Self {
        Self {
            id: share.id,
            credential_id: share.credential_id,
            owner_user_id: share.owner_user_id,
            recipient_user_id: share.recipient_user_id,
            encrypted_sharing_key: share.encrypted_sharing_key,
            encrypted_shared_data: share.encrypted_shared_data,
            sharing_iv: share.sharing_iv,
            created_at: share.created_at,
            credential_title,
            owner_username,
            recipient_username,
        }
    }
}

/// Page of shares plus the total count.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SharedCredentialListResponse {
    pub items: Vec<SharedCredentialResponse>,
    pub total: usize,
}

/// A recipient of one credential.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SharedUserResponse {
    pub id: String,
    pub username: String,
    /// When the grant was issued
    pub shared_at: DateTime<Utc>,
}

/// Query parameter for directory search.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct UserSearchParams {
    /// Substring to match against usernames (minimum 2 characters).
    pub q: String,
}

// =============================================================================
// Admin Models
// =============================================================================

/// Query parameters for the admin audit log view.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AuditLogParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Restrict to entries by this actor.
    pub user_id: Option<String>,
}
