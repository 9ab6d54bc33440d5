// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! User repository: the identity directory.
//!
//! Stores the password-verification material (hash + salts), the user's
//! asymmetric public key, and the user's own private key encrypted under a
//! key only the user can derive. The server persists the encrypted private
//! key but can never use it.
//!
//! ## Security
//!
//! - `login_password_hash` only proves knowledge of the master password;
//!   the plaintext password never reaches the server
//! - `encryption_salt` feeds client-side key derivation and is opaque here
//! - `public_key`, once set, is the only key other users may wrap shared
//!   key material against

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;

use super::super::database::{USERNAME_INDEX, USERS};
use super::super::{StoreError, StoreResult, VaultDatabase};

/// Directory search never returns results for queries shorter than this.
pub const SEARCH_MIN_QUERY_LEN: usize = 2;

/// Hard cap on directory search results, to prevent enumeration abuse.
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// User record stored in the vault database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Globally unique username (case-insensitive)
    pub username: String,
    /// Client-computed verifier hash; never a plaintext password
    pub login_password_hash: String,
    /// Salt for the login verifier derivation
    pub login_salt: String,
    /// Salt for client-side encryption key derivation (opaque to the server)
    pub encryption_salt: String,
    /// Optional avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Asymmetric public key other users encrypt shared key material against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// The user's private key, encrypted client-side. Stored, never used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_private_key: Option<String>,
    /// Roles embedded into bearer tokens at login
    pub roles: Vec<Role>,
    /// When the user registered
    pub created_at: DateTime<Utc>,
    /// Last profile change
    pub updated_at: DateTime<Utc>,
}

/// Minimal directory listing entry returned by username search.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// User id
    pub id: String,
    /// Username
    pub username: String,
}

/// A user's public key, resolved for sharing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PublicKeyEntry {
    /// User id
    pub id: String,
    /// Username
    pub username: String,
    /// The registered public key
    pub public_key: String,
}

/// Repository for user operations.
pub struct UserRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Create a new user.
    ///
    /// The username uniqueness check and the insert run in one write
    /// transaction; the second of two concurrent registrations for the same
    /// username observes the index entry and fails.
    ///
    /// # Errors
    /// `StoreError::AlreadyExists` if the username is taken.
    pub fn create(&self, user: &StoredUser) -> StoreResult<()> {
        let username_key = user.username.to_lowercase();
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(USERNAME_INDEX)?;
            if index.get(username_key.as_str())?.is_some() {
                return Err(StoreError::AlreadyExists(
                    "Username already registered".to_string(),
                ));
            }
            index.insert(username_key.as_str(), user.id.as_str())?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StoreResult<StoredUser> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(user_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound("User".to_string())),
        }
    }

    /// Look up a user by username (case-insensitive). Returns `None` when no
    /// such user exists.
    pub fn find_by_username(&self, username: &str) -> StoreResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERNAME_INDEX)?;
        let user_id = match index.get(username.to_lowercase().as_str())? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Overwrite an existing user record. The username is immutable; callers
    /// must not change it (the username index is not rewritten here).
    pub fn update(&self, user: &StoredUser) -> StoreResult<()> {
        let json = serde_json::to_vec(user)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            if users.get(user.id.as_str())?.is_none() {
                return Err(StoreError::NotFound("User".to_string()));
            }
            users.insert(user.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Set the user's asymmetric key pair: the public key plus the private
    /// key encrypted client-side.
    pub fn update_keys(
        &self,
        user_id: &str,
        public_key: &str,
        encrypted_private_key: &str,
    ) -> StoreResult<StoredUser> {
        let mut user = self.get(user_id)?;
        user.public_key = Some(public_key.to_string());
        user.encrypted_private_key = Some(encrypted_private_key.to_string());
        user.updated_at = Utc::now();
        self.update(&user)?;
        Ok(user)
    }

    /// Update the user's avatar URL.
    pub fn update_avatar(&self, user_id: &str, avatar_url: &str) -> StoreResult<StoredUser> {
        let mut user = self.get(user_id)?;
        user.avatar_url = Some(avatar_url.to_string());
        user.updated_at = Utc::now();
        self.update(&user)?;
        Ok(user)
    }

    /// Resolve a user's public key for sharing.
    ///
    /// # Errors
    /// `StoreError::NotFound` when the user does not exist or has never
    /// registered a public key.
    pub fn public_key(&self, user_id: &str) -> StoreResult<PublicKeyEntry> {
        let user = match self.get(user_id) {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                return Err(StoreError::NotFound("User public key".to_string()))
            }
            Err(e) => return Err(e),
        };

        match user.public_key {
            Some(public_key) => Ok(PublicKeyEntry {
                id: user.id,
                username: user.username,
                public_key,
            }),
            None => Err(StoreError::NotFound("User public key".to_string())),
        }
    }

    /// Case-insensitive substring search over usernames.
    ///
    /// Excludes the caller, caps results at [`SEARCH_RESULT_LIMIT`], and
    /// fails closed (empty result) for queries shorter than
    /// [`SEARCH_MIN_QUERY_LEN`].
    pub fn search(&self, query: &str, exclude_user_id: &str) -> StoreResult<Vec<DirectoryEntry>> {
        if query.len() < SEARCH_MIN_QUERY_LEN {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();

        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;

        let mut matches = Vec::new();
        for entry in users.iter()? {
            let (_, value) = entry?;
            let user: StoredUser = serde_json::from_slice(value.value())?;
            if user.id != exclude_user_id && user.username.to_lowercase().contains(&needle) {
                matches.push(DirectoryEntry {
                    id: user.id,
                    username: user.username,
                });
            }
        }

        matches.sort_by(|a, b| a.username.cmp(&b.username));
        matches.truncate(SEARCH_RESULT_LIMIT);
        Ok(matches)
    }

    /// List all users ordered by registration time (admin view).
    pub fn list(&self, skip: usize, limit: usize) -> StoreResult<Vec<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;

        let mut all = Vec::new();
        for entry in users.iter()? {
            let (_, value) = entry?;
            let user: StoredUser = serde_json::from_slice(value.value())?;
            all.push(user);
        }

        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all.into_iter().skip(skip).take(limit).collect())
    }
}
