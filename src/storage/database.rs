// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Embedded vault database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized StoredUser
//! - `username_index`: lowercase username → user_id
//! - `credentials`: credential_id → serialized StoredCredential
//! - `secure_notes`: note_id → serialized StoredSecureNote
//! - `categories`: category_id → serialized StoredCategory
//! - `category_name_index`: composite key (owner_id|lowercase_name) → category_id
//! - `shares`: share_id → serialized StoredShare
//! - `share_pair_index`: composite key (credential_id|recipient_id) → share_id
//! - `audit_log`: sequence number → serialized AuditLogEntry
//!
//! The index tables are the uniqueness authority: a check-and-insert against
//! an index happens inside a single write transaction, so two concurrent
//! writers for the same key cannot both succeed.

use std::path::Path;

use redb::{Database, ReadTransaction, ReadableDatabase, TableDefinition, WriteTransaction};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary user table: user_id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Username uniqueness index: lowercase username → user_id.
pub(crate) const USERNAME_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("username_index");

/// Credential table: credential_id → serialized StoredCredential.
pub(crate) const CREDENTIALS: TableDefinition<&str, &[u8]> = TableDefinition::new("credentials");

/// Secure note table: note_id → serialized StoredSecureNote.
pub(crate) const SECURE_NOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("secure_notes");

/// Category table: category_id → serialized StoredCategory.
pub(crate) const CATEGORIES: TableDefinition<&str, &[u8]> = TableDefinition::new("categories");

/// Category name uniqueness index: `owner_id|lowercase_name` → category_id.
pub(crate) const CATEGORY_NAME_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("category_name_index");

/// Share table: share_id → serialized StoredShare.
pub(crate) const SHARES: TableDefinition<&str, &[u8]> = TableDefinition::new("shares");

/// Share uniqueness index: `credential_id|recipient_user_id` → share_id.
/// At most one active share exists per (credential, recipient) pair.
pub(crate) const SHARE_PAIR_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("share_pair_index");

/// Append-only audit log: sequence number → serialized AuditLogEntry.
pub(crate) const AUDIT_LOG: TableDefinition<u64, &[u8]> = TableDefinition::new("audit_log");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource absent, or present but owned by someone else. The two cases
    /// are deliberately indistinguishable so non-owners cannot probe for
    /// existence.
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    /// An active share already exists for this (credential, recipient) pair.
    /// Distinct from `NotFound` so callers can report "already shared"
    /// instead of a generic failure.
    #[error("credential already shared with this recipient")]
    AlreadyShared,

    /// The recipient exists but has never registered a public key, so no
    /// key material can be wrapped for them.
    #[error("recipient has no registered public key")]
    RecipientWithoutKey,

    /// A share whose recipient is its own owner is meaningless.
    #[error("cannot share a credential with its owner")]
    SelfShare,
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Build the composite key for the share_pair_index table.
///
/// Format: `credential_id|recipient_user_id`. Ids are UUIDs, which never
/// contain the separator.
pub(crate) fn share_pair_key(credential_id: &str, recipient_user_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(credential_id.len() + 1 + recipient_user_id.len());
    key.extend_from_slice(credential_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(recipient_user_id.as_bytes());
    key
}

/// Build the prefix for range-scanning all pair-index entries of a credential.
pub(crate) fn share_pair_prefix(credential_id: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(credential_id.len() + 1);
    prefix.extend_from_slice(credential_id.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a pair-index prefix scan.
pub(crate) fn share_pair_prefix_end(credential_id: &str) -> Vec<u8> {
    let mut end = share_pair_prefix(credential_id);
    end.extend_from_slice(&[0xFF; 8]);
    end
}

/// Build the composite key for the category_name_index table.
///
/// Format: `owner_id|lowercase_name`.
pub(crate) fn category_name_key(owner_user_id: &str, name: &str) -> Vec<u8> {
    let lowered = name.to_lowercase();
    let mut key = Vec::with_capacity(owner_user_id.len() + 1 + lowered.len());
    key.extend_from_slice(owner_user_id.as_bytes());
    key.push(b'|');
    key.extend_from_slice(lowered.as_bytes());
    key
}

// =============================================================================
// VaultDatabase
// =============================================================================

/// Handle to the embedded vault database.
///
/// Every repository operation opens its own scoped transaction through this
/// handle and commits (or drops) it on all exit paths; there is no
/// process-wide mutable session.
pub struct VaultDatabase {
    db: Database,
}

impl VaultDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAME_INDEX)?;
            let _ = write_txn.open_table(CREDENTIALS)?;
            let _ = write_txn.open_table(SECURE_NOTES)?;
            let _ = write_txn.open_table(CATEGORIES)?;
            let _ = write_txn.open_table(CATEGORY_NAME_INDEX)?;
            let _ = write_txn.open_table(SHARES)?;
            let _ = write_txn.open_table(SHARE_PAIR_INDEX)?;
            let _ = write_txn.open_table(AUDIT_LOG)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Begin a read-only transaction.
    pub(crate) fn begin_read(&self) -> StoreResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction. redb serializes writers, so a
    /// check-and-insert inside one transaction is atomic with respect to
    /// concurrent attempts on the same key.
    pub(crate) fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::ReadableTable;
    use tempfile::TempDir;

    fn test_database() -> (TempDir, VaultDatabase) {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        (temp, db)
    }

    #[test]
    fn open_creates_all_tables() {
        let (_temp, db) = test_database();
        let read = db.begin_read().unwrap();
        // Opening any table on a fresh database must not fail.
        let _ = read.open_table(USERS).unwrap();
        let _ = read.open_table(SHARES).unwrap();
        let _ = read.open_table(SHARE_PAIR_INDEX).unwrap();
        let _ = read.open_table(AUDIT_LOG).unwrap();
    }

    #[test]
    fn open_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vault.redb");
        {
            let db = VaultDatabase::open(&path).unwrap();
            let txn = db.begin_write().unwrap();
            {
                let mut table = txn.open_table(USERNAME_INDEX).unwrap();
                table.insert("alice", "user-1").unwrap();
            }
            txn.commit().unwrap();
        }

        // Re-opening keeps the data intact.
        let db = VaultDatabase::open(&path).unwrap();
        let read = db.begin_read().unwrap();
        let table = read.open_table(USERNAME_INDEX).unwrap();
        assert_eq!(table.get("alice").unwrap().unwrap().value(), "user-1");
    }

    #[test]
    fn share_pair_key_layout() {
        let key = share_pair_key("cred-1", "user-2");
        assert_eq!(key, b"cred-1|user-2".to_vec());

        let prefix = share_pair_prefix("cred-1");
        assert!(key.starts_with(&prefix));
        assert!(key < share_pair_prefix_end("cred-1"));
        // A different credential's key never matches the prefix.
        assert!(!share_pair_key("cred-2", "user-2").starts_with(&prefix));
    }

    #[test]
    fn category_name_key_is_case_insensitive() {
        assert_eq!(
            category_name_key("user-1", "Work"),
            category_name_key("user-1", "work")
        );
        assert_ne!(
            category_name_key("user-1", "work"),
            category_name_key("user-2", "work")
        );
    }
}
