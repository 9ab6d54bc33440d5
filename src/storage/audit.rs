// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Audit logging for security-sensitive operations.
//!
//! Entries are appended to a dedicated table with a monotonically increasing
//! sequence number. There is no update or delete path: the log is immutable
//! once written. Appends are best-effort from the caller's point of view —
//! a failed audit write must never roll back or mask the operation it
//! accompanies.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::AUDIT_LOG;
use super::{StoreResult, VaultDatabase};

/// Types of auditable actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    // Account events
    UserRegistered,
    LoginSuccess,
    LoginFailed,
    AvatarUpdated,
    KeysUpdated,

    // Credential events
    CredentialCreated,
    CredentialUpdated,
    CredentialDeleted,

    // Secure note events
    NoteCreated,
    NoteUpdated,
    NoteDeleted,

    // Category events
    CategoryCreated,
    CategoryUpdated,
    CategoryDeleted,

    // Sharing events
    ShareCreated,
    ShareUpdated,
    ShareRevoked,

    // Admin events
    AdminViewUsers,
    AdminViewAuditLogs,
}

/// An audit log entry as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntry {
    /// Append sequence number.
    pub id: u64,
    /// User who triggered the action. `None` for anonymous events such as
    /// failed logins.
    pub user_id: Option<String>,
    /// What happened.
    pub action: AuditAction,
    /// Affected resource type (credential, share, ...).
    pub resource_type: Option<String>,
    /// Affected resource id.
    pub resource_id: Option<String>,
    /// Additional structured context.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

/// A not-yet-persisted audit entry. Sequence number and timestamp are
/// assigned at append time.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    action: AuditAction,
    user_id: Option<String>,
    resource_type: Option<String>,
    resource_id: Option<String>,
    details: Option<serde_json::Value>,
}

impl NewAuditEntry {
    /// Create a new audit entry.
    pub fn new(action: AuditAction) -> Self {
        Self {
            action,
            user_id: None,
            resource_type: None,
            resource_id: None,
            details: None,
        }
    }

    /// Set the acting user.
    pub fn with_actor(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the affected resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add structured context.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Repository for the append-only audit log.
pub struct AuditRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> AuditRepository<'a> {
    /// Create a new AuditRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Append an entry and return it with its sequence number.
    pub fn append(&self, entry: NewAuditEntry) -> StoreResult<AuditLogEntry> {
        let write_txn = self.db.begin_write()?;
        let persisted = {
            let mut table = write_txn.open_table(AUDIT_LOG)?;
            let next_id = match table.last()? {
                Some((key, _)) => key.value() + 1,
                None => 1,
            };
            let persisted = AuditLogEntry {
                id: next_id,
                user_id: entry.user_id,
                action: entry.action,
                resource_type: entry.resource_type,
                resource_id: entry.resource_id,
                details: entry.details,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&persisted)?;
            table.insert(next_id, json.as_slice())?;
            persisted
        };
        write_txn.commit()?;
        Ok(persisted)
    }

    /// List entries newest-first, optionally filtered by actor.
    pub fn list(
        &self,
        skip: usize,
        limit: usize,
        user_id: Option<&str>,
    ) -> StoreResult<Vec<AuditLogEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOG)?;

        let mut entries = Vec::new();
        for item in table.iter()?.rev() {
            let (_, value) = item?;
            let entry: AuditLogEntry = serde_json::from_slice(value.value())?;
            if let Some(wanted) = user_id {
                if entry.user_id.as_deref() != Some(wanted) {
                    continue;
                }
            }
            entries.push(entry);
            if entries.len() >= skip + limit {
                break;
            }
        }

        Ok(entries.into_iter().skip(skip).collect())
    }
}

/// Helper macro for best-effort audit logging.
///
/// A failed append is reported through tracing and otherwise ignored; the
/// primary operation's outcome is never affected.
#[macro_export]
macro_rules! audit_log {
    ($db:expr, $entry:expr) => {{
        let repo = $crate::storage::AuditRepository::new($db);
        if let Err(error) = repo.append($entry) {
            tracing::warn!(%error, "failed to append audit entry");
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_database() -> (TempDir, VaultDatabase) {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        (temp, db)
    }

    #[test]
    fn append_assigns_increasing_sequence_numbers() {
        let (_temp, db) = test_database();
        let repo = AuditRepository::new(&db);

        let first = repo
            .append(NewAuditEntry::new(AuditAction::UserRegistered).with_actor("user-1"))
            .unwrap();
        let second = repo
            .append(
                NewAuditEntry::new(AuditAction::CredentialCreated)
                    .with_actor("user-1")
                    .with_resource("credential", "cred-1"),
            )
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.resource_type.as_deref(), Some("credential"));
    }

    #[test]
    fn anonymous_entries_carry_no_actor() {
        let (_temp, db) = test_database();
        let repo = AuditRepository::new(&db);

        let entry = repo
            .append(
                NewAuditEntry::new(AuditAction::LoginFailed)
                    .with_details(serde_json::json!({"username": "alice"})),
            )
            .unwrap();

        assert_eq!(entry.user_id, None);
        assert_eq!(entry.details.unwrap()["username"], "alice");
    }

    #[test]
    fn list_is_newest_first_and_paginates() {
        let (_temp, db) = test_database();
        let repo = AuditRepository::new(&db);

        for i in 0..5 {
            repo.append(
                NewAuditEntry::new(AuditAction::CredentialCreated)
                    .with_actor(format!("user-{}", i % 2)),
            )
            .unwrap();
        }

        let all = repo.list(0, 100, None).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].id, 5);
        assert_eq!(all[4].id, 1);

        let page = repo.list(1, 2, None).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, 4);

        let filtered = repo.list(0, 100, Some("user-0")).unwrap();
        assert_eq!(filtered.len(), 3);
        assert!(filtered.iter().all(|e| e.user_id.as_deref() == Some("user-0")));
    }

    #[test]
    fn action_serializes_in_upper_snake_case() {
        let json = serde_json::to_string(&AuditAction::UserRegistered).unwrap();
        assert_eq!(json, r#""USER_REGISTERED""#);

        let json = serde_json::to_string(&AuditAction::AdminViewAuditLogs).unwrap();
        assert_eq!(json, r#""ADMIN_VIEW_AUDIT_LOGS""#);
    }
}
