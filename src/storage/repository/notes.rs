// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Secure note repository.
//!
//! Unlike credentials, secure notes carry no plaintext metadata at all:
//! title and content are both ciphertext.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::SECURE_NOTES;
use super::super::ownership::{OwnedResource, OwnershipCheck};
use super::super::{StoreResult, VaultDatabase};

/// Secure note record stored in the vault database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSecureNote {
    /// Unique note identifier (UUID)
    pub id: String,
    /// Owner's user id
    pub owner_user_id: String,
    /// Encrypted title
    pub encrypted_title: String,
    /// Encrypted content
    pub encrypted_content: String,
    /// Initialization vector
    pub encryption_iv: String,
    /// When the note was created
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for StoredSecureNote {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn resource_name() -> &'static str {
        "Secure note"
    }
}

/// Fields for a new secure note.
#[derive(Debug, Clone)]
pub struct NewSecureNote {
    pub encrypted_title: String,
    pub encrypted_content: String,
    pub encryption_iv: String,
}

/// Partial update for a secure note. Absent field = unchanged.
#[derive(Debug, Clone, Default)]
pub struct SecureNoteChanges {
    pub encrypted_title: Option<String>,
    pub encrypted_content: Option<String>,
    pub encryption_iv: Option<String>,
}

/// Repository for secure note operations.
pub struct SecureNoteRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> SecureNoteRepository<'a> {
    /// Create a new SecureNoteRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Create a secure note for `owner_user_id`.
    pub fn create(&self, owner_user_id: &str, new: NewSecureNote) -> StoreResult<StoredSecureNote> {
        let now = Utc::now();
        let note = StoredSecureNote {
            id: uuid::Uuid::new_v4().to_string(),
            owner_user_id: owner_user_id.to_string(),
            encrypted_title: new.encrypted_title,
            encrypted_content: new.encrypted_content,
            encryption_iv: new.encryption_iv,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_vec(&note)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SECURE_NOTES)?;
            table.insert(note.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(note)
    }

    /// Get a note, enforcing ownership.
    pub fn get_owned(&self, note_id: &str, owner_user_id: &str) -> StoreResult<StoredSecureNote> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SECURE_NOTES)?;
        let found = match table.get(note_id)? {
            Some(value) => Some(serde_json::from_slice::<StoredSecureNote>(value.value())?),
            None => None,
        };
        found.verify_owned_by(owner_user_id)
    }

    /// List an owner's notes newest-first, with the total match count.
    pub fn list(
        &self,
        owner_user_id: &str,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<StoredSecureNote>, usize)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SECURE_NOTES)?;

        let mut matches = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let note: StoredSecureNote = serde_json::from_slice(value.value())?;
            if note.owner_user_id == owner_user_id {
                matches.push(note);
            }
        }
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matches.len();
        let page = matches.into_iter().skip(skip).take(limit).collect();
        Ok((page, total))
    }

    /// Apply a partial update, enforcing ownership.
    pub fn update(
        &self,
        note_id: &str,
        owner_user_id: &str,
        changes: SecureNoteChanges,
    ) -> StoreResult<StoredSecureNote> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(SECURE_NOTES)?;
            let found = match table.get(note_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredSecureNote>(value.value())?),
                None => None,
            };
            let mut note = found.verify_owned_by(owner_user_id)?;

            if let Some(encrypted_title) = changes.encrypted_title {
                note.encrypted_title = encrypted_title;
            }
            if let Some(encrypted_content) = changes.encrypted_content {
                note.encrypted_content = encrypted_content;
            }
            if let Some(encryption_iv) = changes.encryption_iv {
                note.encryption_iv = encryption_iv;
            }
            note.updated_at = Utc::now();

            let json = serde_json::to_vec(&note)?;
            table.insert(note_id, json.as_slice())?;
            note
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a note, enforcing ownership.
    pub fn delete(&self, note_id: &str, owner_user_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SECURE_NOTES)?;
            let found = match table.get(note_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredSecureNote>(value.value())?),
                None => None,
            };
            found.verify_owned_by(owner_user_id)?;
            table.remove(note_id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Number of notes owned by a user.
    pub fn count_by_owner(&self, owner_user_id: &str) -> StoreResult<usize> {
        let (_, total) = self.list(owner_user_id, 0, 0)?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;
    use tempfile::TempDir;

    fn test_database() -> (TempDir, VaultDatabase) {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        (temp, db)
    }

    fn test_note(title: &str) -> NewSecureNote {
        NewSecureNote {
            encrypted_title: title.to_string(),
            encrypted_content: "encrypted-content".to_string(),
            encryption_iv: "iv".to_string(),
        }
    }

    #[test]
    fn create_get_update_delete_roundtrip() {
        let (_temp, db) = test_database();
        let repo = SecureNoteRepository::new(&db);

        let note = repo.create("user-1", test_note("enc-title")).unwrap();
        assert_eq!(repo.get_owned(&note.id, "user-1").unwrap(), note);

        let updated = repo
            .update(
                &note.id,
                "user-1",
                SecureNoteChanges {
                    encrypted_content: Some("rewrapped".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.encrypted_content, "rewrapped");
        assert_eq!(updated.encrypted_title, "enc-title");

        repo.delete(&note.id, "user-1").unwrap();
        assert!(repo.get_owned(&note.id, "user-1").is_err());
    }

    #[test]
    fn ownership_is_enforced_on_every_path() {
        let (_temp, db) = test_database();
        let repo = SecureNoteRepository::new(&db);

        let note = repo.create("user-1", test_note("enc-title")).unwrap();

        assert!(matches!(
            repo.get_owned(&note.id, "user-2"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            repo.update(&note.id, "user-2", SecureNoteChanges::default()),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete(&note.id, "user-2"),
            Err(StoreError::NotFound(_))
        ));
        assert!(repo.get_owned(&note.id, "user-1").is_ok());
    }

    #[test]
    fn list_pages_and_counts() {
        let (_temp, db) = test_database();
        let repo = SecureNoteRepository::new(&db);

        for i in 0..5 {
            repo.create("user-1", test_note(&format!("note-{i}"))).unwrap();
        }
        repo.create("user-2", test_note("other")).unwrap();

        let (page, total) = repo.list("user-1", 2, 2).unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);

        assert_eq!(repo.count_by_owner("user-1").unwrap(), 5);
        assert_eq!(repo.count_by_owner("user-2").unwrap(), 1);
    }
}
