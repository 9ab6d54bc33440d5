// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Share ledger: one row per (credential, owner, recipient) grant.
//!
//! A share carries the credential's symmetric key wrapped for the
//! recipient's public key, plus the payload re-wrapped for the recipient.
//! Both are produced client-side before the single creation call arrives;
//! the server never holds usable key material.
//!
//! ## Invariants
//!
//! - At most one active share per (credential, recipient) pair; the
//!   share_pair_index table inside the write transaction is the authority
//! - Only the current owner of the credential may create, rewrap, or revoke
//!   a share; ownership is re-validated at call time, never cached
//! - The recipient must exist and have a registered public key
//! - A credential is never shared with its own owner

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{
    share_pair_key, share_pair_prefix, share_pair_prefix_end, CREDENTIALS, SHARES,
    SHARE_PAIR_INDEX, USERS,
};
use super::super::ownership::{OwnedResource, OwnershipCheck};
use super::super::{StoreError, StoreResult, VaultDatabase};
use super::credentials::StoredCredential;
use super::users::StoredUser;

/// Share record stored in the vault database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredShare {
    /// Unique share identifier (UUID)
    pub id: String,
    /// The shared credential
    pub credential_id: String,
    /// The granting owner
    pub owner_user_id: String,
    /// The receiving user
    pub recipient_user_id: String,
    /// Credential's symmetric key, wrapped for the recipient's public key
    pub encrypted_sharing_key: String,
    /// Credential payload re-wrapped for the recipient (frozen at share time)
    pub encrypted_shared_data: String,
    /// Initialization vector for the re-wrapped payload
    pub sharing_iv: String,
    /// When the grant was issued
    pub created_at: DateTime<Utc>,
}

impl OwnedResource for StoredShare {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn resource_name() -> &'static str {
        "Shared credential"
    }
}

/// Fields for a new share.
#[derive(Debug, Clone)]
pub struct NewShare {
    pub credential_id: String,
    pub recipient_user_id: String,
    pub encrypted_sharing_key: String,
    pub encrypted_shared_data: String,
    pub sharing_iv: String,
}

/// Replacement key material for an existing share (e.g. after the owner
/// rotates keys). The share's identity and pair key stay unchanged.
#[derive(Debug, Clone)]
pub struct ShareRewrap {
    pub encrypted_sharing_key: String,
    pub encrypted_shared_data: String,
    pub sharing_iv: String,
}

/// Repository for share ledger operations.
pub struct ShareRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> ShareRepository<'a> {
    /// Create a new ShareRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Issue a share grant.
    ///
    /// All validation happens inside one write transaction, so the
    /// uniqueness check and the insert are atomic with respect to
    /// concurrent attempts for the same (credential, recipient) pair.
    ///
    /// # Errors
    /// - `NotFound` — credential absent or not owned by the caller
    ///   (indistinguishable by design), or recipient absent
    /// - `SelfShare` — recipient is the owner
    /// - `RecipientWithoutKey` — recipient has no public key to wrap against
    /// - `AlreadyShared` — an active share for the pair exists
    pub fn create(&self, owner_user_id: &str, new: NewShare) -> StoreResult<StoredShare> {
        let share = StoredShare {
            id: uuid::Uuid::new_v4().to_string(),
            credential_id: new.credential_id,
            owner_user_id: owner_user_id.to_string(),
            recipient_user_id: new.recipient_user_id,
            encrypted_sharing_key: new.encrypted_sharing_key,
            encrypted_shared_data: new.encrypted_shared_data,
            sharing_iv: new.sharing_iv,
            created_at: Utc::now(),
        };

        let write_txn = self.db.begin_write()?;
        {
            // Ownership is re-validated here, against the current row.
            let credentials = write_txn.open_table(CREDENTIALS)?;
            let credential = match credentials.get(share.credential_id.as_str())? {
                Some(value) => Some(serde_json::from_slice::<StoredCredential>(value.value())?),
                None => None,
            };
            credential.verify_owned_by(owner_user_id)?;

            if share.recipient_user_id == owner_user_id {
                return Err(StoreError::SelfShare);
            }

            let users = write_txn.open_table(USERS)?;
            let recipient = match users.get(share.recipient_user_id.as_str())? {
                Some(value) => serde_json::from_slice::<StoredUser>(value.value())?,
                None => return Err(StoreError::NotFound("Recipient".to_string())),
            };
            if recipient.public_key.is_none() {
                return Err(StoreError::RecipientWithoutKey);
            }

            let pair_key = share_pair_key(&share.credential_id, &share.recipient_user_id);
            let mut pair_index = write_txn.open_table(SHARE_PAIR_INDEX)?;
            if pair_index.get(pair_key.as_slice())?.is_some() {
                return Err(StoreError::AlreadyShared);
            }
            pair_index.insert(pair_key.as_slice(), share.id.as_str())?;

            let json = serde_json::to_vec(&share)?;
            let mut shares = write_txn.open_table(SHARES)?;
            shares.insert(share.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(share)
    }

    /// List shares received by a user, newest-first, with the total count.
    pub fn list_received(
        &self,
        user_id: &str,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<StoredShare>, usize)> {
        self.list_filtered(|share| share.recipient_user_id == user_id, skip, limit)
    }

    /// List shares issued by a user, newest-first, with the total count.
    pub fn list_owned(
        &self,
        user_id: &str,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<StoredShare>, usize)> {
        self.list_filtered(|share| share.owner_user_id == user_id, skip, limit)
    }

    fn list_filtered(
        &self,
        keep: impl Fn(&StoredShare) -> bool,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<StoredShare>, usize)> {
        let read_txn = self.db.begin_read()?;
        let shares = read_txn.open_table(SHARES)?;

        let mut matches = Vec::new();
        for entry in shares.iter()? {
            let (_, value) = entry?;
            let share: StoredShare = serde_json::from_slice(value.value())?;
            if keep(&share) {
                matches.push(share);
            }
        }
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matches.len();
        let page = matches.into_iter().skip(skip).take(limit).collect();
        Ok((page, total))
    }

    /// Enumerate the recipients of one credential. Owner only: a caller who
    /// does not own the credential gets the same `NotFound` as for a missing
    /// credential.
    pub fn list_for_credential(
        &self,
        credential_id: &str,
        caller_user_id: &str,
    ) -> StoreResult<Vec<StoredShare>> {
        let read_txn = self.db.begin_read()?;

        let credentials = read_txn.open_table(CREDENTIALS)?;
        let credential = match credentials.get(credential_id)? {
            Some(value) => Some(serde_json::from_slice::<StoredCredential>(value.value())?),
            None => None,
        };
        credential.verify_owned_by(caller_user_id)?;

        let pair_index = read_txn.open_table(SHARE_PAIR_INDEX)?;
        let shares = read_txn.open_table(SHARES)?;

        let prefix = share_pair_prefix(credential_id);
        let prefix_end = share_pair_prefix_end(credential_id);

        let mut matches = Vec::new();
        for entry in pair_index.range(prefix.as_slice()..prefix_end.as_slice())? {
            let entry = entry?;
            let share_id = entry.1.value().to_string();
            if let Some(value) = shares.get(share_id.as_str())? {
                let share: StoredShare = serde_json::from_slice(value.value())?;
                matches.push(share);
            }
        }
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    /// Fetch the share for one (credential, recipient) pair. Owner only; a
    /// caller who is not the issuing owner gets the same `NotFound` as for a
    /// pair that was never shared.
    pub fn get_by_ids(
        &self,
        credential_id: &str,
        recipient_user_id: &str,
        caller_user_id: &str,
    ) -> StoreResult<StoredShare> {
        let pair_key = share_pair_key(credential_id, recipient_user_id);

        let read_txn = self.db.begin_read()?;
        let pair_index = read_txn.open_table(SHARE_PAIR_INDEX)?;
        let share_id = match pair_index.get(pair_key.as_slice())? {
            Some(value) => value.value().to_string(),
            None => return Err(StoreError::NotFound("Shared credential".to_string())),
        };

        let shares = read_txn.open_table(SHARES)?;
        let found = match shares.get(share_id.as_str())? {
            Some(value) => Some(serde_json::from_slice::<StoredShare>(value.value())?),
            None => None,
        };
        found.verify_owned_by(caller_user_id)
    }

    /// Replace the wrapped key material of an existing share. Owner only;
    /// the pair key (credential, recipient) is immutable.
    pub fn update(
        &self,
        credential_id: &str,
        recipient_user_id: &str,
        caller_user_id: &str,
        rewrap: ShareRewrap,
    ) -> StoreResult<StoredShare> {
        let pair_key = share_pair_key(credential_id, recipient_user_id);

        let write_txn = self.db.begin_write()?;
        let updated = {
            let pair_index = write_txn.open_table(SHARE_PAIR_INDEX)?;
            let share_id = match pair_index.get(pair_key.as_slice())? {
                Some(value) => value.value().to_string(),
                None => return Err(StoreError::NotFound("Shared credential".to_string())),
            };

            let mut shares = write_txn.open_table(SHARES)?;
            let found = match shares.get(share_id.as_str())? {
                Some(value) => Some(serde_json::from_slice::<StoredShare>(value.value())?),
                None => None,
            };
            let mut share = found.verify_owned_by(caller_user_id)?;

            share.encrypted_sharing_key = rewrap.encrypted_sharing_key;
            share.encrypted_shared_data = rewrap.encrypted_shared_data;
            share.sharing_iv = rewrap.sharing_iv;

            let json = serde_json::to_vec(&share)?;
            shares.insert(share_id.as_str(), json.as_slice())?;
            share
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Revoke a share by its id. Owner-exclusive: a recipient (or anyone
    /// else) revoking gets `NotFound` and the row persists.
    pub fn revoke(&self, share_id: &str, caller_user_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut shares = write_txn.open_table(SHARES)?;
            let found = match shares.get(share_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredShare>(value.value())?),
                None => None,
            };
            let share = found.verify_owned_by(caller_user_id)?;
            shares.remove(share_id)?;

            let mut pair_index = write_txn.open_table(SHARE_PAIR_INDEX)?;
            pair_index
                .remove(share_pair_key(&share.credential_id, &share.recipient_user_id).as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Revoke the share for one (credential, recipient) pair. Owner-exclusive.
    pub fn revoke_by_ids(
        &self,
        credential_id: &str,
        recipient_user_id: &str,
        caller_user_id: &str,
    ) -> StoreResult<()> {
        let pair_key = share_pair_key(credential_id, recipient_user_id);

        let write_txn = self.db.begin_write()?;
        {
            let mut pair_index = write_txn.open_table(SHARE_PAIR_INDEX)?;
            let share_id = match pair_index.get(pair_key.as_slice())? {
                Some(value) => value.value().to_string(),
                None => return Err(StoreError::NotFound("Shared credential".to_string())),
            };

            let mut shares = write_txn.open_table(SHARES)?;
            let found = match shares.get(share_id.as_str())? {
                Some(value) => Some(serde_json::from_slice::<StoredShare>(value.value())?),
                None => None,
            };
            found.verify_owned_by(caller_user_id)?;

            shares.remove(share_id.as_str())?;
            pair_index.remove(pair_key.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Number of shares received by a user.
    pub fn count_received(&self, user_id: &str) -> StoreResult<usize> {
        let (_, total) = self.list_received(user_id, 0, 0)?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::super::credentials::{CredentialRepository, NewCredential};
    use super::super::users::UserRepository;
    use super::*;
    use crate::auth::Role;
    use tempfile::TempDir;

    fn test_database() -> (TempDir, VaultDatabase) {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        (temp, db)
    }

    fn seed_user(db: &VaultDatabase, id: &str, username: &str, with_key: bool) {
        let now = Utc::now();
        UserRepository::new(db)
            .create(&StoredUser {
                id: id.to_string(),
                username: username.to_string(),
                login_password_hash: "hash".to_string(),
                login_salt: "ls".to_string(),
                encryption_salt: "es".to_string(),
                avatar_url: None,
                public_key: with_key.then(|| format!("pk-{id}")),
                encrypted_private_key: with_key.then(|| format!("epk-{id}")),
                roles: vec![Role::User],
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    fn seed_credential(db: &VaultDatabase, owner: &str, title: &str) -> String {
        CredentialRepository::new(db)
            .create(
                owner,
                NewCredential {
                    title: title.to_string(),
                    url: None,
                    username: "account".to_string(),
                    encrypted_data: "ciphertext".to_string(),
                    encryption_iv: "iv".to_string(),
                    category_ids: Vec::new(),
                },
            )
            .unwrap()
            .id
    }

    fn new_share(credential_id: &str, recipient: &str) -> NewShare {
        NewShare {
            credential_id: credential_id.to_string(),
            recipient_user_id: recipient.to_string(),
            encrypted_sharing_key: "wrapped-key".to_string(),
            encrypted_shared_data: "wrapped-data".to_string(),
            sharing_iv: "share-iv".to_string(),
        }
    }

    #[test]
    fn create_share_happy_path() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        let share = repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        assert_eq!(share.owner_user_id, "alice");
        assert_eq!(share.recipient_user_id, "bob");
        assert_eq!(share.credential_id, credential_id);

        let (received, total) = repo.list_received("bob", 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(received[0].id, share.id);

        let (owned, total) = repo.list_owned("alice", 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(owned[0].id, share.id);
    }

    #[test]
    fn create_requires_current_ownership() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        seed_user(&db, "mallory", "mallory", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        // Mallory does not own the credential, even if she names herself owner.
        let result = repo.create("mallory", new_share(&credential_id, "bob"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let (received, _) = repo.list_received("bob", 0, 10).unwrap();
        assert!(received.is_empty());
    }

    #[test]
    fn create_rejects_self_share() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        let result = repo.create("alice", new_share(&credential_id, "alice"));
        assert!(matches!(result, Err(StoreError::SelfShare)));
    }

    #[test]
    fn create_rejects_missing_or_keyless_recipient() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "carol", "carol", false);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        assert!(matches!(
            repo.create("alice", new_share(&credential_id, "ghost")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            repo.create("alice", new_share(&credential_id, "carol")),
            Err(StoreError::RecipientWithoutKey)
        ));
    }

    #[test]
    fn duplicate_pair_conflicts_without_overwrite() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        let original = repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        let mut second = new_share(&credential_id, "bob");
        second.encrypted_sharing_key = "different-key".to_string();
        let result = repo.create("alice", second);
        assert!(matches!(result, Err(StoreError::AlreadyShared)));

        // Exactly one row, with the original key material.
        let (received, total) = repo.list_received("bob", 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(received[0].encrypted_sharing_key, original.encrypted_sharing_key);
    }

    #[test]
    fn same_credential_to_two_recipients_is_allowed() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        seed_user(&db, "dave", "dave", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        repo.create("alice", new_share(&credential_id, "bob")).unwrap();
        repo.create("alice", new_share(&credential_id, "dave")).unwrap();

        let recipients = repo.list_for_credential(&credential_id, "alice").unwrap();
        assert_eq!(recipients.len(), 2);
    }

    #[test]
    fn get_by_ids_is_owner_only() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        let share = repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        let loaded = repo.get_by_ids(&credential_id, "bob", "alice").unwrap();
        assert_eq!(loaded, share);

        // The recipient gets the same answer as for an unshared pair.
        let foreign = repo.get_by_ids(&credential_id, "bob", "bob").unwrap_err();
        let missing = repo.get_by_ids(&credential_id, "nobody", "alice").unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
    }

    #[test]
    fn rewrap_keeps_identity_and_pair() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        let original = repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        let updated = repo
            .update(
                &credential_id,
                "bob",
                "alice",
                ShareRewrap {
                    encrypted_sharing_key: "rotated-key".to_string(),
                    encrypted_shared_data: "rotated-data".to_string(),
                    sharing_iv: "rotated-iv".to_string(),
                },
            )
            .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.encrypted_sharing_key, "rotated-key");

        // Still exactly one share for the pair.
        let (received, total) = repo.list_received("bob", 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(received[0].encrypted_sharing_key, "rotated-key");
    }

    #[test]
    fn recipient_cannot_rewrap_or_revoke() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        let share = repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        let rewrap = ShareRewrap {
            encrypted_sharing_key: "k".to_string(),
            encrypted_shared_data: "d".to_string(),
            sharing_iv: "iv".to_string(),
        };
        assert!(matches!(
            repo.update(&credential_id, "bob", "bob", rewrap),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            repo.revoke(&share.id, "bob"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            repo.revoke_by_ids(&credential_id, "bob", "bob"),
            Err(StoreError::NotFound(_))
        ));

        // The grant is still intact.
        let (received, total) = repo.list_received("bob", 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(received[0].id, share.id);
    }

    #[test]
    fn revoke_frees_the_pair_for_resharing() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        let share = repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        repo.revoke(&share.id, "alice").unwrap();
        let (received, total) = repo.list_received("bob", 0, 10).unwrap();
        assert!(received.is_empty());
        assert_eq!(total, 0);

        // No tombstone: resharing the same pair succeeds.
        let reshared = repo.create("alice", new_share(&credential_id, "bob")).unwrap();
        assert_ne!(reshared.id, share.id);
    }

    #[test]
    fn revoke_by_ids_removes_exactly_one_pair() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        seed_user(&db, "dave", "dave", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        repo.create("alice", new_share(&credential_id, "bob")).unwrap();
        repo.create("alice", new_share(&credential_id, "dave")).unwrap();

        repo.revoke_by_ids(&credential_id, "bob", "alice").unwrap();

        assert_eq!(repo.count_received("bob").unwrap(), 0);
        assert_eq!(repo.count_received("dave").unwrap(), 1);
    }

    #[test]
    fn list_for_credential_is_owner_only() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        // The recipient and strangers get the same answer as for a missing id.
        let foreign = repo.list_for_credential(&credential_id, "bob").unwrap_err();
        let missing = repo.list_for_credential("missing", "bob").unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
    }

    #[test]
    fn credential_delete_cascades_to_shares() {
        let (_temp, db) = test_database();
        seed_user(&db, "alice", "alice", true);
        seed_user(&db, "bob", "bob", true);
        let credential_id = seed_credential(&db, "alice", "Email");

        let repo = ShareRepository::new(&db);
        repo.create("alice", new_share(&credential_id, "bob")).unwrap();

        CredentialRepository::new(&db)
            .delete(&credential_id, "alice")
            .unwrap();

        assert_eq!(repo.count_received("bob").unwrap(), 0);
        let (owned, _) = repo.list_owned("alice", 0, 10).unwrap();
        assert!(owned.is_empty());

        // The pair index entry is gone too: a fresh credential with the same
        // recipient shares cleanly.
        let next = seed_credential(&db, "alice", "Email 2");
        assert!(repo.create("alice", new_share(&next, "bob")).is_ok());
    }
}
