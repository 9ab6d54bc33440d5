// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Credential repository.
//!
//! A credential is an opaque payload: ciphertext blob plus initialization
//! vector, encrypted client-side. The server persists and serves it but can
//! never read it. Every operation carries the caller's identity as the
//! ownership predicate.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{
    share_pair_prefix, share_pair_prefix_end, CATEGORIES, CREDENTIALS, SHARES, SHARE_PAIR_INDEX,
};
use super::super::ownership::{OwnedResource, OwnershipCheck};
use super::super::{StoreError, StoreResult, VaultDatabase};
use super::categories::StoredCategory;

/// Sort key for credential listings. Closed set; unrecognized values are
/// rejected at deserialization time instead of being passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    CreatedAt,
    Title,
}

/// Sort direction for credential listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Listing configuration: explicit recognized options only.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub sort_by: Option<SortBy>,
    pub sort_direction: Option<SortDirection>,
    /// Restrict to credentials tagged with this category.
    pub filter_category: Option<String>,
}

/// Credential record stored in the vault database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCredential {
    /// Unique credential identifier (UUID)
    pub id: String,
    /// Owner's user id
    pub owner_user_id: String,
    /// Display title (plaintext metadata, chosen by the client)
    pub title: String,
    /// Optional site URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Account username at the target site
    pub username: String,
    /// Ciphertext blob; opaque to the server
    pub encrypted_data: String,
    /// Initialization vector for the blob
    pub encryption_iv: String,
    /// Owner-scoped category tags
    pub category_ids: Vec<String>,
    /// When the credential was created
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for StoredCredential {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn resource_name() -> &'static str {
        "Credential"
    }
}

/// Fields for a new credential.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub title: String,
    pub url: Option<String>,
    pub username: String,
    pub encrypted_data: String,
    pub encryption_iv: String,
    pub category_ids: Vec<String>,
}

/// Partial update for a credential.
///
/// Absent field (`None`) = unchanged. For the nullable `url`,
/// `Some(None)` = clear, `Some(Some(v))` = set. A provided `category_ids`
/// replaces the whole tag set; an empty list clears it.
#[derive(Debug, Clone, Default)]
pub struct CredentialChanges {
    pub title: Option<String>,
    pub url: Option<Option<String>>,
    pub username: Option<String>,
    pub encrypted_data: Option<String>,
    pub encryption_iv: Option<String>,
    pub category_ids: Option<Vec<String>>,
}

/// Repository for credential operations.
pub struct CredentialRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> CredentialRepository<'a> {
    /// Create a new CredentialRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Create a new credential for `owner_user_id`.
    ///
    /// Category links pointing at categories the owner does not own are
    /// silently dropped.
    pub fn create(&self, owner_user_id: &str, new: NewCredential) -> StoreResult<StoredCredential> {
        let write_txn = self.db.begin_write()?;
        let credential = {
            let categories = write_txn.open_table(CATEGORIES)?;
            let category_ids =
                filter_owned_categories(&categories, owner_user_id, &new.category_ids)?;

            let now = Utc::now();
            let credential = StoredCredential {
                id: uuid::Uuid::new_v4().to_string(),
                owner_user_id: owner_user_id.to_string(),
                title: new.title,
                url: new.url,
                username: new.username,
                encrypted_data: new.encrypted_data,
                encryption_iv: new.encryption_iv,
                category_ids,
                created_at: now,
                updated_at: now,
            };
            let json = serde_json::to_vec(&credential)?;

            let mut table = write_txn.open_table(CREDENTIALS)?;
            table.insert(credential.id.as_str(), json.as_slice())?;
            credential
        };
        write_txn.commit()?;
        Ok(credential)
    }

    /// Get a credential, enforcing ownership. A credential that exists but
    /// belongs to someone else is reported as not found.
    pub fn get_owned(
        &self,
        credential_id: &str,
        owner_user_id: &str,
    ) -> StoreResult<StoredCredential> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;
        let found = match table.get(credential_id)? {
            Some(value) => Some(serde_json::from_slice::<StoredCredential>(value.value())?),
            None => None,
        };
        found.verify_owned_by(owner_user_id)
    }

    /// List an owner's credentials with sorting and category filtering.
    ///
    /// Returns the requested page plus the total match count (pre-page) for
    /// client-side pagination.
    pub fn list(
        &self,
        owner_user_id: &str,
        options: &ListOptions,
        skip: usize,
        limit: usize,
    ) -> StoreResult<(Vec<StoredCredential>, usize)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIALS)?;

        let mut matches = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let credential: StoredCredential = serde_json::from_slice(value.value())?;
            if credential.owner_user_id != owner_user_id {
                continue;
            }
            if let Some(category_id) = &options.filter_category {
                if !credential.category_ids.contains(category_id) {
                    continue;
                }
            }
            matches.push(credential);
        }

        sort_credentials(&mut matches, options);

        let total = matches.len();
        let page = matches.into_iter().skip(skip).take(limit).collect();
        Ok((page, total))
    }

    /// Apply a partial update, enforcing ownership.
    pub fn update(
        &self,
        credential_id: &str,
        owner_user_id: &str,
        changes: CredentialChanges,
    ) -> StoreResult<StoredCredential> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(CREDENTIALS)?;
            let found = match table.get(credential_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredCredential>(value.value())?),
                None => None,
            };
            let mut credential = found.verify_owned_by(owner_user_id)?;

            if let Some(title) = changes.title {
                credential.title = title;
            }
            if let Some(url) = changes.url {
                credential.url = url;
            }
            if let Some(username) = changes.username {
                credential.username = username;
            }
            if let Some(encrypted_data) = changes.encrypted_data {
                credential.encrypted_data = encrypted_data;
            }
            if let Some(encryption_iv) = changes.encryption_iv {
                credential.encryption_iv = encryption_iv;
            }
            if let Some(category_ids) = changes.category_ids {
                let categories = write_txn.open_table(CATEGORIES)?;
                credential.category_ids =
                    filter_owned_categories(&categories, owner_user_id, &category_ids)?;
            }
            credential.updated_at = Utc::now();

            let json = serde_json::to_vec(&credential)?;
            table.insert(credential_id, json.as_slice())?;
            credential
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a credential and cascade to its share rows.
    ///
    /// The credential removal and the share cleanup commit atomically: a
    /// recipient can never observe a share whose underlying credential is
    /// gone.
    pub fn delete(&self, credential_id: &str, owner_user_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CREDENTIALS)?;
            let found = match table.get(credential_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredCredential>(value.value())?),
                None => None,
            };
            found.verify_owned_by(owner_user_id)?;
            table.remove(credential_id)?;

            let mut pair_index = write_txn.open_table(SHARE_PAIR_INDEX)?;
            let prefix = share_pair_prefix(credential_id);
            let prefix_end = share_pair_prefix_end(credential_id);

            let mut doomed: Vec<(Vec<u8>, String)> = Vec::new();
            for entry in pair_index.range(prefix.as_slice()..prefix_end.as_slice())? {
                let entry = entry?;
                doomed.push((entry.0.value().to_vec(), entry.1.value().to_string()));
            }

            let mut shares = write_txn.open_table(SHARES)?;
            for (key, share_id) in doomed {
                pair_index.remove(key.as_slice())?;
                shares.remove(share_id.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Number of credentials owned by a user.
    pub fn count_by_owner(&self, owner_user_id: &str) -> StoreResult<usize> {
        let (_, total) = self.list(owner_user_id, &ListOptions::default(), 0, 0)?;
        Ok(total)
    }
}

/// Keep only category ids that exist and belong to the owner.
fn filter_owned_categories(
    categories: &impl ReadableTable<&'static str, &'static [u8]>,
    owner_user_id: &str,
    requested: &[String],
) -> StoreResult<Vec<String>> {
    let mut owned = Vec::new();
    for category_id in requested {
        if let Some(value) = categories.get(category_id.as_str())? {
            let category: StoredCategory = serde_json::from_slice(value.value())?;
            if category.owner_user_id == owner_user_id && !owned.contains(category_id) {
                owned.push(category_id.clone());
            }
        }
    }
    Ok(owned)
}

/// Order a listing per the requested options.
///
/// Defaults mirror the client's expectations: by creation date the newest
/// entries come first, by title the ordering is alphabetical. Without an
/// explicit sort key the listing is newest-first.
fn sort_credentials(credentials: &mut [StoredCredential], options: &ListOptions) {
    match options.sort_by {
        Some(SortBy::Title) => match options.sort_direction {
            Some(SortDirection::Desc) => {
                credentials.sort_by(|a, b| b.title.cmp(&a.title).then(a.id.cmp(&b.id)));
            }
            _ => credentials.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id))),
        },
        Some(SortBy::CreatedAt) | None => match options.sort_direction {
            Some(SortDirection::Asc) => {
                credentials.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            }
            _ => credentials.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::super::categories::CategoryRepository;
    use super::*;
    use tempfile::TempDir;

    fn test_database() -> (TempDir, VaultDatabase) {
        let temp = TempDir::new().unwrap();
        let db = VaultDatabase::open(&temp.path().join("vault.redb")).unwrap();
        (temp, db)
    }

    pub(crate) fn test_credential(title: &str) -> NewCredential {
        NewCredential {
            title: title.to_string(),
            url: Some("https://example.com".to_string()),
            username: "account".to_string(),
            encrypted_data: "ciphertext".to_string(),
            encryption_iv: "iv".to_string(),
            category_ids: Vec::new(),
        }
    }

    #[test]
    fn create_and_get_credential() {
        let (_temp, db) = test_database();
        let repo = CredentialRepository::new(&db);

        let created = repo.create("user-1", test_credential("Email")).unwrap();
        let loaded = repo.get_owned(&created.id, "user-1").unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.title, "Email");
    }

    #[test]
    fn foreign_credential_is_not_found() {
        let (_temp, db) = test_database();
        let repo = CredentialRepository::new(&db);

        let created = repo.create("user-1", test_credential("Email")).unwrap();

        let foreign = repo.get_owned(&created.id, "user-2").unwrap_err();
        let missing = repo.get_owned("missing", "user-2").unwrap_err();
        assert_eq!(foreign.to_string(), missing.to_string());
    }

    #[test]
    fn list_filters_by_owner_and_reports_total() {
        let (_temp, db) = test_database();
        let repo = CredentialRepository::new(&db);

        for i in 0..4 {
            repo.create("user-1", test_credential(&format!("cred-{i}")))
                .unwrap();
        }
        repo.create("user-2", test_credential("other")).unwrap();

        let (page, total) = repo
            .list("user-1", &ListOptions::default(), 1, 2)
            .unwrap();
        assert_eq!(total, 4);
        assert_eq!(page.len(), 2);
        assert!(page.iter().all(|c| c.owner_user_id == "user-1"));
    }

    #[test]
    fn list_sorts_by_title() {
        let (_temp, db) = test_database();
        let repo = CredentialRepository::new(&db);

        for title in ["banana", "apple", "cherry"] {
            repo.create("user-1", test_credential(title)).unwrap();
        }

        let options = ListOptions {
            sort_by: Some(SortBy::Title),
            sort_direction: None,
            filter_category: None,
        };
        let (page, _) = repo.list("user-1", &options, 0, 10).unwrap();
        let titles: Vec<_> = page.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["apple", "banana", "cherry"]);

        let descending = ListOptions {
            sort_by: Some(SortBy::Title),
            sort_direction: Some(SortDirection::Desc),
            filter_category: None,
        };
        let (page, _) = repo.list("user-1", &descending, 0, 10).unwrap();
        let titles: Vec<_> = page.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["cherry", "banana", "apple"]);
    }

    #[test]
    fn list_filters_by_category() {
        let (_temp, db) = test_database();
        let categories = CategoryRepository::new(&db);
        let repo = CredentialRepository::new(&db);

        let work = categories.create("user-1", "work", None).unwrap();

        let mut tagged = test_credential("tagged");
        tagged.category_ids = vec![work.id.clone()];
        repo.create("user-1", tagged).unwrap();
        repo.create("user-1", test_credential("untagged")).unwrap();

        let options = ListOptions {
            sort_by: None,
            sort_direction: None,
            filter_category: Some(work.id),
        };
        let (page, total) = repo.list("user-1", &options, 0, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].title, "tagged");
    }

    #[test]
    fn foreign_category_links_are_dropped() {
        let (_temp, db) = test_database();
        let categories = CategoryRepository::new(&db);
        let repo = CredentialRepository::new(&db);

        let theirs = categories.create("user-2", "theirs", None).unwrap();

        let mut new = test_credential("cred");
        new.category_ids = vec![theirs.id, "missing".to_string()];
        let created = repo.create("user-1", new).unwrap();
        assert!(created.category_ids.is_empty());
    }

    #[test]
    fn update_applies_patch_semantics() {
        let (_temp, db) = test_database();
        let repo = CredentialRepository::new(&db);

        let created = repo.create("user-1", test_credential("Email")).unwrap();

        let updated = repo
            .update(
                &created.id,
                "user-1",
                CredentialChanges {
                    title: Some("Mail".to_string()),
                    url: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Mail");
        assert_eq!(updated.url, None);
        // Untouched fields stay as they were.
        assert_eq!(updated.encrypted_data, created.encrypted_data);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn update_rejects_non_owner() {
        let (_temp, db) = test_database();
        let repo = CredentialRepository::new(&db);

        let created = repo.create("user-1", test_credential("Email")).unwrap();
        let result = repo.update(
            &created.id,
            "user-2",
            CredentialChanges {
                title: Some("hijacked".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        // The row is untouched.
        let loaded = repo.get_owned(&created.id, "user-1").unwrap();
        assert_eq!(loaded.title, "Email");
    }

    #[test]
    fn delete_rejects_non_owner_and_removes_for_owner() {
        let (_temp, db) = test_database();
        let repo = CredentialRepository::new(&db);

        let created = repo.create("user-1", test_credential("Email")).unwrap();

        assert!(matches!(
            repo.delete(&created.id, "user-2"),
            Err(StoreError::NotFound(_))
        ));
        assert!(repo.get_owned(&created.id, "user-1").is_ok());

        repo.delete(&created.id, "user-1").unwrap();
        assert!(repo.get_owned(&created.id, "user-1").is_err());
    }
}
