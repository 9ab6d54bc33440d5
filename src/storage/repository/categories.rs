// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Password category repository.
//!
//! Categories are an owner-scoped tagging relation for credentials. Names
//! are unique per owner (case-insensitive) via the category_name_index
//! table; deleting a category detaches it from every credential that
//! referenced it.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{category_name_key, CATEGORIES, CATEGORY_NAME_INDEX, CREDENTIALS};
use super::super::ownership::{OwnedResource, OwnershipCheck};
use super::super::{StoreError, StoreResult, VaultDatabase};
use super::credentials::StoredCredential;

/// Category record stored in the vault database.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StoredCategory {
    /// Unique category identifier (UUID)
    pub id: String,
    /// Owner's user id
    pub owner_user_id: String,
    /// Category name, unique per owner
    pub name: String,
    /// Optional display color (`#RRGGBB`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    /// When the category was created
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for StoredCategory {
    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }

    fn resource_name() -> &'static str {
        "Category"
    }
}

/// Partial update for a category. Absent field = unchanged; `Some(None)`
/// for `color_hex` clears the color.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub color_hex: Option<Option<String>>,
}

/// Repository for category operations.
pub struct CategoryRepository<'a> {
    db: &'a VaultDatabase,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new CategoryRepository.
    pub fn new(db: &'a VaultDatabase) -> Self {
        Self { db }
    }

    /// Create a category.
    ///
    /// # Errors
    /// `StoreError::AlreadyExists` if the owner already has a category with
    /// this name (case-insensitive).
    pub fn create(
        &self,
        owner_user_id: &str,
        name: &str,
        color_hex: Option<String>,
    ) -> StoreResult<StoredCategory> {
        let now = Utc::now();
        let category = StoredCategory {
            id: uuid::Uuid::new_v4().to_string(),
            owner_user_id: owner_user_id.to_string(),
            name: name.to_string(),
            color_hex,
            created_at: now,
            updated_at: now,
        };
        let name_key = category_name_key(owner_user_id, name);
        let json = serde_json::to_vec(&category)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(CATEGORY_NAME_INDEX)?;
            if index.get(name_key.as_slice())?.is_some() {
                return Err(StoreError::AlreadyExists(
                    "Category name already exists".to_string(),
                ));
            }
            index.insert(name_key.as_slice(), category.id.as_str())?;

            let mut table = write_txn.open_table(CATEGORIES)?;
            table.insert(category.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(category)
    }

    /// Get a category, enforcing ownership.
    pub fn get_owned(&self, category_id: &str, owner_user_id: &str) -> StoreResult<StoredCategory> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CATEGORIES)?;
        let found = match table.get(category_id)? {
            Some(value) => Some(serde_json::from_slice::<StoredCategory>(value.value())?),
            None => None,
        };
        found.verify_owned_by(owner_user_id)
    }

    /// List all categories of an owner, alphabetically.
    pub fn list(&self, owner_user_id: &str) -> StoreResult<Vec<StoredCategory>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CATEGORIES)?;

        let mut matches = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let category: StoredCategory = serde_json::from_slice(value.value())?;
            if category.owner_user_id == owner_user_id {
                matches.push(category);
            }
        }
        matches.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(matches)
    }

    /// Apply a partial update, enforcing ownership. Renames keep the
    /// per-owner uniqueness invariant by moving the name index entry.
    pub fn update(
        &self,
        category_id: &str,
        owner_user_id: &str,
        changes: CategoryChanges,
    ) -> StoreResult<StoredCategory> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(CATEGORIES)?;
            let found = match table.get(category_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredCategory>(value.value())?),
                None => None,
            };
            let mut category = found.verify_owned_by(owner_user_id)?;

            if let Some(new_name) = changes.name {
                let old_key = category_name_key(owner_user_id, &category.name);
                let new_key = category_name_key(owner_user_id, &new_name);
                if new_key != old_key {
                    let mut index = write_txn.open_table(CATEGORY_NAME_INDEX)?;
                    if index.get(new_key.as_slice())?.is_some() {
                        return Err(StoreError::AlreadyExists(
                            "Category name already exists".to_string(),
                        ));
                    }
                    index.remove(old_key.as_slice())?;
                    index.insert(new_key.as_slice(), category_id)?;
                }
                category.name = new_name;
            }
            if let Some(color_hex) = changes.color_hex {
                category.color_hex = color_hex;
            }
            category.updated_at = Utc::now();

            let json = serde_json::to_vec(&category)?;
            table.insert(category_id, json.as_slice())?;
            category
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a category and detach it from all of the owner's credentials,
    /// in one transaction.
    pub fn delete(&self, category_id: &str, owner_user_id: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CATEGORIES)?;
            let found = match table.get(category_id)? {
                Some(value) => Some(serde_json::from_slice::<StoredCategory>(value.value())?),
                None => None,
            };
            let category = found.verify_owned_by(owner_user_id)?;
            table.remove(category_id)?;

            let mut index = write_txn.open_table(CATEGORY_NAME_INDEX)?;
            index.remove(category_name_key(owner_user_id, &category.name).as_slice())?;

            // Detach from credentials that carry this tag.
            let mut credentials = write_txn.open_table(CREDENTIALS)?;
            let mut tagged: Vec<StoredCredential> = Vec::new();
            for entry in credentials.iter()? {
                let (_, value) = entry?;
                let credential: StoredCredential = serde_json::from_slice(value.value())?;
                if credential.category_ids.iter().any(|id| id == category_id) {
                    tagged.push(credential);
                }
            }
            for mut credential in tagged {
                credential.category_ids.retain(|id| id != category_id);
                let json = serde_json::to_vec(&credential)?;
                credentials.insert(credential.id.as_str(), json.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Number of categories owned by a user.
    pub fn count_by_owner(&self, owner_user_id: &str) -> StoreResult<usize> {
        Ok(self.list(owner_user_id)?.len())
    }
}
