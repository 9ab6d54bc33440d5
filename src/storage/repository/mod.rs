// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Repository layer providing typed access to the vault database.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! opening its own scoped transactions against the shared [`VaultDatabase`].
//!
//! [`VaultDatabase`]: super::VaultDatabase

pub mod categories;
pub mod credentials;
pub mod notes;
pub mod shares;
pub mod users;

pub use categories::{CategoryChanges, CategoryRepository, StoredCategory};
pub use credentials::{
    CredentialChanges, CredentialRepository, ListOptions, NewCredential, SortBy, SortDirection,
    StoredCredential,
};
pub use notes::{NewSecureNote, SecureNoteChanges, SecureNoteRepository, StoredSecureNote};
pub use shares::{NewShare, ShareRepository, ShareRewrap, StoredShare};
pub use users::{DirectoryEntry, PublicKeyEntry, StoredUser, UserRepository};
