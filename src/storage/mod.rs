// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! # Vault Storage Module
//!
//! Persistence for all server-side state, backed by a single embedded redb
//! database. The server only ever stores ciphertext and metadata: every
//! secret payload and every piece of key material arrives already encrypted
//! by a client, and nothing in this module can decrypt it.
//!
//! ## Layout
//!
//! - `database` — table definitions, composite-key helpers, the
//!   [`VaultDatabase`] handle and [`StoreError`]
//! - `repository` — typed per-entity operations (users, credentials, notes,
//!   categories, shares)
//! - `audit` — append-only audit log
//! - `ownership` — ownership predicate traits applied by every repository

pub mod audit;
pub mod database;
pub mod ownership;
pub mod repository;

pub use audit::{AuditAction, AuditLogEntry, AuditRepository, NewAuditEntry};
pub use database::{StoreError, StoreResult, VaultDatabase};
pub use ownership::{OwnedResource, OwnershipCheck, OwnershipEnforcer};
pub use repository::{
    CategoryChanges, CategoryRepository, CredentialChanges, CredentialRepository, DirectoryEntry,
    ListOptions, NewCredential, NewSecureNote, NewShare, PublicKeyEntry, SecureNoteChanges,
    SecureNoteRepository, ShareRepository, ShareRewrap, SortBy, SortDirection, StoredCategory,
    StoredCredential, StoredSecureNote, StoredShare, StoredUser, UserRepository,
};
