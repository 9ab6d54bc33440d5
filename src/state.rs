// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

use std::sync::Arc;

use crate::auth::TokenSigner;
use crate::storage::VaultDatabase;

/// Shared application state: the vault database handle and the token signer.
///
/// The database serializes its own writers; no additional locking lives
/// here.
#[derive(Clone)]
pub struct AppState {
    db: Arc<VaultDatabase>,
    pub tokens: Arc<TokenSigner>,
    /// Username that receives the admin role when it registers.
    pub seed_admin: Option<String>,
}

impl AppState {
    pub fn new(db: Arc<VaultDatabase>, tokens: Arc<TokenSigner>) -> Self {
        Self {
            db,
            tokens,
            seed_admin: None,
        }
    }

    pub fn with_seed_admin(mut self, seed_admin: Option<String>) -> Self {
        self.seed_admin = seed_admin;
        self
    }

    pub fn db(&self) -> &VaultDatabase {
        &self.db
    }
}
