// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Ownership enforcement for all storage operations.
//!
//! Every query touching an owned resource carries the caller's identity;
//! a client-supplied owner id is never trusted on its own. Ownership
//! failures surface as `NotFound`, identical to a missing resource, so a
//! non-owner cannot probe for existence.

use super::{StoreError, StoreResult};

/// Trait for resources that have exactly one owner.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_user_id(&self) -> &str;

    /// Human-readable resource name used in error messages.
    fn resource_name() -> &'static str;
}

/// Trait for enforcing ownership on storage operations.
pub trait OwnershipEnforcer {
    /// Verify that the user owns this resource.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the user doesn't own the resource.
    fn verify_owner(&self, user_id: &str) -> StoreResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_owner(&self, user_id: &str) -> StoreResult<()> {
        if self.owner_user_id() == user_id {
            Ok(())
        } else {
            Err(StoreError::NotFound(T::resource_name().to_string()))
        }
    }
}

/// Extension trait for verifying ownership on optional lookups.
pub trait OwnershipCheck<T> {
    /// Verify ownership and return the resource if authorized.
    fn verify_owned_by(self, user_id: &str) -> StoreResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn verify_owned_by(self, user_id: &str) -> StoreResult<T> {
        match self {
            Some(resource) => {
                resource.verify_owner(user_id)?;
                Ok(resource)
            }
            None => Err(StoreError::NotFound(T::resource_name().to_string())),
        }
    }
}
