// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for stored records.
//!
//! A record may only be read or mutated on behalf of the subject that owns
//! it. Handlers call [`OwnershipEnforcer::verify_ownership`] with the
//! verified credential before touching a user or session row.

use crate::token::CredentialPayload;

use super::{Session, StoreError, StoreResult, User};

/// Trait for records that have an owner.
pub trait OwnedResource {
    /// Username of the owner.
    fn owner(&self) -> &str;

    /// Label used in denial errors and logs.
    fn describe(&self) -> String;
}

impl OwnedResource for User {
    fn owner(&self) -> &str {
        &self.username
    }

    fn describe(&self) -> String {
        format!("user {}", self.username)
    }
}

impl OwnedResource for Session {
    fn owner(&self) -> &str {
        &self.username
    }

    fn describe(&self) -> String {
        format!("session {}", self.id)
    }
}

/// Trait for enforcing ownership against a verified credential.
pub trait OwnershipEnforcer {
    /// # Errors
    /// Returns `StoreError::PermissionDenied` if `caller` does not own the record.
    fn verify_ownership(&self, caller: &CredentialPayload) -> StoreResult<()>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, caller: &CredentialPayload) -> StoreResult<()> {
        if self.owner() == caller.subject {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                subject: caller.subject.clone(),
                resource: self.describe(),
            })
        }
    }
}
