// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Collaborator
//!
//! Narrow CRUD contract over users and sessions. The core never owns these
//! rows; it reads and writes them through [`Store`].
//!
//! ## Backends
//!
//! - [`RedbStore`] - embedded ACID database (default)
//! - [`InMemoryStore`] - process-local maps, for tests and throwaway runs
//!
//! Backends are synchronous. Async callers go through [`StoreClient`], which
//! runs each call on the blocking pool under a timeout so a slow store can
//! never pin a request task indefinitely.

pub mod database;
pub mod memory;
pub mod ownership;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use database::RedbStore;
pub use memory::InMemoryStore;
pub use ownership::{OwnedResource, OwnershipEnforcer};

// =============================================================================
// Records
// =============================================================================

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// bcrypt hash, never the password itself.
    pub hashed_password: String,
    pub full_name: String,
    pub email: String,
    pub is_whitelisted: bool,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One refresh-credential grant.
///
/// `id` equals the refresh credential's unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub username: String,
    /// Raw refresh credential exactly as issued.
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    pub revoked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },

    #[error("permission denied: {subject} does not own {resource}")]
    PermissionDenied { subject: String, resource: String },

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Contract
// =============================================================================

/// Storage contract consumed by the auth service and the session ledger.
///
/// Implementations must make each call atomic per row.
pub trait Store: Send + Sync + 'static {
    /// Insert a new user; [`StoreError::Duplicate`] if the username is taken.
    fn create_user(&self, user: User) -> StoreResult<User>;

    fn get_user(&self, username: &str) -> StoreResult<User>;

    /// Insert a new session; [`StoreError::Duplicate`] if the ID exists.
    fn create_session(&self, session: Session) -> StoreResult<Session>;

    fn get_session(&self, id: Uuid) -> StoreResult<Session>;

    /// Set `revoked = true` and return the updated row.
    fn revoke_session(&self, id: Uuid) -> StoreResult<Session>;
}

/// Async handle over a shared [`Store`].
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<dyn Store>,
    timeout: Duration,
}

impl StoreClient {
    pub fn new(inner: Arc<dyn Store>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Convenience constructor for an empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), Duration::from_secs(5))
    }

    async fn call<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.inner);
        let task = tokio::task::spawn_blocking(move || op(store.as_ref()));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(StoreError::Backend(format!("storage task failed: {join}"))),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    pub async fn create_user(&self, user: User) -> StoreResult<User> {
        self.call(move |store| store.create_user(user)).await
    }

    pub async fn get_user(&self, username: &str) -> StoreResult<User> {
        let username = username.to_string();
        self.call(move |store| store.get_user(&username)).await
    }

    pub async fn create_session(&self, session: Session) -> StoreResult<Session> {
        self.call(move |store| store.create_session(session)).await
    }

    pub async fn get_session(&self, id: Uuid) -> StoreResult<Session> {
        self.call(move |store| store.get_session(id)).await
    }

    pub async fn revoke_session(&self, id: Uuid) -> StoreResult<Session> {
        self.call(move |store| store.revoke_session(id)).await
    }
}
