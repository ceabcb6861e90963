// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded user and session database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: username → serialized [`User`]
//! - `sessions`: session id (hyphenated UUID) → serialized [`Session`]

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use uuid::Uuid;

use super::{Session, Store, StoreError, StoreResult, User};

// =============================================================================
// Table Definitions
// =============================================================================

/// Every table maps a string key to a JSON document.
type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const USERS: JsonTable = TableDefinition::new("users");

const SESSIONS: JsonTable = TableDefinition::new("sessions");

// =============================================================================
// Error Conversions
// =============================================================================

macro_rules! backend_error {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for StoreError {
                fn from(e: $source) -> Self {
                    StoreError::Backend(e.to_string())
                }
            }
        )*
    };
}

backend_error!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

// =============================================================================
// RedbStore
// =============================================================================

/// Embedded ACID store for users and sessions.
///
/// Every mutation runs in its own write transaction; redb serialises writers,
/// which gives the per-row atomicity the session ledger relies on.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(SESSIONS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn insert_new(
        &self,
        table: JsonTable,
        entity: &'static str,
        key: &str,
        json: &[u8],
    ) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table)?;
            if t.get(key)?.is_some() {
                return Err(StoreError::Duplicate {
                    entity,
                    id: key.to_string(),
                });
            }
            t.insert(key, json)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn read(
        &self,
        table: JsonTable,
        entity: &'static str,
        key: &str,
    ) -> StoreResult<Vec<u8>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        match t.get(key)? {
            Some(value) => Ok(value.value().to_vec()),
            None => Err(StoreError::NotFound {
                entity,
                id: key.to_string(),
            }),
        }
    }
}

impl Store for RedbStore {
    fn create_user(&self, user: User) -> StoreResult<User> {
        let json = serde_json::to_vec(&user)?;
        self.insert_new(USERS, "user", &user.username, &json)?;
        Ok(user)
    }

    fn get_user(&self, username: &str) -> StoreResult<User> {
        let bytes = self.read(USERS, "user", username)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn create_session(&self, session: Session) -> StoreResult<Session> {
        let json = serde_json::to_vec(&session)?;
        self.insert_new(SESSIONS, "session", &session.id.to_string(), &json)?;
        Ok(session)
    }

    fn get_session(&self, id: Uuid) -> StoreResult<Session> {
        let bytes = self.read(SESSIONS, "session", &id.to_string())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn revoke_session(&self, id: Uuid) -> StoreResult<Session> {
        let key = id.to_string();
        let write_txn = self.db.begin_write()?;
        let session = {
            let mut table = write_txn.open_table(SESSIONS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table.get(key.as_str())?.ok_or_else(|| StoreError::NotFound {
                    entity: "session",
                    id: key.clone(),
                })?;
                existing.value().to_vec()
            };

            let mut session: Session = serde_json::from_slice(&existing_bytes)?;
            session.revoked = true;

            let json = serde_json::to_vec(&session)?;
            table.insert(key.as_str(), json.as_slice())?;
            session
        };
        write_txn.commit()?;
        Ok(session)
    }
}

// =============================================================================
// Tests
// =============================================================================
