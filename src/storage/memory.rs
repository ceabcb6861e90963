// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store.
//!
//! Nothing survives a restart. Used by tests and by `STORE_BACKEND=memory`
//! outside production.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use super::{Session, Store, StoreError, StoreResult, User};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<HashMap<Uuid, Session>>,
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    fn create_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate {
                entity: "user",
                id: user.username,
            });
        }
        users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    fn get_user(&self, username: &str) -> StoreResult<User> {
        self.users
            .read()
            .map_err(poisoned)?
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "user",
                id: username.to_string(),
            })
    }

    fn create_session(&self, session: Session) -> StoreResult<Session> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.contains_key(&session.id) {
            return Err(StoreError::Duplicate {
                entity: "session",
                id: session.id.to_string(),
            });
        }
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn get_session(&self, id: Uuid) -> StoreResult<Session> {
        self.sessions
            .read()
            .map_err(poisoned)?
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "session",
                id: id.to_string(),
            })
    }

    fn revoke_session(&self, id: Uuid) -> StoreResult<Session> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        match sessions.get_mut(&id) {
            Some(session) => {
                session.revoked = true;
                Ok(session.clone())
            }
            None => Err(StoreError::NotFound {
                entity: "session",
                id: id.to_string(),
            }),
        }
    }
}
