// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Ledger
//!
//! One persistent [`Session`] per issued refresh credential. The ledger
//! creates sessions at login, validates them when a refresh credential is
//! exchanged for a new access credential, and revokes them on logout.
//!
//! ## States
//!
//! ```text
//! Active --revoke--> Revoked
//!   |
//!   +--(clock >= expires_at)--> Expired   (computed, never stored)
//! ```
//!
//! The refresh credential is not rotated on renewal; a session keeps the
//! single refresh credential it was created with until it expires or is
//! revoked.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::{Session, StoreClient, StoreError};
use crate::token::{CredentialPayload, TokenAuthority, TokenError};

/// Why a session operation failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session blocked")]
    Revoked,

    #[error("incorrect session")]
    Mismatch,

    #[error("session expired")]
    Expired,

    #[error("session storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("credential issuance failed: {0}")]
    Token(#[from] TokenError),
}

/// Client details recorded alongside a session.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub client_ip: String,
    pub user_agent: String,
}

/// Tracks refresh-credential sessions through the storage collaborator.
#[derive(Clone)]
pub struct SessionLedger {
    authority: Arc<TokenAuthority>,
    store: StoreClient,
    access_ttl: Duration,
}

impl SessionLedger {
    pub fn new(authority: Arc<TokenAuthority>, store: StoreClient, access_ttl: Duration) -> Self {
        Self {
            authority,
            store,
            access_ttl,
        }
    }

    /// Persist a new active session keyed by the refresh credential's ID.
    pub async fn create_session(
        &self,
        subject: &str,
        refresh_token: &str,
        refresh_payload: &CredentialPayload,
        client: ClientMeta,
    ) -> Result<Session, SessionError> {
        let session = Session {
            id: refresh_payload.id,
            username: subject.to_string(),
            refresh_token: refresh_token.to_string(),
            user_agent: client.user_agent,
            client_ip: client.client_ip,
            revoked: false,
            expires_at: refresh_payload.expires_at,
            created_at: Utc::now(),
        };

        let session = self.store.create_session(session).await.map_err(|e| {
            tracing::error!(session_id = %refresh_payload.id, error = %e, "Failed to create session");
            SessionError::Storage(e)
        })?;

        tracing::info!(session_id = %session.id, subject = %session.username, "Session created");
        Ok(session)
    }

    /// Exchange a verified refresh credential for a fresh access credential.
    ///
    /// `refresh_payload` must come from a successful
    /// [`TokenAuthority::verify`] of `presented`.
    pub async fn renew(
        &self,
        refresh_payload: &CredentialPayload,
        presented: &str,
    ) -> Result<(String, CredentialPayload), SessionError> {
        self.renew_at(refresh_payload, presented, Utc::now()).await
    }

    pub(crate) async fn renew_at(
        &self,
        refresh_payload: &CredentialPayload,
        presented: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, CredentialPayload), SessionError> {
        let session = self.fetch(refresh_payload.id).await?;

        if let Err(reason) = check_renewable(&session, refresh_payload, presented, now) {
            tracing::warn!(session_id = %session.id, reason = %reason, "Renewal rejected");
            return Err(reason);
        }

        let issued = self.authority.issue(&session.username, self.access_ttl)?;
        tracing::debug!(session_id = %session.id, "Access credential renewed");
        Ok(issued)
    }

    /// Mark a session revoked. Revoking twice is not an error.
    pub async fn revoke(&self, id: Uuid) -> Result<Session, SessionError> {
        let session = self.store.revoke_session(id).await.map_err(|e| {
            if e.is_not_found() {
                SessionError::NotFound
            } else {
                tracing::error!(session_id = %id, error = %e, "Failed to revoke session");
                SessionError::Storage(e)
            }
        })?;

        tracing::info!(session_id = %id, "Session revoked");
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Result<Session, SessionError> {
        self.fetch(id).await
    }

    async fn fetch(&self, id: Uuid) -> Result<Session, SessionError> {
        self.store.get_session(id).await.map_err(|e| {
            if e.is_not_found() {
                tracing::warn!(session_id = %id, "Session not found");
                SessionError::NotFound
            } else {
                tracing::error!(session_id = %id, error = %e, "Session lookup failed");
                SessionError::Storage(e)
            }
        })
    }
}

/// Ordered renewal checks: revoked, subject, refresh value, expiry.
fn check_renewable(
    session: &Session,
    refresh_payload: &CredentialPayload,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<(), SessionError> {
    if session.revoked {
        return Err(SessionError::Revoked);
    }
    if session.username != refresh_payload.subject {
        return Err(SessionError::Mismatch);
    }
    if session.refresh_token != presented {
        return Err(SessionError::Mismatch);
    }
    if now >= session.expires_at {
        return Err(SessionError::Expired);
    }
    Ok(())
}
