// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Authority
//!
//! Issues and verifies PASETO `v4.local` credentials under a single shared
//! symmetric key. Verification is stateless: it needs nothing but the
//! credential string and the key, so the gateway can authenticate every
//! request without a storage round-trip.
//!
//! ## Wire Format
//!
//! ```text
//! v4.local.<base64url(nonce || ciphertext || tag)>
//! ```
//!
//! The encrypted message is the JSON encoding of [`CredentialPayload`].

pub mod error;

use std::time::Duration;

use chrono::{DateTime, Utc};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::version4::{LocalToken, V4};
use pasetors::Local;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use error::TokenError;

/// Required length of the shared symmetric key in bytes.
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// Every credential produced here starts with this header.
const HEADER: &str = "v4.local.";

/// Decoded content of a credential.
///
/// Immutable once issued; never persisted by the authority itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CredentialPayload {
    /// Unique credential ID. For refresh credentials this is also the session ID.
    pub id: Uuid,
    /// Identity of the bearer (username).
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CredentialPayload {
    fn new(subject: &str, ttl: Duration, now: DateTime<Utc>) -> Result<Self, TokenError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::InvalidTtl)?;
        if ttl <= chrono::Duration::zero() {
            return Err(TokenError::InvalidTtl);
        }
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidTtl)?;

        Ok(Self {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            issued_at: now,
            expires_at,
        })
    }

    /// A credential is expired from its expiry instant onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Creates and verifies credentials with the process-wide symmetric key.
pub struct TokenAuthority {
    key: SymmetricKey<V4>,
}

impl std::fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("key", &"[redacted]")
            .finish()
    }
}

impl TokenAuthority {
    /// Build an authority from raw key bytes (exactly [`SYMMETRIC_KEY_LEN`]).
    pub fn new(key: &[u8]) -> Result<Self, TokenError> {
        if key.len() != SYMMETRIC_KEY_LEN {
            return Err(TokenError::KeyLength {
                expected: SYMMETRIC_KEY_LEN,
                actual: key.len(),
            });
        }
        let key = SymmetricKey::<V4>::from(key).map_err(|e| TokenError::Crypto(e.to_string()))?;
        Ok(Self { key })
    }

    /// Issue a credential for `subject` valid for `ttl` from now.
    ///
    /// Returns the serialized credential together with its decoded payload
    /// so callers can read the ID and expiry without verifying again.
    pub fn issue(
        &self,
        subject: &str,
        ttl: Duration,
    ) -> Result<(String, CredentialPayload), TokenError> {
        let payload = CredentialPayload::new(subject, ttl, Utc::now())?;
        let message =
            serde_json::to_vec(&payload).map_err(|e| TokenError::Crypto(e.to_string()))?;
        let token = LocalToken::encrypt(&self.key, &message, None, None)
            .map_err(|e| TokenError::Crypto(e.to_string()))?;

        Ok((token, payload))
    }

    /// Verify a credential against the current clock.
    pub fn verify(&self, token: &str) -> Result<CredentialPayload, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a credential as of `now`.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<CredentialPayload, TokenError> {
        let body = token.strip_prefix(HEADER).ok_or(TokenError::Malformed)?;
        if body.is_empty() || body.contains('.') {
            // Footers are never issued here.
            return Err(TokenError::Malformed);
        }

        // Past the header every decoding or tag failure means tampering.
        let untrusted =
            UntrustedToken::<Local, V4>::try_from(token).map_err(|_| TokenError::Invalid)?;
        let trusted = LocalToken::decrypt(&self.key, &untrusted, None, None)
            .map_err(|_| TokenError::Invalid)?;

        let payload: CredentialPayload =
            serde_json::from_str(trusted.payload()).map_err(|_| TokenError::Malformed)?;

        if payload.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8; 32] = b"k7Qp2Zr9Xv4Lm8Ns1Wt6Yb3Hc5Jd0Fg!";

    fn authority() -> TokenAuthority {
        TokenAuthority::new(KEY).unwrap()
    }

    #[test]
    fn issue_then_verify_returns_same_subject_and_expiry() {
        let authority = authority();
        let ttl = Duration::from_secs(15 * 60);
        let before = Utc::now();

        let (token, issued) = authority.issue("alice", ttl).unwrap();
        let verified = authority.verify(&token).unwrap();

        assert!(token.starts_with(HEADER));
        assert_eq!(verified, issued);
        assert_eq!(verified.subject, "alice");
        assert_eq!(
            verified.expires_at - verified.issued_at,
            chrono::Duration::from_std(ttl).unwrap()
        );
        assert!(verified.issued_at >= before);
        assert!(verified.issued_at <= Utc::now());
    }

    #[test]
    fn credential_ids_are_unique() {
        let authority = authority();
        let (_, a) = authority.issue("alice", Duration::from_secs(60)).unwrap();
        let (_, b) = authority.issue("alice", Duration::from_secs(60)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn verify_after_expiry_fails_with_expired() {
        let authority = authority();
        let (token, payload) = authority.issue("alice", Duration::from_secs(60)).unwrap();

        assert_eq!(
            authority.verify_at(&token, payload.expires_at),
            Err(TokenError::Expired)
        );
        assert_eq!(
            authority.verify_at(&token, payload.expires_at + chrono::Duration::seconds(1)),
            Err(TokenError::Expired)
        );
        assert!(authority
            .verify_at(&token, payload.expires_at - chrono::Duration::seconds(1))
            .is_ok());
    }

    #[test]
    fn any_altered_body_byte_fails_with_invalid() {
        let authority = authority();
        let (token, _) = authority.issue("alice", Duration::from_secs(60)).unwrap();

        for index in HEADER.len()..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert_eq!(
                authority.verify(&tampered),
                Err(TokenError::Invalid),
                "byte {index} altered"
            );
        }
    }

    #[test]
    fn credential_from_another_key_is_invalid() {
        let other = TokenAuthority::new(b"ZZZZZZZZZZZZZZZZYYYYYYYYYYYYYYYY").unwrap();
        let (token, _) = other.issue("alice", Duration::from_secs(60)).unwrap();

        assert_eq!(authority().verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_malformed() {
        let authority = authority();
        assert_eq!(authority.verify(""), Err(TokenError::Malformed));
        assert_eq!(authority.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(authority.verify("v4.local."), Err(TokenError::Malformed));
        assert_eq!(
            authority.verify("v4.public.abcdef"),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            authority.verify("v4.local.abc.footer"),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn zero_ttl_is_rejected() {
        assert_eq!(
            authority().issue("alice", Duration::ZERO).unwrap_err(),
            TokenError::InvalidTtl
        );
    }

    #[test]
    fn key_length_is_enforced() {
        assert_eq!(
            TokenAuthority::new(b"short").unwrap_err(),
            TokenError::KeyLength {
                expected: 32,
                actual: 5
            }
        );
    }

    #[test]
    fn debug_output_redacts_key() {
        let rendered = format!("{:?}", authority());
        assert!(rendered.contains("[redacted]"));
        assert!(!rendered.contains("k7Qp"));
    }
}
