// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential errors.

use thiserror::Error;

/// Failure modes of issuing or verifying a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The string is not a `v4.local` credential at all.
    #[error("token is malformed")]
    Malformed,
    /// The authentication tag does not verify against the shared key.
    #[error("token is invalid")]
    Invalid,
    /// The credential verified but its expiry has passed.
    #[error("token has expired")]
    Expired,
    /// A credential must live for a positive amount of time.
    #[error("token ttl must be positive")]
    InvalidTtl,
    /// The symmetric key has the wrong length.
    #[error("symmetric key must be exactly {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },
    /// Encryption or encoding failed while issuing.
    #[error("token crypto failure: {0}")]
    Crypto(String),
}
