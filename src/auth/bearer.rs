// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `Authorization: Bearer <credential>` parsing.
//!
//! Shared by the auth service extractor and the gateway's authentication
//! stage so both reject the same headers the same way.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::AuthError;
use crate::token::{CredentialPayload, TokenAuthority};

const BEARER: &str = "bearer";

/// Pull the credential out of the `Authorization` header.
///
/// The scheme keyword is case-insensitive. Anything other than exactly two
/// whitespace-separated fields is rejected.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let mut fields = value.split_whitespace();
    let (Some(scheme), Some(token), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(AuthError::InvalidAuthHeader);
    };

    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(AuthError::UnsupportedScheme(scheme.to_lowercase()));
    }
    Ok(token)
}

/// Parse the header and verify the credential.
pub fn authenticate(
    headers: &HeaderMap,
    authority: &TokenAuthority,
) -> Result<CredentialPayload, AuthError> {
    let token = bearer_token(headers)?;
    Ok(authority.verify(token)?)
}
