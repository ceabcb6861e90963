// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(caller): Auth) -> impl IntoResponse {
//!     // caller is the verified CredentialPayload
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{bearer, AuthError};
use crate::state::AppState;
use crate::token::CredentialPayload;

/// Extractor for a verified access credential.
///
/// A payload already placed in the request extensions (by the gateway's
/// authentication stage, for instance) is used as is.
pub struct Auth(pub CredentialPayload);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(payload) = parts.extensions.get::<CredentialPayload>().cloned() {
            return Ok(Auth(payload));
        }

        let payload = bearer::authenticate(&parts.headers, &state.authority).map_err(|e| {
            tracing::debug!(reason = e.error_code(), "Bearer authentication failed");
            e
        })?;

        parts.extensions.insert(payload.clone());
        Ok(Auth(payload))
    }
}
