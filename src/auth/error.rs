// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::token::TokenError;

/// Why a bearer credential was not accepted.
///
/// Every variant is a 401; the `error_code` tells clients which one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Header is not `<scheme> <credential>`
    InvalidAuthHeader,
    /// Scheme other than `Bearer`
    UnsupportedScheme(String),
    /// Credential cannot be parsed
    MalformedToken,
    /// Authentication tag does not verify
    InvalidToken,
    /// Credential has expired
    TokenExpired,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::UnsupportedScheme(_) => "unsupported_auth_scheme",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Malformed => AuthError::MalformedToken,
            _ => AuthError::InvalidToken,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "authorization header is not provided"),
            AuthError::InvalidAuthHeader => write!(f, "invalid authorization header format"),
            AuthError::UnsupportedScheme(scheme) => {
                write!(f, "unsupported authorization type {scheme}")
            }
            AuthError::MalformedToken => write!(f, "token is malformed"),
            AuthError::InvalidToken => write!(f, "token is invalid"),
            AuthError::TokenExpired => write!(f, "token has expired"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
