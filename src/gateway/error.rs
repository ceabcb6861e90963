// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pipeline rejections and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::error::ErrorBody;

/// Why the gateway answered a request itself instead of dispatching it.
///
/// Only the status and a generic message reach the caller; the details are
/// for logs.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("caller address not allowed")]
    AddressNotAllowed,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("no route for path")]
    RouteNotFound,

    #[error("authentication required: {0}")]
    AuthRequired(#[from] AuthError),

    #[error("upstream unavailable: {0}")]
    BadGateway(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AddressNotAllowed => StatusCode::FORBIDDEN,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::RouteNotFound => StatusCode::NOT_FOUND,
            GatewayError::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message returned to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::AddressNotAllowed => "access denied",
            GatewayError::RateLimited => "too many requests",
            GatewayError::RouteNotFound => "not found",
            GatewayError::AuthRequired(_) => "unauthorized",
            GatewayError::BadGateway(_) => "bad gateway",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.public_message().to_string(),
        });
        (self.status_code(), body).into_response()
    }
}
