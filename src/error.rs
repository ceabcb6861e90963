// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::session::SessionError;
use crate::storage::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// Error body returned by every auth service endpoint.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Generic 500. The cause belongs in the logs, not the body.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, .. } => Self::not_found(format!("{entity} not found")),
            StoreError::Duplicate { entity, .. } => Self::conflict(format!("{entity} already exists")),
            StoreError::PermissionDenied { .. } => {
                Self::unauthorized("account doesn't belong to the authenticated user")
            }
            other => {
                tracing::error!(error = %other, "Storage failure");
                Self::internal()
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound => Self::not_found("session not found"),
            SessionError::Revoked => Self::unauthorized("session blocked"),
            SessionError::Mismatch => Self::unauthorized("incorrect session"),
            SessionError::Expired => Self::unauthorized("session expired"),
            SessionError::Storage(e) => {
                tracing::error!(error = %e, "Session storage failure");
                Self::internal()
            }
            SessionError::Token(e) => {
                tracing::error!(error = %e, "Credential issuance failed");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::time::Duration;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        assert_eq!(ApiError::unauthorized("x").status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status, StatusCode::FORBIDDEN);
        assert_eq!(ApiError::conflict("x").status, StatusCode::CONFLICT);
        assert_eq!(ApiError::internal().status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn session_errors_map_to_statuses() {
        assert_eq!(ApiError::from(SessionError::NotFound).status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(SessionError::Revoked).status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(SessionError::Mismatch).status, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(SessionError::Expired).status, StatusCode::UNAUTHORIZED);

        let storage = ApiError::from(SessionError::Storage(StoreError::Timeout(Duration::from_secs(5))));
        assert_eq!(storage.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!storage.message.contains("timed out"));
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let dup = ApiError::from(StoreError::Duplicate {
            entity: "user",
            id: "alice".to_string(),
        });
        assert_eq!(dup.status, StatusCode::CONFLICT);
        assert_eq!(dup.message, "user already exists");

        let backend = ApiError::from(StoreError::Backend("disk on fire".to_string()));
        assert_eq!(backend.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!backend.message.contains("disk"));
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }
}
