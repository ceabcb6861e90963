// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential renewal and session revocation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::Auth;
use crate::error::{ApiError, ErrorBody};
use crate::models::{RenewAccessTokenRequest, RenewAccessTokenResponse};
use crate::state::AppState;
use crate::storage::OwnershipEnforcer;

/// Exchange a refresh credential for a new access credential.
///
/// The refresh credential itself is returned to no one and stays valid.
#[utoipa::path(
    post,
    path = "/token/renew",
    tag = "Tokens",
    request_body = RenewAccessTokenRequest,
    responses(
        (status = 200, description = "New access credential", body = RenewAccessTokenResponse),
        (status = 401, description = "Invalid credential or session blocked, mismatched or expired", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody),
    )
)]
pub async fn renew_access_token(
    State(state): State<AppState>,
    Json(req): Json<RenewAccessTokenRequest>,
) -> Result<Json<RenewAccessTokenResponse>, ApiError> {
    let refresh_payload = state.authority.verify(&req.refresh_token).map_err(|e| {
        tracing::warn!(reason = %e, "Refresh credential rejected");
        ApiError::unauthorized(e.to_string())
    })?;

    let (access_token, access_payload) = state
        .ledger
        .renew(&refresh_payload, &req.refresh_token)
        .await?;

    Ok(Json(RenewAccessTokenResponse {
        access_token,
        access_token_expires_at: access_payload.expires_at,
    }))
}

/// Revoke one of the caller's sessions (logout).
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/revoke",
    tag = "Tokens",
    security(("bearer" = [])),
    params(("session_id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing credential or not the owner", body = ErrorBody),
        (status = 404, description = "Session not found", body = ErrorBody),
    )
)]
pub async fn revoke_session(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state.ledger.get(session_id).await?;
    session.verify_ownership(&caller).map_err(|e| {
        tracing::warn!(error = %e, "Session revocation denied");
        ApiError::from(e)
    })?;

    state.ledger.revoke(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
