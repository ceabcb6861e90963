// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints: account creation, login and profile lookup.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use super::ClientInfo;
use crate::auth::password::{
    check_password, hash_password, normalize_email, normalize_username, valid_email,
    valid_password, valid_username,
};
use crate::auth::Auth;
use crate::error::{ApiError, ErrorBody};
use crate::models::{
    CreateUserRequest, LoginUserRequest, LoginUserResponse, UserResponse,
};
use crate::state::AppState;
use crate::storage::User;

/// Create a new account.
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Username already taken", body = ErrorBody),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let username = normalize_username(&req.username);
    if !valid_username(&username) {
        return Err(ApiError::bad_request(
            "username must be 3-50 characters of a-z, 0-9, '_' or '-'",
        ));
    }
    if !valid_password(&req.password) {
        return Err(ApiError::bad_request("password must be at least 6 characters"));
    }
    let email = normalize_email(&req.email);
    if !valid_email(&email) {
        return Err(ApiError::bad_request("invalid email address"));
    }
    let full_name = req.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ApiError::bad_request("full_name is required"));
    }

    let cost = state.settings.bcrypt_cost;
    let password = req.password;
    let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing task failed");
            ApiError::internal()
        })?
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            ApiError::internal()
        })?;

    let now = Utc::now();
    let user = state
        .store
        .create_user(User {
            username,
            hashed_password,
            full_name,
            email,
            is_whitelisted: req.is_whitelisted,
            password_changed_at: now,
            created_at: now,
        })
        .await?;

    tracing::info!(username = %user.username, "User created");
    Ok(Json(user.into()))
}

/// Log in and receive an access/refresh credential pair.
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "Users",
    request_body = LoginUserRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginUserResponse),
        (status = 401, description = "Incorrect password", body = ErrorBody),
        (status = 403, description = "User is not whitelisted", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody),
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    ClientInfo(client): ClientInfo,
    Json(req): Json<LoginUserRequest>,
) -> Result<Json<LoginUserResponse>, ApiError> {
    let username = normalize_username(&req.username);
    let user = state.store.get_user(&username).await?;

    let password = req.password;
    let hashed = user.hashed_password.clone();
    let matches = tokio::task::spawn_blocking(move || check_password(&password, &hashed))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password check task failed");
            ApiError::internal()
        })?;
    if !matches {
        tracing::warn!(username = %user.username, "Login rejected: incorrect password");
        return Err(ApiError::unauthorized("incorrect password"));
    }

    if state.settings.require_user_whitelist && !user.is_whitelisted {
        tracing::warn!(username = %user.username, "Login rejected: user not whitelisted");
        return Err(ApiError::forbidden("user is not whitelisted"));
    }

    let issue = |ttl| {
        state.authority.issue(&user.username, ttl).map_err(|e| {
            tracing::error!(error = %e, "Failed to issue credential");
            ApiError::internal()
        })
    };
    let (access_token, access_payload) = issue(state.settings.access_token_duration)?;
    let (refresh_token, refresh_payload) = issue(state.settings.refresh_token_duration)?;

    let session = state
        .ledger
        .create_session(&user.username, &refresh_token, &refresh_payload, client)
        .await?;

    Ok(Json(LoginUserResponse {
        session_id: session.id,
        access_token,
        access_token_expires_at: access_payload.expires_at,
        refresh_token,
        refresh_token_expires_at: refresh_payload.expires_at,
        user: user.into(),
    }))
}

/// Fetch a profile. The caller must own it.
#[utoipa::path(
    get,
    path = "/users/{username}",
    tag = "Users",
    security(("bearer" = [])),
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Missing credential or not the owner", body = ErrorBody),
        (status = 404, description = "Unknown user", body = ErrorBody),
    )
)]
pub async fn get_user(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    if username != caller.subject {
        tracing::warn!(subject = %caller.subject, requested = %username, "Profile access denied");
        return Err(ApiError::unauthorized(
            "account doesn't belong to the authenticated user",
        ));
    }

    let user = state.store.get_user(&username).await?;
    Ok(Json(user.into()))
}
