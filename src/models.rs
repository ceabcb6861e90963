// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the auth service. All types derive
//! `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Users**: account creation and profile view
//! - **Login**: credential pair issuance
//! - **Renewal**: access credential refresh

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::User;

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub is_whitelisted: bool,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserResponse {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub is_whitelisted: bool,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            is_whitelisted: user.is_whitelisted,
            password_changed_at: user.password_changed_at,
            created_at: user.created_at,
        }
    }
}

// =============================================================================
// Login
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginUserResponse {
    pub session_id: Uuid,
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

// =============================================================================
// Renewal
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenewAccessTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenewAccessTokenResponse {
    pub access_token: String,
    pub access_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_drops_password_hash() {
        let user = User {
            username: "alice".to_string(),
            hashed_password: "$2b$04$secret".to_string(),
            full_name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            is_whitelisted: true,
            password_changed_at: Utc::now(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn is_whitelisted_defaults_to_false() {
        let req: CreateUserRequest = serde_json::from_str(
            r#"{"username":"alice","password":"secret1","full_name":"Alice","email":"a@b.io"}"#,
        )
        .unwrap();
        assert!(!req.is_whitelisted);
    }
}
