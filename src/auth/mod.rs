// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer credential handling shared by the auth service and the gateway,
//! plus password hashing and account input rules.
//!
//! ## Auth Flow
//!
//! 1. Client logs in and receives an access and a refresh credential
//! 2. Client sends `Authorization: Bearer <access credential>`
//! 3. Server:
//!    - Parses the header (scheme is case-insensitive)
//!    - Verifies the credential with the shared symmetric key
//!    - Exposes the decoded payload; `subject` is the username
//!
//! ## Security
//!
//! - Verification is stateless; no storage lookup per request
//! - Only the renewal endpoint consults the session ledger
//! - Credentials and passwords are never logged

pub mod bearer;
pub mod error;
pub mod extractor;
pub mod password;

pub use bearer::{authenticate, bearer_token};
pub use error::AuthError;
pub use extractor::Auth;
