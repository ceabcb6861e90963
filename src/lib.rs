// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge Gateway - credential authority and authenticating reverse proxy
//!
//! Two HTTP servers share one process: the auth service, which registers
//! users and issues PASETO credentials tracked by a session ledger, and the
//! gateway, which admits, rate limits, routes and authenticates every request
//! before streaming it to a backend service.
//!
//! ## Modules
//!
//! - `api` - Auth service HTTP handlers (Axum)
//! - `auth` - Bearer extraction, password hashing, input validation
//! - `gateway` - Request pipeline and streaming proxy
//! - `session` - Session ledger (create, renew, revoke)
//! - `storage` - User and session persistence (redb or in-memory)
//! - `token` - PASETO v4.local credential authority

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod token;
