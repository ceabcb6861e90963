// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DEFAULT_BCRYPT_COST};
use crate::session::SessionLedger;
use crate::storage::StoreClient;
use crate::token::TokenAuthority;

/// Credential lifetimes and account policy used by the auth handlers.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
    pub bcrypt_cost: u32,
    /// Refuse login for users without the whitelisted flag.
    pub require_user_whitelist: bool,
}

impl AuthSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_token_duration: config.access_token_duration,
            refresh_token_duration: config.refresh_token_duration,
            bcrypt_cost: config.bcrypt_cost,
            require_user_whitelist: config.require_user_whitelist,
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            access_token_duration: Duration::from_secs(15 * 60),
            refresh_token_duration: Duration::from_secs(24 * 60 * 60),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            require_user_whitelist: false,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub authority: Arc<TokenAuthority>,
    pub ledger: SessionLedger,
    pub store: StoreClient,
    pub settings: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(authority: Arc<TokenAuthority>, store: StoreClient, settings: AuthSettings) -> Self {
        let ledger = SessionLedger::new(
            Arc::clone(&authority),
            store.clone(),
            settings.access_token_duration,
        );
        Self {
            authority,
            ledger,
            store,
            settings: Arc::new(settings),
        }
    }
}
