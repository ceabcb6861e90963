// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and the validated [`Config`] loaded
//! once at startup. Any invalid value is fatal before a socket is bound.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ENVIRONMENT` | `development`, `production` or `testing` | `development` |
//! | `DB_SOURCE` | Path of the redb database file | Required |
//! | `STORE_BACKEND` | `redb` or `memory` | `redb` |
//! | `AUTH_SERVER_ADDRESS` | Auth service bind address | `127.0.0.1:8080` |
//! | `GATEWAY_SERVER_ADDRESS` | Gateway bind address | `127.0.0.1:8081` |
//! | `USER_SERVICE_ADDRESS` | Base URL of the user service | Required |
//! | `REPORT_SERVICE_ADDRESS` | Base URL of the report service | Required |
//! | `NOTIFICATION_SERVICE_ADDRESS` | Base URL of the notification service | Required |
//! | `TOKEN_SYMMETRIC_KEY` | 32-character credential key | Required |
//! | `ACCESS_TOKEN_DURATION` | Access credential lifetime | `15m` |
//! | `REFRESH_TOKEN_DURATION` | Refresh credential lifetime | `24h` |
//! | `ALLOWED_IPS` | Comma separated caller whitelist | `127.0.0.1` |
//! | `RATE_LIMIT_MODE` | `global` or `per_client` | `global` |
//! | `RATE_LIMIT_RPS` | Bucket refill, tokens per second | `5` |
//! | `RATE_LIMIT_BURST` | Bucket capacity | `10` |
//! | `RATE_LIMIT_MAX_CLIENTS` | Per-client buckets kept in memory | `10000` |
//! | `UPSTREAM_TIMEOUT` | Proxied request timeout | `30s` |
//! | `STORAGE_TIMEOUT` | Storage call timeout | `5s` |
//! | `BCRYPT_COST` | Password hashing cost (4..=31) | `10` |
//! | `REQUIRE_USER_WHITELIST` | Only whitelisted users may log in | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Values may also come from an `app.env` file in the working directory;
//! the real environment wins.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use url::Url;

use crate::token::SYMMETRIC_KEY_LEN;

pub const ENVIRONMENT_ENV: &str = "ENVIRONMENT";
pub const DB_SOURCE_ENV: &str = "DB_SOURCE";
pub const STORE_BACKEND_ENV: &str = "STORE_BACKEND";
pub const AUTH_SERVER_ADDRESS_ENV: &str = "AUTH_SERVER_ADDRESS";
pub const GATEWAY_SERVER_ADDRESS_ENV: &str = "GATEWAY_SERVER_ADDRESS";
pub const USER_SERVICE_ADDRESS_ENV: &str = "USER_SERVICE_ADDRESS";
pub const REPORT_SERVICE_ADDRESS_ENV: &str = "REPORT_SERVICE_ADDRESS";
pub const NOTIFICATION_SERVICE_ADDRESS_ENV: &str = "NOTIFICATION_SERVICE_ADDRESS";

/// Environment variable name for the shared credential key.
///
/// Never logged. Must be exactly [`SYMMETRIC_KEY_LEN`] characters.
pub const TOKEN_SYMMETRIC_KEY_ENV: &str = "TOKEN_SYMMETRIC_KEY";
pub const ACCESS_TOKEN_DURATION_ENV: &str = "ACCESS_TOKEN_DURATION";
pub const REFRESH_TOKEN_DURATION_ENV: &str = "REFRESH_TOKEN_DURATION";
pub const ALLOWED_IPS_ENV: &str = "ALLOWED_IPS";
pub const RATE_LIMIT_MODE_ENV: &str = "RATE_LIMIT_MODE";
pub const RATE_LIMIT_RPS_ENV: &str = "RATE_LIMIT_RPS";
pub const RATE_LIMIT_BURST_ENV: &str = "RATE_LIMIT_BURST";
pub const RATE_LIMIT_MAX_CLIENTS_ENV: &str = "RATE_LIMIT_MAX_CLIENTS";
pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT";
pub const STORAGE_TIMEOUT_ENV: &str = "STORAGE_TIMEOUT";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";
pub const REQUIRE_USER_WHITELIST_ENV: &str = "REQUIRE_USER_WHITELIST";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Optional dotenv-style file read before the environment.
pub const CONFIG_FILE: &str = "app.env";

pub const DEFAULT_AUTH_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_GATEWAY_SERVER_ADDRESS: &str = "127.0.0.1:8081";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Keys that must never protect production credentials.
const UNSAFE_KEYS: &[&str] = &[
    "12345678901234567890123456789012",
    "abcdefghijklmnopqrstuvwxyz123456",
    "00000000000000000000000000000000",
    "11111111111111111111111111111111",
    "testtesttesttesttesttesttest1234",
];

/// Minimum distinct characters in a production key.
const MIN_DISTINCT_KEY_CHARS: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("{0}")]
    Unsafe(String),
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Testing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redb,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitMode {
    /// One bucket shared by every caller.
    Global,
    /// One bucket per resolved caller address.
    PerClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub mode: RateLimitMode,
    /// Tokens added per second. Zero disables refill.
    pub rps: u32,
    /// Bucket capacity, at least 1.
    pub burst: u32,
    pub max_clients: usize,
}

/// Credential key material. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenKey(String);

impl TokenKey {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKey([redacted])")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub environment: Environment,
    pub db_source: PathBuf,
    pub store_backend: StoreBackend,
    pub auth_server_address: SocketAddr,
    pub gateway_server_address: SocketAddr,
    pub user_service_address: Url,
    pub report_service_address: Url,
    pub notification_service_address: Url,
    pub token_symmetric_key: TokenKey,
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
    pub allowed_ips: Vec<IpAddr>,
    pub rate_limit: RateLimitConfig,
    pub upstream_timeout: Duration,
    pub storage_timeout: Duration,
    pub bcrypt_cost: u32,
    pub require_user_whitelist: bool,
    pub log_format: LogFormat,
    pub rust_log: String,
}

impl Config {
    /// Load from `app.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::from_filename(CONFIG_FILE).ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let environment = match get(ENVIRONMENT_ENV).as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some("testing") => Environment::Testing,
            Some(other) => {
                return Err(invalid(
                    ENVIRONMENT_ENV,
                    format!("'{other}', must be one of: development, production, testing"),
                ))
            }
        };
        let production = environment == Environment::Production;

        let store_backend = match get(STORE_BACKEND_ENV).as_deref() {
            None | Some("redb") => StoreBackend::Redb,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(invalid(
                    STORE_BACKEND_ENV,
                    format!("'{other}', must be redb or memory"),
                ))
            }
        };
        if production && store_backend == StoreBackend::Memory {
            return Err(ConfigError::Unsafe(
                "in-memory store is not allowed in production".to_string(),
            ));
        }

        let db_source = required(DB_SOURCE_ENV)?;
        if production && db_source.contains("admin:admin") {
            return Err(ConfigError::Unsafe(
                "default database credentials detected in production".to_string(),
            ));
        }

        let token_symmetric_key = validate_key(&required(TOKEN_SYMMETRIC_KEY_ENV)?, production)?;

        let access_token_duration = parse_ttl(ACCESS_TOKEN_DURATION_ENV, get(ACCESS_TOKEN_DURATION_ENV), "15m")?;
        let refresh_token_duration =
            parse_ttl(REFRESH_TOKEN_DURATION_ENV, get(REFRESH_TOKEN_DURATION_ENV), "24h")?;
        if refresh_token_duration <= access_token_duration {
            return Err(invalid(
                REFRESH_TOKEN_DURATION_ENV,
                "must be longer than ACCESS_TOKEN_DURATION",
            ));
        }

        let allowed_ips = parse_allowed_ips(
            get(ALLOWED_IPS_ENV).as_deref().unwrap_or("127.0.0.1"),
            production,
        )?;

        let rate_limit = RateLimitConfig {
            mode: match get(RATE_LIMIT_MODE_ENV).as_deref() {
                None | Some("global") => RateLimitMode::Global,
                Some("per_client") => RateLimitMode::PerClient,
                Some(other) => {
                    return Err(invalid(
                        RATE_LIMIT_MODE_ENV,
                        format!("'{other}', must be global or per_client"),
                    ))
                }
            },
            rps: parse_number(RATE_LIMIT_RPS_ENV, get(RATE_LIMIT_RPS_ENV), 5)?,
            burst: parse_number(RATE_LIMIT_BURST_ENV, get(RATE_LIMIT_BURST_ENV), 10)?,
            max_clients: parse_number(RATE_LIMIT_MAX_CLIENTS_ENV, get(RATE_LIMIT_MAX_CLIENTS_ENV), 10_000)?,
        };
        if rate_limit.burst == 0 {
            return Err(invalid(RATE_LIMIT_BURST_ENV, "must be at least 1"));
        }
        if rate_limit.max_clients == 0 {
            return Err(invalid(RATE_LIMIT_MAX_CLIENTS_ENV, "must be at least 1"));
        }

        let bcrypt_cost = parse_number(BCRYPT_COST_ENV, get(BCRYPT_COST_ENV), DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid(BCRYPT_COST_ENV, "must be between 4 and 31"));
        }

        let require_user_whitelist = match get(REQUIRE_USER_WHITELIST_ENV).as_deref() {
            None => false,
            Some(v) => v
                .parse::<bool>()
                .map_err(|_| invalid(REQUIRE_USER_WHITELIST_ENV, "must be true or false"))?,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            environment,
            db_source: PathBuf::from(db_source),
            store_backend,
            auth_server_address: parse_socket_addr(
                AUTH_SERVER_ADDRESS_ENV,
                get(AUTH_SERVER_ADDRESS_ENV),
                DEFAULT_AUTH_SERVER_ADDRESS,
            )?,
            gateway_server_address: parse_socket_addr(
                GATEWAY_SERVER_ADDRESS_ENV,
                get(GATEWAY_SERVER_ADDRESS_ENV),
                DEFAULT_GATEWAY_SERVER_ADDRESS,
            )?,
            user_service_address: parse_url(USER_SERVICE_ADDRESS_ENV, required(USER_SERVICE_ADDRESS_ENV)?)?,
            report_service_address: parse_url(REPORT_SERVICE_ADDRESS_ENV, required(REPORT_SERVICE_ADDRESS_ENV)?)?,
            notification_service_address: parse_url(
                NOTIFICATION_SERVICE_ADDRESS_ENV,
                required(NOTIFICATION_SERVICE_ADDRESS_ENV)?,
            )?,
            token_symmetric_key,
            access_token_duration,
            refresh_token_duration,
            allowed_ips,
            rate_limit,
            upstream_timeout: parse_duration(UPSTREAM_TIMEOUT_ENV, get(UPSTREAM_TIMEOUT_ENV), "30s")?,
            storage_timeout: parse_duration(STORAGE_TIMEOUT_ENV, get(STORAGE_TIMEOUT_ENV), "5s")?,
            bcrypt_cost,
            require_user_whitelist,
            log_format,
            rust_log: get(RUST_LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Base URL the gateway uses to reach the auth service.
    pub fn auth_service_url(&self) -> Result<Url, ConfigError> {
        let host = match self.auth_server_address.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };
        let addr = SocketAddr::new(host, self.auth_server_address.port());
        parse_url(AUTH_SERVER_ADDRESS_ENV, format!("http://{addr}"))
    }
}

fn validate_key(key: &str, production: bool) -> Result<TokenKey, ConfigError> {
    if key.len() != SYMMETRIC_KEY_LEN {
        return Err(invalid(
            TOKEN_SYMMETRIC_KEY_ENV,
            format!("must be exactly {SYMMETRIC_KEY_LEN} characters, got {}", key.len()),
        ));
    }
    if production {
        if UNSAFE_KEYS.contains(&key) {
            return Err(ConfigError::Unsafe(
                "unsafe symmetric key detected in production environment".to_string(),
            ));
        }
        let distinct: HashSet<char> = key.chars().collect();
        if distinct.len() < MIN_DISTINCT_KEY_CHARS {
            return Err(ConfigError::Unsafe(
                "symmetric key has low entropy, use a cryptographically secure key".to_string(),
            ));
        }
    }
    Ok(TokenKey(key.to_string()))
}

fn parse_allowed_ips(raw: &str, production: bool) -> Result<Vec<IpAddr>, ConfigError> {
    let mut ips = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if entry.eq_ignore_ascii_case("localhost") {
            ips.push(IpAddr::V4(Ipv4Addr::LOCALHOST));
            ips.push(IpAddr::V6(Ipv6Addr::LOCALHOST));
            continue;
        }
        let ip = entry
            .parse::<IpAddr>()
            .map_err(|_| invalid(ALLOWED_IPS_ENV, format!("'{entry}' is not an IP address")))?;
        ips.push(ip);
    }

    if ips.is_empty() {
        return Err(invalid(ALLOWED_IPS_ENV, "must contain at least one IP address"));
    }
    if production && ips.iter().any(IpAddr::is_loopback) {
        return Err(ConfigError::Unsafe(
            "localhost IPs detected in production environment".to_string(),
        ));
    }
    Ok(ips)
}

fn parse_duration(
    name: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<Duration, ConfigError> {
    let raw = value.as_deref().unwrap_or(default);
    let duration = humantime::parse_duration(raw).map_err(|e| invalid(name, e.to_string()))?;
    if duration.is_zero() {
        return Err(invalid(name, "must be greater than zero"));
    }
    Ok(duration)
}

/// A credential lifetime: a duration whose expiry is representable from now.
fn parse_ttl(name: &'static str, value: Option<String>, default: &str) -> Result<Duration, ConfigError> {
    let ttl = parse_duration(name, value, default)?;
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| invalid(name, "too large to compute a credential expiry"))?;
    Ok(ttl)
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| invalid(name, format!("'{raw}' is not a valid number"))),
    }
}

fn parse_socket_addr(
    name: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<SocketAddr, ConfigError> {
    let raw = value.as_deref().unwrap_or(default);
    let raw = raw.replace("localhost", "127.0.0.1");
    raw.parse()
        .map_err(|_| invalid(name, format!("'{raw}' is not a host:port address")))
}

fn parse_url(name: &'static str, raw: String) -> Result<Url, ConfigError> {
    let url = Url::parse(&raw).map_err(|e| invalid(name, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(name, format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const GOOD_KEY: &str = "Xk29fQ7mZpL4wR8vN1cT6yB3hJ5dG0sE";

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            (DB_SOURCE_ENV, "/tmp/gateway.redb".to_string()),
            (TOKEN_SYMMETRIC_KEY_ENV, GOOD_KEY.to_string()),
            (USER_SERVICE_ADDRESS_ENV, "http://127.0.0.1:9001".to_string()),
            (REPORT_SERVICE_ADDRESS_ENV, "http://127.0.0.1:9002".to_string()),
            (NOTIFICATION_SERVICE_ADDRESS_ENV, "http://127.0.0.1:9003".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base()).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.store_backend, StoreBackend::Redb);
        assert_eq!(config.auth_server_address, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.gateway_server_address, "127.0.0.1:8081".parse().unwrap());
        assert_eq!(config.access_token_duration, Duration::from_secs(15 * 60));
        assert_eq!(config.refresh_token_duration, Duration::from_secs(24 * 3600));
        assert_eq!(config.allowed_ips, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
        assert_eq!(config.rate_limit.mode, RateLimitMode::Global);
        assert_eq!(config.rate_limit.rps, 5);
        assert_eq!(config.rate_limit.burst, 10);
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
        assert_eq!(config.storage_timeout, Duration::from_secs(5));
        assert_eq!(config.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert!(!config.require_user_whitelist);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.rust_log, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn missing_required_values_are_reported() {
        for name in [
            DB_SOURCE_ENV,
            TOKEN_SYMMETRIC_KEY_ENV,
            USER_SERVICE_ADDRESS_ENV,
            REPORT_SERVICE_ADDRESS_ENV,
            NOTIFICATION_SERVICE_ADDRESS_ENV,
        ] {
            let mut vars = base();
            vars.remove(name);
            assert_eq!(load(&vars).unwrap_err(), ConfigError::Missing(name));
        }
    }

    #[test]
    fn key_must_be_32_characters() {
        let mut vars = base();
        vars.insert(TOKEN_SYMMETRIC_KEY_ENV, "short".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: TOKEN_SYMMETRIC_KEY_ENV, .. })
        ));
    }

    #[test]
    fn production_rejects_weak_keys_and_loopback() {
        let mut vars = base();
        vars.insert(ENVIRONMENT_ENV, "production".to_string());
        vars.insert(ALLOWED_IPS_ENV, "10.0.0.1".to_string());
        assert!(load(&vars).is_ok());

        vars.insert(TOKEN_SYMMETRIC_KEY_ENV, "12345678901234567890123456789012".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Unsafe(_))));

        vars.insert(TOKEN_SYMMETRIC_KEY_ENV, "abababababababababababababababab".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Unsafe(_))));

        vars.insert(TOKEN_SYMMETRIC_KEY_ENV, GOOD_KEY.to_string());
        vars.insert(ALLOWED_IPS_ENV, "10.0.0.1, 127.0.0.1".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Unsafe(_))));
    }

    #[test]
    fn weak_key_is_fine_outside_production() {
        let mut vars = base();
        vars.insert(TOKEN_SYMMETRIC_KEY_ENV, "12345678901234567890123456789012".to_string());
        assert!(load(&vars).is_ok());
    }

    #[test]
    fn refresh_must_outlive_access() {
        let mut vars = base();
        vars.insert(ACCESS_TOKEN_DURATION_ENV, "1h".to_string());
        vars.insert(REFRESH_TOKEN_DURATION_ENV, "30m".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: REFRESH_TOKEN_DURATION_ENV, .. })
        ));
    }

    #[test]
    fn unrepresentable_ttl_is_rejected_at_startup() {
        // Past the calendar limit, then past the signed duration limit.
        for huge in ["300000y", "400000000y"] {
            let mut vars = base();
            vars.insert(ACCESS_TOKEN_DURATION_ENV, huge.to_string());
            vars.insert(REFRESH_TOKEN_DURATION_ENV, "500000000y".to_string());
            assert!(
                matches!(
                    load(&vars),
                    Err(ConfigError::Invalid { name: ACCESS_TOKEN_DURATION_ENV, .. })
                ),
                "{huge} accepted"
            );
        }
    }

    #[test]
    fn allowed_ips_are_parsed_and_localhost_expands() {
        let mut vars = base();
        vars.insert(ALLOWED_IPS_ENV, " 10.0.0.1 ,localhost,".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(
            config.allowed_ips,
            vec![
                "10.0.0.1".parse::<IpAddr>().unwrap(),
                IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(Ipv6Addr::LOCALHOST),
            ]
        );

        vars.insert(ALLOWED_IPS_ENV, "not-an-ip".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn rate_limit_settings_are_validated() {
        let mut vars = base();
        vars.insert(RATE_LIMIT_MODE_ENV, "per_client".to_string());
        vars.insert(RATE_LIMIT_RPS_ENV, "0".to_string());
        vars.insert(RATE_LIMIT_BURST_ENV, "3".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.rate_limit.mode, RateLimitMode::PerClient);
        assert_eq!(config.rate_limit.rps, 0);
        assert_eq!(config.rate_limit.burst, 3);

        vars.insert(RATE_LIMIT_BURST_ENV, "0".to_string());
        assert!(load(&vars).is_err());

        vars.insert(RATE_LIMIT_BURST_ENV, "1".to_string());
        vars.insert(RATE_LIMIT_MODE_ENV, "sometimes".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn bcrypt_cost_is_bounded() {
        let mut vars = base();
        vars.insert(BCRYPT_COST_ENV, "3".to_string());
        assert!(load(&vars).is_err());
        vars.insert(BCRYPT_COST_ENV, "4".to_string());
        assert_eq!(load(&vars).unwrap().bcrypt_cost, 4);
    }

    #[test]
    fn memory_backend_is_refused_in_production() {
        let mut vars = base();
        vars.insert(ENVIRONMENT_ENV, "production".to_string());
        vars.insert(ALLOWED_IPS_ENV, "10.0.0.1".to_string());
        vars.insert(STORE_BACKEND_ENV, "memory".to_string());
        assert!(matches!(load(&vars), Err(ConfigError::Unsafe(_))));
    }

    #[test]
    fn service_addresses_must_be_http_urls() {
        let mut vars = base();
        vars.insert(USER_SERVICE_ADDRESS_ENV, "ftp://files".to_string());
        assert!(load(&vars).is_err());
    }

    #[test]
    fn auth_service_url_maps_unspecified_host_to_loopback() {
        let mut vars = base();
        vars.insert(AUTH_SERVER_ADDRESS_ENV, "0.0.0.0:7000".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.auth_service_url().unwrap().as_str(), "http://127.0.0.1:7000/");
    }

    #[test]
    fn key_is_redacted_in_debug() {
        let config = load(&base()).unwrap();
        assert!(!format!("{config:?}").contains(GOOD_KEY));
    }
}
