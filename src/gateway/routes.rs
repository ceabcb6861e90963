// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path-prefix routing table.
//!
//! Routing rules (default table):
//! - `/auth/*` → auth service (`/users`, `/users/login`, `/token/renew` public)
//! - `/users/*` → user service
//! - `/reports/*` → report service
//! - `/notifications/*` → notification service
//! - `/health` → answered by the gateway itself
//!
//! A prefix matches on a segment boundary: `/users` matches `/users` and
//! `/users/7` but not `/usersx`. The longest matching prefix wins. Routes the
//! gateway answers itself match their exact path only.

use std::sync::Arc;

use axum::extract::Request;
use url::Url;

use super::error::GatewayError;
use super::pipeline::{Outcome, PipelineContext};
use crate::config::{Config, ConfigError};

/// Where a matched request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Reverse proxied to this base URL.
    Upstream(Url),
    /// Fixed liveness answer from the gateway.
    Health,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Name used in logs.
    pub service: &'static str,
    pub prefix: String,
    pub target: Target,
    /// Sub-paths (after the prefix) that skip authentication.
    pub public_paths: Vec<String>,
}

impl Route {
    pub fn new(service: &'static str, prefix: &str, target: Target) -> Self {
        Self {
            service,
            prefix: prefix.trim_end_matches('/').to_string(),
            target,
            public_paths: Vec::new(),
        }
    }

    pub fn with_public_paths(mut self, paths: &[&str]) -> Self {
        self.public_paths = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Path left after the prefix, or `None` when the prefix does not match.
    ///
    /// Stripping is lexical; `/users` leaves an empty path.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if self.target == Target::Health {
            return rest.is_empty().then_some(rest);
        }
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    pub fn is_public(&self, remainder: &str) -> bool {
        self.public_paths.iter().any(|p| p == remainder)
    }
}

/// Route chosen for a request, attached by the routing stage.
#[derive(Debug, Clone)]
pub struct MatchedRoute {
    pub route: Arc<Route>,
    /// Request path with the prefix stripped.
    pub remainder: String,
}

impl MatchedRoute {
    pub fn is_public(&self) -> bool {
        self.route.is_public(&self.remainder)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new(routes: impl IntoIterator<Item = Route>) -> Self {
        let mut routes: Vec<Arc<Route>> = routes.into_iter().map(Arc::new).collect();
        // Longest prefix first.
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    /// The standard table built from configured service addresses.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new([
            Route::new("auth", "/auth", Target::Upstream(config.auth_service_url()?))
                .with_public_paths(&["/users", "/users/login", "/token/renew"]),
            Route::new("user", "/users", Target::Upstream(config.user_service_address.clone())),
            Route::new("report", "/reports", Target::Upstream(config.report_service_address.clone())),
            Route::new(
                "notification",
                "/notifications",
                Target::Upstream(config.notification_service_address.clone()),
            ),
            Route::new("health", "/health", Target::Health).with_public_paths(&[""]),
        ]))
    }

    pub fn resolve(&self, path: &str) -> Option<MatchedRoute> {
        self.routes.iter().find_map(|route| {
            route.strip(path).map(|remainder| MatchedRoute {
                route: Arc::clone(route),
                remainder: remainder.to_string(),
            })
        })
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|r| r.as_ref())
    }
}

/// Routing stage.
pub fn route(mut request: Request, ctx: &PipelineContext) -> Outcome {
    match ctx.routes.resolve(request.uri().path()) {
        Some(matched) => {
            request.extensions_mut().insert(matched);
            Outcome::Forward(request)
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "No route");
            Outcome::Reject(GatewayError::RouteNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(s: &str) -> Target {
        Target::Upstream(Url::parse(s).unwrap())
    }

    fn table() -> RouteTable {
        RouteTable::new([
            Route::new("auth", "/auth", upstream("http://127.0.0.1:8080"))
                .with_public_paths(&["/users", "/users/login", "/token/renew"]),
            Route::new("user", "/users", upstream("http://127.0.0.1:9001")),
            Route::new("user-admin", "/users/admin", upstream("http://127.0.0.1:9009")),
            Route::new("health", "/health", Target::Health).with_public_paths(&[""]),
        ])
    }

    #[test]
    fn prefix_matches_on_segment_boundary() {
        let table = table();
        assert_eq!(table.resolve("/users").unwrap().remainder, "");
        assert_eq!(table.resolve("/users/").unwrap().remainder, "/");
        assert_eq!(table.resolve("/users/alice").unwrap().remainder, "/alice");
        assert!(table.resolve("/usersx").is_none());
        assert!(table.resolve("/").is_none());
        assert!(table.resolve("/unknown/path").is_none());
    }

    #[test]
    fn longest_prefix_wins() {
        let matched = table().resolve("/users/admin/x").unwrap();
        assert_eq!(matched.route.service, "user-admin");
        assert_eq!(matched.remainder, "/x");
    }

    #[test]
    fn public_sub_paths_are_exact() {
        let table = table();
        assert!(table.resolve("/auth/users/login").unwrap().is_public());
        assert!(table.resolve("/auth/token/renew").unwrap().is_public());
        assert!(table.resolve("/auth/users").unwrap().is_public());
        assert!(!table.resolve("/auth/users/alice").unwrap().is_public());
        assert!(!table.resolve("/users/login").unwrap().is_public());
        assert!(table.resolve("/health").unwrap().is_public());
    }

    #[test]
    fn health_matches_exact_path_only() {
        let table = table();
        assert_eq!(table.resolve("/health").unwrap().remainder, "");
        assert!(table.resolve("/health/").is_none());
        assert!(table.resolve("/health/anything").is_none());
        assert!(table.resolve("/healthz").is_none());
    }

    #[test]
    fn trailing_slash_on_prefix_is_ignored() {
        let route = Route::new("x", "/reports/", upstream("http://127.0.0.1:9002"));
        assert_eq!(route.prefix, "/reports");
        assert_eq!(route.strip("/reports/1"), Some("/1"));
    }
}
