// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gateway server: gate-keeping pipeline plus dispatch.
//!
//! Every request, whatever its path, goes through the [`Pipeline`]. A
//! forwarded request is then answered locally (`/health`) or streamed to the
//! backend its route points at.

pub mod admission;
pub mod authn;
pub mod error;
pub mod pipeline;
pub mod proxy;
pub mod rate_limit;
pub mod routes;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};

use crate::api::with_http_layers;
use crate::config::{Config, ConfigError, UPSTREAM_TIMEOUT_ENV};
use crate::token::TokenAuthority;

pub use admission::{ClientAddr, Whitelist};
pub use error::GatewayError;
pub use pipeline::{Outcome, Pipeline, PipelineContext};
pub use proxy::UpstreamClient;
pub use rate_limit::{RateLimiter, TokenBucket};
pub use routes::{MatchedRoute, Route, RouteTable, Target};

/// Liveness answer for `/health`.
pub const HEALTH_MESSAGE: &str = "Gateway is healthy";

#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub upstream: UpstreamClient,
}

impl GatewayState {
    pub fn new(pipeline: Pipeline, upstream: UpstreamClient) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            upstream,
        }
    }

    /// Standard pipeline and upstream client for `config`.
    pub fn from_config(config: &Config, authority: Arc<TokenAuthority>) -> Result<Self, ConfigError> {
        let routes = RouteTable::from_config(config)?;
        for route in routes.routes() {
            match &route.target {
                Target::Upstream(url) => {
                    tracing::info!(service = route.service, prefix = %route.prefix, upstream = %url, "Route registered")
                }
                Target::Health => {
                    tracing::info!(service = route.service, prefix = %route.prefix, "Route registered")
                }
            }
        }

        let upstream = UpstreamClient::new(config.upstream_timeout).map_err(|e| ConfigError::Invalid {
            name: UPSTREAM_TIMEOUT_ENV,
            reason: format!("failed to build upstream client: {e}"),
        })?;

        let pipeline = Pipeline::new(PipelineContext {
            whitelist: Whitelist::new(config.allowed_ips.iter().copied()),
            limiter: RateLimiter::from_config(&config.rate_limit),
            routes,
            authority,
        });

        Ok(Self::new(pipeline, upstream))
    }
}

pub fn router(state: GatewayState) -> Router {
    with_http_layers(Router::new().fallback(handle).with_state(state))
}

async fn handle(State(state): State<GatewayState>, request: Request) -> Response {
    match state.pipeline.run(request) {
        Outcome::Forward(request) => dispatch(&state, request)
            .await
            .unwrap_or_else(IntoResponse::into_response),
        Outcome::Reject(e) => e.into_response(),
    }
}

async fn dispatch(state: &GatewayState, request: Request) -> Result<Response, GatewayError> {
    let Some(matched) = request.extensions().get::<MatchedRoute>().cloned() else {
        tracing::error!("Forwarded request has no matched route");
        return Err(GatewayError::RouteNotFound);
    };

    match &matched.route.target {
        Target::Health => Ok((StatusCode::OK, HEALTH_MESSAGE).into_response()),
        Target::Upstream(base) => {
            state
                .upstream
                .forward(matched.route.service, base, &matched.remainder, request)
                .await
        }
    }
}
