// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ordered gate-keeping stages in front of dispatch.
//!
//! ```text
//! admission -> rate limit -> route -> authenticate -> (dispatch)
//! ```
//!
//! Each stage takes the request and either forwards it, possibly with new
//! extensions, or rejects it. The first rejection ends the run.

use std::sync::Arc;

use axum::extract::Request;

use super::admission::{self, Whitelist};
use super::authn;
use super::error::GatewayError;
use super::rate_limit::{self, RateLimiter};
use super::routes::{self, RouteTable};
use crate::token::TokenAuthority;

/// Result of one stage.
pub enum Outcome {
    Forward(Request),
    Reject(GatewayError),
}

pub type Stage = fn(Request, &PipelineContext) -> Outcome;

/// Shared state the stages read. Built once at startup.
pub struct PipelineContext {
    pub whitelist: Whitelist,
    pub limiter: RateLimiter,
    pub routes: RouteTable,
    pub authority: Arc<TokenAuthority>,
}

pub struct Pipeline {
    ctx: PipelineContext,
    stages: Vec<(&'static str, Stage)>,
}

impl Pipeline {
    /// The standard stage order.
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            stages: vec![
                ("admission", admission::admit as Stage),
                ("rate_limit", rate_limit::limit),
                ("route", routes::route),
                ("authenticate", authn::authenticate),
            ],
        }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    pub fn run(&self, mut request: Request) -> Outcome {
        for (name, stage) in &self.stages {
            match stage(request, &self.ctx) {
                Outcome::Forward(next) => request = next,
                Outcome::Reject(e) => {
                    tracing::debug!(stage = *name, error = %e, "Request rejected");
                    return Outcome::Reject(e);
                }
            }
        }
        Outcome::Forward(request)
    }
}
