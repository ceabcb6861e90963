// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conditional bearer authentication stage.

use axum::extract::Request;

use super::error::GatewayError;
use super::pipeline::{Outcome, PipelineContext};
use super::routes::MatchedRoute;
use crate::auth::bearer;

/// Skips public sub-paths of the matched route; everything else needs a
/// valid access credential, whose payload is attached to the request.
pub fn authenticate(mut request: Request, ctx: &PipelineContext) -> Outcome {
    let public = request
        .extensions()
        .get::<MatchedRoute>()
        .is_some_and(MatchedRoute::is_public);
    if public {
        return Outcome::Forward(request);
    }

    match bearer::authenticate(request.headers(), &ctx.authority) {
        Ok(payload) => {
            request.extensions_mut().insert(payload);
            Outcome::Forward(request)
        }
        Err(e) => {
            tracing::warn!(path = %request.uri().path(), reason = e.error_code(), "Authentication failed");
            Outcome::Reject(GatewayError::AuthRequired(e))
        }
    }
}
