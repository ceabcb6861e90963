// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token bucket rate limiting, global or per caller address.

use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::extract::Request;
use lru::LruCache;

use super::admission::ClientAddr;
use super::error::GatewayError;
use super::pipeline::{Outcome, PipelineContext};
use crate::config::{RateLimitConfig, RateLimitMode};

/// Tokens are stored scaled by this factor for sub-token refill precision.
const SCALE: u64 = 1000;

/// Token bucket.
///
/// - Refilled at `rate` tokens per second, computed lazily on each check
/// - Capacity is `burst`; a new bucket starts full
/// - Each admitted request consumes one token
///
/// Refill and consume happen under one lock, so two concurrent callers can
/// never both take the last token.
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    rate: u64,
    burst: u64,
}

#[derive(Debug)]
struct BucketState {
    /// Current tokens, scaled by [`SCALE`].
    tokens: u64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(rate: u64, burst: u64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: burst.saturating_mul(SCALE),
                last_refill: Instant::now(),
            }),
            rate,
            burst,
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed_ms = u64::try_from(now.saturating_duration_since(state.last_refill).as_millis())
            .unwrap_or(u64::MAX);
        if elapsed_ms > 0 {
            // tokens/s * ms == scaled tokens
            let added = elapsed_ms.saturating_mul(self.rate);
            state.tokens = state
                .tokens
                .saturating_add(added)
                .min(self.burst.saturating_mul(SCALE));
            state.last_refill = now;
        }

        if state.tokens < SCALE {
            return false;
        }
        state.tokens -= SCALE;
        true
    }
}

/// Limiter policy chosen at startup.
pub enum RateLimiter {
    /// One bucket for all callers.
    Global(TokenBucket),
    /// One bucket per caller address, least recently seen evicted first.
    PerClient {
        buckets: Mutex<LruCache<IpAddr, Arc<TokenBucket>>>,
        rate: u64,
        burst: u64,
    },
}

impl RateLimiter {
    pub fn global(rate: u64, burst: u64) -> Self {
        RateLimiter::Global(TokenBucket::new(rate, burst))
    }

    pub fn per_client(rate: u64, burst: u64, max_clients: usize) -> Self {
        RateLimiter::PerClient {
            buckets: Mutex::new(LruCache::new(
                NonZeroUsize::new(max_clients).unwrap_or(NonZeroUsize::MIN),
            )),
            rate,
            burst,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let rate = u64::from(config.rps);
        let burst = u64::from(config.burst);
        match config.mode {
            RateLimitMode::Global => Self::global(rate, burst),
            RateLimitMode::PerClient => Self::per_client(rate, burst, config.max_clients),
        }
    }

    /// Consume a token for `client`. The global policy ignores the address.
    pub fn check(&self, client: IpAddr) -> bool {
        match self {
            RateLimiter::Global(bucket) => bucket.try_acquire(),
            RateLimiter::PerClient {
                buckets,
                rate,
                burst,
            } => {
                let bucket = {
                    let mut buckets = buckets.lock().unwrap_or_else(PoisonError::into_inner);
                    Arc::clone(buckets.get_or_insert(client, || Arc::new(TokenBucket::new(*rate, *burst))))
                };
                bucket.try_acquire()
            }
        }
    }
}

/// Rate limiting stage. Runs after admission, which attaches [`ClientAddr`].
pub fn limit(request: Request, ctx: &PipelineContext) -> Outcome {
    let Some(&ClientAddr(client)) = request.extensions().get::<ClientAddr>() else {
        tracing::error!("Rate limiter reached without a resolved client address");
        return Outcome::Reject(GatewayError::AddressNotAllowed);
    };

    if ctx.limiter.check(client) {
        Outcome::Forward(request)
    } else {
        tracing::warn!(client_ip = %client, "Rate limit exceeded");
        Outcome::Reject(GatewayError::RateLimited)
    }
}
