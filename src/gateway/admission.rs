// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! IP admission: the first gate every request passes.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;

use super::error::GatewayError;
use super::pipeline::{Outcome, PipelineContext};

pub(crate) const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolved caller address, attached to admitted requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub IpAddr);

/// Static set of caller addresses allowed through the gateway.
#[derive(Debug, Clone)]
pub struct Whitelist {
    allowed: HashSet<IpAddr>,
}

impl Whitelist {
    pub fn new(allowed: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            allowed: allowed.into_iter().map(|ip| ip.to_canonical()).collect(),
        }
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.allowed.contains(&ip.to_canonical())
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Caller address: first `X-Forwarded-For` hop, else the socket peer.
///
/// `None` when a forwarded header is present but unparsable, or when there
/// is neither header nor peer.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(value) = headers.get(X_FORWARDED_FOR) {
        let first = value.to_str().ok()?.split(',').next()?.trim();
        return first.parse::<IpAddr>().ok().map(|ip| ip.to_canonical());
    }
    peer.map(|addr| addr.ip().to_canonical())
}

/// Admission stage.
pub fn admit(mut request: Request, ctx: &PipelineContext) -> Outcome {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    match resolve_client_ip(request.headers(), peer) {
        Some(ip) if ctx.whitelist.contains(ip) => {
            request.extensions_mut().insert(ClientAddr(ip));
            Outcome::Forward(request)
        }
        Some(ip) => {
            tracing::warn!(client_ip = %ip, "Caller not in whitelist");
            Outcome::Reject(GatewayError::AddressNotAllowed)
        }
        None => {
            tracing::warn!("Caller address could not be resolved");
            Outcome::Reject(GatewayError::AddressNotAllowed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn forwarded_for_wins_over_peer() {
        let peer = Some("127.0.0.1:4000".parse().unwrap());
        assert_eq!(
            resolve_client_ip(&forwarded("203.0.113.5, 10.0.0.1"), peer),
            Some("203.0.113.5".parse().unwrap())
        );
    }

    #[test]
    fn peer_is_used_without_header() {
        let peer = Some("[::ffff:10.1.1.1]:4000".parse().unwrap());
        assert_eq!(
            resolve_client_ip(&HeaderMap::new(), peer),
            Some("10.1.1.1".parse().unwrap())
        );
        assert_eq!(resolve_client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn garbage_forwarded_value_resolves_to_none() {
        let peer = Some("127.0.0.1:4000".parse().unwrap());
        assert_eq!(resolve_client_ip(&forwarded("not-an-ip"), peer), None);
    }

    #[test]
    fn whitelist_lookup() {
        let whitelist = Whitelist::new(["10.0.0.1".parse().unwrap()]);
        assert!(whitelist.contains("10.0.0.1".parse().unwrap()));
        assert!(whitelist.contains("::ffff:10.0.0.1".parse().unwrap()));
        assert!(!whitelist.contains("10.0.0.2".parse().unwrap()));
        assert_eq!(whitelist.len(), 1);
    }
}
