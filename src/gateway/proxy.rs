// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Streaming reverse proxy to backend services.
//!
//! Handles:
//! - Path rewriting (matched prefix stripped, query kept)
//! - Header passthrough minus hop-by-hop headers
//! - `X-Forwarded-For` extended with the connecting peer
//! - Request and response bodies streamed, never buffered
//!
//! A failed upstream call is a 502 and is not retried. The upstream timeout
//! bounds connecting and each idle wait for bytes, never the whole exchange,
//! so long streams are not cut off.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, Request},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::Response,
};
use url::Url;

use super::admission::{ClientAddr, X_FORWARDED_FOR};
use super::error::GatewayError;

/// Headers that describe one connection and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// HTTP client for forwarding requests to backend services.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Forward `request` to `base` with its path replaced by `remainder`.
    pub async fn forward(
        &self,
        service: &str,
        base: &Url,
        remainder: &str,
        request: Request,
    ) -> Result<Response, GatewayError> {
        let target = target_url(base, remainder, request.uri().query());
        let (parts, body) = request.into_parts();

        let mut headers = forwardable(&parts.headers, true);
        if let Some(peer) = forwarding_peer(&parts) {
            append_forwarded_for(&mut headers, peer);
        }

        let mut outbound = self
            .client
            .request(parts.method.clone(), target.clone())
            .headers(headers);
        // Known-empty bodies go out without chunked framing.
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        let upstream = outbound
            .send()
            .await
            .map_err(|e| {
                tracing::error!(service, target = %target, error = %e, "Upstream request failed");
                GatewayError::BadGateway(e.to_string())
            })?;

        tracing::debug!(service, target = %target, status = %upstream.status(), "Upstream responded");

        let mut response = Response::builder().status(upstream.status());
        if let Some(headers) = response.headers_mut() {
            *headers = forwardable(upstream.headers(), false);
        }
        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| GatewayError::BadGateway(format!("failed to build response: {e}")))
    }
}

/// `base` path joined with `remainder`, plus the incoming query.
pub fn target_url(base: &Url, remainder: &str, query: Option<&str>) -> Url {
    let mut target = base.clone();
    let path = format!("{}{}", base.path().trim_end_matches('/'), remainder);
    target.set_path(&path);
    target.set_query(query);
    target
}

/// Copy of `headers` without hop-by-hop entries (and `Host` on requests).
pub fn forwardable(headers: &HeaderMap, is_request: bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if HOP_BY_HOP.contains(&name.as_str()) || (is_request && name == header::HOST) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Address of the hop that connected to the gateway, else the admitted caller.
fn forwarding_peer(parts: &Parts) -> Option<IpAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical())
        .or_else(|| parts.extensions.get::<ClientAddr>().map(|ClientAddr(ip)| *ip))
}

/// Append `peer` to the `X-Forwarded-For` chain, creating it if absent.
pub fn append_forwarded_for(headers: &mut HeaderMap, peer: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    let chain = if prior.is_empty() {
        peer.to_string()
    } else {
        format!("{}, {peer}", prior.join(", "))
    };

    match HeaderValue::from_str(&chain) {
        Ok(value) => {
            headers.insert(X_FORWARDED_FOR, value);
        }
        Err(e) => tracing::warn!(error = %e, "Dropping unrepresentable X-Forwarded-For chain"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_url_strips_and_keeps_query() {
        let base = Url::parse("http://10.0.0.5:9001").unwrap();
        assert_eq!(
            target_url(&base, "/alice", Some("x=1&y=2")).as_str(),
            "http://10.0.0.5:9001/alice?x=1&y=2"
        );
        assert_eq!(target_url(&base, "", None).as_str(), "http://10.0.0.5:9001/");
    }

    #[test]
    fn target_url_keeps_base_path() {
        let base = Url::parse("http://svc.internal/api/").unwrap();
        assert_eq!(
            target_url(&base, "/reports/1", None).as_str(),
            "http://svc.internal/api/reports/1"
        );
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("gateway"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer x"));
        headers.append("x-custom", HeaderValue::from_static("a"));
        headers.append("x-custom", HeaderValue::from_static("b"));

        let request_headers = forwardable(&headers, true);
        assert!(!request_headers.contains_key(header::HOST));
        assert!(!request_headers.contains_key(header::CONNECTION));
        assert!(!request_headers.contains_key(header::TRANSFER_ENCODING));
        assert_eq!(request_headers[header::AUTHORIZATION], "Bearer x");
        assert_eq!(request_headers.get_all("x-custom").iter().count(), 2);

        assert!(forwardable(&headers, false).contains_key(header::HOST));
    }

    #[test]
    fn forwarded_for_is_created_or_extended() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "127.0.0.1".parse().unwrap());
        assert_eq!(headers[X_FORWARDED_FOR], "127.0.0.1");

        let mut headers = HeaderMap::new();
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.9"));
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("10.0.0.1"));
        append_forwarded_for(&mut headers, "10.0.0.2".parse().unwrap());
        assert_eq!(headers.get_all(X_FORWARDED_FOR).iter().count(), 1);
        assert_eq!(headers[X_FORWARDED_FOR], "203.0.113.9, 10.0.0.1, 10.0.0.2");
    }

    #[test]
    fn forwarding_peer_prefers_socket_address() {
        let mut parts = Request::new(Body::empty()).into_parts().0;
        parts.extensions.insert(ClientAddr("203.0.113.9".parse().unwrap()));
        assert_eq!(forwarding_peer(&parts), Some("203.0.113.9".parse().unwrap()));

        parts
            .extensions
            .insert(ConnectInfo::<SocketAddr>("10.0.0.2:4000".parse().unwrap()));
        assert_eq!(forwarding_peer(&parts), Some("10.0.0.2".parse().unwrap()));
    }
}
