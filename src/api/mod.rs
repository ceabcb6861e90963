// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth service HTTP surface.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ErrorBody,
    gateway::admission::resolve_client_ip,
    models::{
        CreateUserRequest, HealthResponse, LoginUserRequest, LoginUserResponse,
        RenewAccessTokenRequest, RenewAccessTokenResponse, UserResponse,
    },
    session::ClientMeta,
    state::AppState,
};

pub mod health;
pub mod tokens;
pub mod users;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/users", post(users::create_user))
        .route("/users/login", post(users::login_user))
        .route("/users/{username}", get(users::get_user))
        .route("/token/renew", post(tokens::renew_access_token))
        .route("/sessions/{session_id}/revoke", post(tokens::revoke_session))
        .with_state(state);

    with_http_layers(
        routes
            .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
            .layer(CorsLayer::permissive()),
    )
}

/// Request ID and tracing layers shared by both servers.
pub fn with_http_layers(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

/// Caller address and user agent, recorded on new sessions.
pub struct ClientInfo(pub ClientMeta);

impl<S: Send + Sync> FromRequestParts<S> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let client_ip = resolve_client_ip(&parts.headers, peer)
            .map(|ip| ip.to_string())
            .unwrap_or_default();
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(ClientInfo(ClientMeta {
            client_ip,
            user_agent,
        }))
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("PASETO")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::create_user,
        users::login_user,
        users::get_user,
        tokens::renew_access_token,
        tokens::revoke_session
    ),
    components(
        schemas(
            CreateUserRequest,
            UserResponse,
            LoginUserRequest,
            LoginUserResponse,
            RenewAccessTokenRequest,
            RenewAccessTokenResponse,
            HealthResponse,
            ErrorBody
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Account creation, login and profiles"),
        (name = "Tokens", description = "Credential renewal and session revocation"),
        (name = "Health", description = "Liveness")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AuthSettings;
    use crate::storage::StoreClient;
    use crate::token::TokenAuthority;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let authority = Arc::new(TokenAuthority::new(b"0123456789abcdefghijklmnopqrstuv").unwrap());
        router(AppState::new(authority, StoreClient::in_memory(), AuthSettings::default()))
    }

    #[tokio::test]
    async fn health_reports_ok_with_request_id() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"status":"Auth service is healthy"}"#);
    }

    #[tokio::test]
    async fn openapi_document_lists_paths() {
        let response = app()
            .oneshot(Request::get("/api-doc/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/token/renew"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }

    #[tokio::test]
    async fn client_info_prefers_forwarded_for() {
        let mut parts = Request::get("/")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts
            .extensions
            .insert(ConnectInfo::<SocketAddr>("127.0.0.1:5000".parse().unwrap()));

        let ClientInfo(meta) = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(meta.client_ip, "203.0.113.9");
        assert_eq!(meta.user_agent, "curl/8.0");
    }
}
