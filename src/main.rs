// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use edge_gateway::{
    api,
    config::{Config, StoreBackend},
    gateway::{self, GatewayState},
    state::{AppState, AuthSettings},
    storage::{InMemoryStore, RedbStore, Store, StoreClient},
    telemetry,
    token::TokenAuthority,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init(config.log_format, &config.rust_log);

    tracing::info!(
        environment = ?config.environment,
        auth_address = %config.auth_server_address,
        gateway_address = %config.gateway_server_address,
        store = ?config.store_backend,
        allowed_ips = ?config.allowed_ips,
        rate_limit = ?config.rate_limit,
        "Edge gateway starting"
    );

    let backend: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Redb => Arc::new(
            RedbStore::open(&config.db_source)
                .with_context(|| format!("Failed to open database at {}", config.db_source.display()))?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; users and sessions are lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };
    let store = StoreClient::new(backend, config.storage_timeout);

    let authority = Arc::new(
        TokenAuthority::new(config.token_symmetric_key.as_bytes())
            .context("Failed to initialize credential authority")?,
    );

    let auth_app = api::router(AppState::new(
        Arc::clone(&authority),
        store,
        AuthSettings::from_config(&config),
    ));
    let gateway_app = gateway::router(
        GatewayState::from_config(&config, authority).context("Failed to build gateway")?,
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let auth_server = serve("auth", config.auth_server_address, auth_app, shutdown.clone());
    let gateway_server = serve("gateway", config.gateway_server_address, gateway_app, shutdown.clone());

    // Either server failing takes the other down with it.
    let result = tokio::try_join!(
        async {
            let r = auth_server.await;
            shutdown.cancel();
            r
        },
        async {
            let r = gateway_server.await;
            shutdown.cancel();
            r
        },
    );

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn serve(name: &'static str, addr: SocketAddr, app: Router, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {name} server to {addr}"))?;
    tracing::info!(server = name, %addr, "Listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .with_context(|| format!("{name} server failed"))?;

    tracing::info!(server = name, "Server stopped");
    Ok(())
}

async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
