//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use colloquy::config::Config;
use colloquy::engine::ClaudeEngine;
use colloquy::server::{self, AppState};
use colloquy::store::FileSessionStore;

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    // Credential resolved once at startup; the chat handler rejects requests
    // with a plain 500 when it is absent.
    let credential = Config::credential_from_env();
    if credential.is_none() {
        warn!(
            var = colloquy::config::CREDENTIAL_ENV_VAR,
            "Engine credential not set; chat requests will be rejected"
        );
    }
    let engine_configured = credential.is_some();

    let store: Arc<dyn colloquy::store::SessionStore> =
        Arc::new(FileSessionStore::new(&config.sessions.path));
    info!(path = %config.sessions.path.display(), "Session store initialized");

    let engine = Arc::new(ClaudeEngine::new(&config.engine, credential));
    info!(command = %config.engine.command, "Agent engine configured");

    let state = AppState {
        store,
        engine,
        engine_configured,
        model: config.engine.model_descriptor(),
        debug: config.engine.debug,
        keep_alive_interval_seconds: config.server.keep_alive_interval_seconds,
    };

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid host '{}'", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            warn!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => {
                warn!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
