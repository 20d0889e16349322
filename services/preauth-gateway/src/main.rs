//! MFA pre-authentication gateway
//!
//! Single-binary service that:
//! 1. Loads provider credentials and cache settings from TOML + environment
//! 2. Resolves per-username MFA eligibility through the provider's admin API
//! 3. Absorbs provider latency and failures behind a short-lived status cache
//! 4. Exposes the resolver, a liveness-backed health check, and Prometheus
//!    metrics over HTTP

mod api;
mod config;
mod metrics;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use anyhow::{Context, Result};
use duo_api::{DuoClient, HttpTransport};
use duo_resolve::{AccountCache, StatusResolver};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting preauth-gateway");

    // Install the Prometheus recorder before any metrics are emitted
    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        api_host = %config.duo.api_host,
        listen_addr = %config.server.listen_addr,
        cache_capacity = config.cache.capacity,
        cache_ttl_secs = config.cache.ttl_secs,
        "configuration loaded"
    );

    let transport = HttpTransport::new(config.provider_timeout())
        .context("failed to build provider transport")?;
    let secret_key = config
        .duo
        .secret_key
        .clone()
        .context("secret key missing after config validation")?;
    let client = DuoClient::new(
        config.duo.api_host.clone(),
        config.duo.integration_key.clone(),
        secret_key,
        Arc::new(transport),
    );
    let cache = AccountCache::new(config.cache.capacity, config.cache_ttl());
    let resolver = Arc::new(StatusResolver::new(client, cache));

    // Startup probe is advisory: an unreachable provider is logged, not
    // fatal. Resolution degrades to unavailable accounts until it recovers.
    if resolver.ping().await {
        info!("provider liveness probe answered pong");
    } else {
        warn!("provider liveness probe failed; continuing degraded");
    }

    let state = AppState {
        resolver,
        prometheus: prometheus_handle,
        started_at: Instant::now(),
        requests_total: Arc::new(AtomicU64::new(0)),
    };
    let app = api::build_router(state, config.server.max_connections);

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
