//! Redis Cache Proxy - a read-through caching proxy in front of Redis
//!
//! Serves point lookups over HTTP (cached or direct) and over a minimal RESP
//! listener, with admission control and bounded reconnects to the store.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redis_cache_proxy::api::create_router;
use redis_cache_proxy::{spawn_wire_server, AppState, BackingStore, Config, RedisClient, WireServer};

/// Main entry point for the proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables, exiting on error
/// 3. Create the Redis client, cache and admission controller
/// 4. Start the RESP listener
/// 5. Start the HTTP server
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "redis_cache_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            eprintln!("ERROR: Not all required environment variables are present: {}", err);
            std::process::exit(1);
        }
    };
    info!(
        "Configuration loaded: cache_size={}, ttl={:?}, max_conn={}, redis={}:{}/{}",
        config.cache_size,
        config.ttl,
        config.max_conn,
        config.redis_host,
        config.redis_port,
        config.redis_db
    );

    let backend: Arc<dyn BackingStore> = Arc::new(RedisClient::from_config(&config));
    let state = AppState::from_config(&config, backend.clone());

    let wire = WireServer::bind(config.tcp_addr(), backend)
        .await
        .with_context(|| format!("binding wire listener on {}", config.tcp_addr()))?;
    let wire_handle = spawn_wire_server(wire);

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.http_addr())
        .await
        .with_context(|| format!("binding HTTP listener on {}", config.http_addr()))?;
    info!("HTTP listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(wire_handle))
        .await
        .context("HTTP server failed")?;

    info!("Proxy shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the wire listener.
async fn shutdown_signal(wire_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    wire_handle.abort();
    warn!("Wire listener stopped");
}
