mod api;
mod config;
mod error;
mod manager;
mod session;
mod transport;
mod types;

use std::sync::Arc;

use error::{AppError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, defaults};
use manager::RouterManager;
use tokio::net::TcpListener;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env();

    tracing::info!("{} starting", api::handlers::SERVER_NAME);
    for (name, enabled) in [
        ("rest", config.transports.rest),
        ("api", config.transports.binary_api),
        ("ssh", config.transports.ssh),
    ] {
        if enabled {
            tracing::info!("  - {} transport available", name);
        } else {
            tracing::warn!("  - {} transport disabled, connections will skip it", name);
        }
    }

    let manager = RouterManager::with_default_transports(config.transports);
    let state = Arc::new(api::AppState {
        config: config.clone(),
        manager,
    });

    // Shutdown channel (graceful shutdown)
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    // Wait for Ctrl+C
    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let app = api::create_router(state.clone());

    let listener = bind_with_fallback(&config.bind_addr, config.port).await?;
    let addr = listener.local_addr()?;

    tracing::info!("MikroTik Manager API Server running on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /                            - Server status");
    tracing::info!("  - POST /api/routers/connect         - Connect a router");
    tracing::info!("  - GET  /api/routers/{{id}}/address-lists");
    tracing::info!("  - POST /api/routers/{{id}}/backup");
    tracing::info!("  - POST /api/routers/{{id}}/command");
    tracing::info!("  - POST /api/routers/{{id}}/disconnect");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    // Close every live router session before exiting
    state.manager.shutdown().await;
    tracing::info!("All router sessions closed, goodbye");

    Ok(())
}

/// Binds the preferred port, probing successive ports when it is taken.
/// The actually bound port is logged; the dashboard discovers it from there.
async fn bind_with_fallback(bind_addr: &str, preferred: u16) -> Result<TcpListener> {
    for offset in 0..defaults::PORT_SCAN_LIMIT {
        let port = preferred.saturating_add(offset);
        match TcpListener::bind((bind_addr, port)).await {
            Ok(listener) => {
                if offset > 0 {
                    tracing::warn!("Port {} is busy, using port {} instead", preferred, port);
                }
                return Ok(listener);
            }
            Err(e) => {
                tracing::debug!("Failed to bind {}:{}: {}", bind_addr, port, e);
            }
        }
    }
    Err(AppError::Config(format!(
        "no free port in {}..{}",
        preferred,
        preferred.saturating_add(defaults::PORT_SCAN_LIMIT)
    )))
}

fn setup_tracing() {
    // EnvFilter::from_default_env honors RUST_LOG; default to "info"
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
