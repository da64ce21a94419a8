//! World Sync Server - authoritative state relay for the multiplayer sandbox
//!
//! This is the main entry point for the sync service. It handles:
//! - Room join/leave and full-snapshot delivery
//! - Tile mutation submission with last-write-wins resolution
//! - Polling-based delta sync against per-room change logs
//! - Player presence tracking with liveness expiry

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use world_sync_server::app::AppState;
use world_sync_server::config::Config;
use world_sync_server::http::build_router;
use world_sync_server::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting World Sync Server");
    info!("Server address: {}", config.server_addr);
    info!(
        "World dimensions: {}x{}, change log cap: {}",
        config.world_width, config.world_height, config.change_log_cap
    );

    // Create application state
    let state = AppState::new(config.clone());

    // Spawn the room/presence sweeper
    let rooms = state.rooms.clone();
    let sweep_config = state.config.clone();
    let sweep_limiter = state.mutation_limiter.clone();
    tokio::spawn(async move {
        rooms.run_sweeper(sweep_config, sweep_limiter).await;
    });

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
