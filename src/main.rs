//! Tile Arena Server - session and event relay for a top-down tile shooter
//!
//! This is the main entry point for the game server. It handles:
//! - WebSocket connections relaying gameplay events between players
//! - Periodic item spawning on the shared tile map
//! - Serving the client bundle

mod app;
mod config;
mod game;
mod http;
mod map;
mod util;
mod ws;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::game::run_item_spawner;
use crate::http::build_router;
use crate::map::WallGrid;
use crate::util::time::init_server_time;

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

    info!("Starting Tile Arena Server");
    info!("Server address: {}", config.server_addr);

    // Wall data is required for item placement, refuse to start without it
    let game = &config.game;
    let walls = WallGrid::load(&config.wall_data_path, &game.map_name, game.cols(), game.rows())?;
    info!(
        map = %game.map_name,
        cols = walls.cols(),
        rows = walls.rows(),
        walls = walls.wall_count(),
        "Wall data loaded"
    );

    // Create application state
    let state = AppState::new(config.clone(), walls);

    // Spawn item scheduler
    let world = state.world.clone();
    let period = config.game.item_spawn_interval;
    tokio::spawn(async move {
        run_item_spawner(world, period).await;
    });

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

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
