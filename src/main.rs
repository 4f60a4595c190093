//! Arena Server - Authoritative multiplayer FPS game server
//!
//! This is the main entry point for the game server. It handles:
//! - TCP connections carrying the pipe-delimited text protocol
//! - The 20 Hz authoritative simulation tick loop
//! - Hitscan fire resolution and score/death broadcasting
//! - Periodic score broadcasts and dead-connection sweeps

mod app;
mod config;
mod game;
mod net;
mod util;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
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

    info!("Starting Arena Server");
    info!("Server address: {}", config.server_addr);
    info!(
        tick_ms = config.tick_interval.as_millis() as u64,
        ray_length = config.fire_ray_length,
        collision_radius = config.collision_radius,
        damage = config.fire_damage,
        "Simulation parameters"
    );

    let addr = config.server_addr;
    let state = AppState::new(config);

    // Periodic drivers
    tokio::spawn(game::tick::run(state.clone()));
    tokio::spawn(net::broadcast::score_loop(state.clone()));
    tokio::spawn(net::broadcast::health_monitor(state.clone()));
    tokio::spawn(app::stats::run(state.clone()));

    // Only a bind failure is fatal.
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    tokio::select! {
        _ = net::session::run_listener(listener, state) => {}
        _ = shutdown_signal() => {}
    }

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
