//! # huddle-server
//!
//! HTTP surface for the Huddle workspace backend.
//!
//! This binary provides:
//! - **REST API** (axum) covering sessions, channels, dms, messages,
//!   reactions, notifications, standups and admin moderation
//! - **Whole-state snapshot persistence** through `huddle-store`
//! - **Deferred tasks** (send-later messages, standup finishes) on a
//!   cancellable tokio scheduler

mod api;
mod config;
mod error;
mod routes;
mod scheduler;

use tracing::info;
use tracing_subscriber::EnvFilter;

use huddle_store::SnapshotStore;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (respects RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,huddle_server=debug")),
        )
        .init();

    info!("Starting Huddle server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // Open the snapshot store and build the shared application state.
    let store = SnapshotStore::open(&config.snapshot_path)?;
    let state = AppState::new(store);

    // Run the HTTP API server until shutdown.
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
