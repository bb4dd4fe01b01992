//! Scheduling daemon: owns the expiry sweeper loop. The booking and
//! availability services are library surface, wrapped by whatever
//! transport fronts this process.
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scheduling_cell::{ExpirySweeper, SystemTimeSource};
use shared_config::AppConfig;
use shared_database::MemoryStore;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduling daemon");

    // Load configuration
    let config = AppConfig::from_env();

    let store = Arc::new(MemoryStore::new());
    let sweeper = ExpirySweeper::new(
        store,
        Arc::new(SystemTimeSource),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_handle = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for the shutdown signal");
    info!("Shutdown signal received, stopping sweeper");

    let _ = shutdown_tx.send(true);
    let _ = sweeper_handle.await;

    info!("Scheduling daemon stopped");
}
