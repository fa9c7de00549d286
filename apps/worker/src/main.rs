//! Entry point for the store-analytics ingestion worker: parses its
//! configuration, opens the shared database pool, and hands control to
//! the tick engine while a small HTTP surface exposes health/status.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::RwLock;
use tracing::{info, warn};

use fleet_db::FleetDatabase;
use marketplace_client::MarketplaceEndpoints;
use fleet_worker::control::{build_router, ControlState};
use fleet_worker::engine::{WorkerEngine, WorkerStatus};

#[derive(Parser, Debug)]
#[command(version, about = "Store-analytics ingestion worker")]
struct WorkerConfig {
    /// Postgres connection string shared with the manager process.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Unique id this worker registers its leases and heartbeats under.
    #[arg(long, env = "WORKER_ID", default_value = "worker-1")]
    worker_id: String,

    /// Shared secret required on the control surface's non-health routes.
    #[arg(long, env = "WORKER_AUTH_TOKEN")]
    auth_token: String,

    /// Port the control surface listens on.
    #[arg(long, env = "WORKER_PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fleet_telemetry::init_tracing("fleet_worker");

    let config = WorkerConfig::parse();
    let version = env!("CARGO_PKG_VERSION").to_string();

    info!(worker_id = %config.worker_id, "starting worker");

    let database = FleetDatabase::connect(&config.database_url)
        .await
        .context("failed to connect to the fleet database")?;

    let stop = Arc::new(AtomicBool::new(false));
    let status = Arc::new(RwLock::new(WorkerStatus::default()));

    let stop_on_signal = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown requested, finishing current tick");
            stop_on_signal.store(true, Ordering::SeqCst);
        }
    });

    let control_state = ControlState {
        status: Arc::clone(&status),
        stop: Arc::clone(&stop),
        auth_token: config.auth_token.clone(),
    };
    let router = build_router(control_state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context("failed to bind control surface port")?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            warn!(error = %e, "control surface server exited");
        }
    });

    let engine = WorkerEngine::new(
        &database,
        config.worker_id,
        version,
        MarketplaceEndpoints::default(),
        stop,
        status,
    );

    engine.run().await;

    info!("worker shut down cleanly");
    Ok(())
}
