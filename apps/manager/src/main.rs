//! Entry point for the fleet manager: runs the ETL/export driver loop and
//! exposes the same small control surface as the worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::RwLock;
use tracing::{info, warn};

use fleet_db::FleetDatabase;
use fleet_manager::control::{build_router, ControlState};
use fleet_manager::driver::{ManagerEngine, ManagerStatus};
use fleet_manager::export::LoggingSpreadsheetExporter;

#[derive(Parser, Debug)]
#[command(version, about = "Store-analytics fleet manager: dimensional ETL and spreadsheet export driver")]
struct ManagerConfig {
    /// Postgres connection string shared with the worker processes.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Unique id this manager registers its leases and heartbeats under.
    #[arg(long, env = "APP_MANAGER", default_value = "manager-1")]
    manager_id: String,

    /// Shared secret required on the control surface's non-health routes.
    #[arg(long, env = "WORKER_AUTH_TOKEN")]
    auth_token: String,

    /// Port the control surface listens on.
    #[arg(long, env = "MANAGER_PORT", default_value_t = 8081)]
    port: u16,

    /// In `dev`, every export targets this spreadsheet instead of each
    /// store's own `table_id` (mirrors `ENVIRONMENT == "dev"` in the
    /// original driver).
    #[arg(long, env = "ENVIRONMENT", default_value = "production")]
    environment: String,

    #[arg(long, env = "DEFAULT_WB_TECH_TABLE_ID")]
    default_spreadsheet_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fleet_telemetry::init_tracing("fleet_manager");

    let config = ManagerConfig::parse();
    let version = env!("CARGO_PKG_VERSION").to_string();

    info!(manager_id = %config.manager_id, "starting manager");

    let database = FleetDatabase::connect(&config.database_url)
        .await
        .context("failed to connect to the fleet database")?;

    let dev_spreadsheet_id = if config.environment == "dev" { config.default_spreadsheet_id } else { None };

    let stop = Arc::new(AtomicBool::new(false));
    let status = Arc::new(RwLock::new(ManagerStatus::default()));

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

    let engine = ManagerEngine::new(
        &database,
        LoggingSpreadsheetExporter,
        config.manager_id,
        version,
        dev_spreadsheet_id,
        stop,
        status,
    );

    engine.run().await;

    info!("manager shut down cleanly");
    Ok(())
}
