// [apps/manager/src/driver.rs]
/*!
 * =================================================================
 * APARATO: MANAGER ETL + EXPORT DRIVER (V9.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: APPLICATION CORE (ESTRATO L1)
 * RESPONSABILIDAD: UN PASO DE ETL Y UN PASO DE EXPORTACIÓN POR CICLO
 *
 * VISION:
 * 1. DOS ETAPAS, UN TICK: Cada ciclo intenta a lo sumo una tienda de ETL
 *    y una de exportación — ninguna acapara el manager.
 * 2. TELEGRAFÍA MÍNIMA: `ManagerStatus` solo expone {running, last_response}.
 *    =================================================================
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fleet_db::{DimensionalRepository, FleetDatabase, LeaseRepository, StoreRepository};
use fleet_domain::Stage;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::export::SpreadsheetExporter;

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);
const IDLE_SLEEP: Duration = Duration::from_secs(10);

/// The control surface's `/status` route, byte-for-byte: `{running,
/// last_response}`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ManagerStatus {
    pub running: bool,
    pub last_response: Option<String>,
}

/// ETL + export driver, one tick at a time. Grounded on
/// `app_manager_class.py::run_iteration`: a scheduled health check, then at
/// most one ETL store and one export store per tick, sleeping only when
/// neither stage had work.
pub struct ManagerEngine<E: SpreadsheetExporter> {
    lease: LeaseRepository,
    dimensional: DimensionalRepository,
    stores: StoreRepository,
    exporter: E,
    manager_id: String,
    version: String,
    dev_spreadsheet_id: Option<String>,
    last_health_check: Option<Instant>,
    stop: Arc<AtomicBool>,
    status: Arc<RwLock<ManagerStatus>>,
}

impl<E: SpreadsheetExporter> ManagerEngine<E> {
    pub fn new(
        db: &FleetDatabase,
        exporter: E,
        manager_id: String,
        version: String,
        dev_spreadsheet_id: Option<String>,
        stop: Arc<AtomicBool>,
        status: Arc<RwLock<ManagerStatus>>,
    ) -> Self {
        Self {
            lease: LeaseRepository::new(db.pool().clone()),
            dimensional: DimensionalRepository::new(db.pool().clone()),
            stores: StoreRepository::new(db.pool().clone()),
            exporter,
            manager_id,
            version,
            dev_spreadsheet_id,
            last_health_check: None,
            stop,
            status,
        }
    }

    pub async fn run(mut self) {
        self.refresh_status(true, None).await;
        while !self.stop.load(Ordering::SeqCst) {
            self.tick().await;
        }
        self.refresh_status(false, Some("AppManager stopped.".to_string())).await;
        info!(manager_id = %self.manager_id, "manager shutting down");
    }

    async fn tick(&mut self) {
        self.scheduled_health_check().await;

        let etl_store = self.run_etl_step().await;
        let export_store = self.run_export_step().await;

        let message = match (etl_store, export_store) {
            (Some(etl), Some(export)) => format!("- etl store {etl}, export store {export}"),
            (Some(etl), None) => format!("- etl store {etl}"),
            (None, Some(export)) => format!("- export store {export}"),
            (None, None) => "- no store ready for etl or export".to_string(),
        };
        self.refresh_status(true, Some(message)).await;

        if etl_store.is_none() && export_store.is_none() {
            tokio::time::sleep(IDLE_SLEEP).await;
        }
    }

    async fn run_etl_step(&mut self) -> Option<i64> {
        let leased = match self.lease.acquire(Stage::Etl, &self.manager_id).await {
            Ok(Some(leased)) => leased,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to acquire an ETL lease");
                return None;
            }
        };

        let store_id = leased.store_id;
        match self.dimensional.run_etl(store_id).await {
            Ok(()) => info!(store_id, "dimensional ETL complete"),
            Err(e) => warn!(store_id, error = %e, "dimensional ETL failed"),
        }
        Some(store_id)
    }

    async fn run_export_step(&mut self) -> Option<i64> {
        let leased = match self.lease.acquire(Stage::Export, &self.manager_id).await {
            Ok(Some(leased)) => leased,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to acquire an export lease");
                return None;
            }
        };

        let store_id = leased.store_id;

        let spreadsheet_id = match &self.dev_spreadsheet_id {
            Some(id) => id.clone(),
            None => match self.stores.get(store_id).await {
                Ok(Some(store)) => store.table_id,
                Ok(None) => {
                    warn!(store_id, "export lease has no matching store row");
                    return Some(store_id);
                }
                Err(e) => {
                    warn!(store_id, error = %e, "failed to look up spreadsheet id");
                    return Some(store_id);
                }
            },
        };

        let table = match self.dimensional.export_table(store_id).await {
            Ok(table) => table,
            Err(e) => {
                warn!(store_id, error = %e, "failed to build export table");
                return Some(store_id);
            }
        };

        if self.exporter.upload(&spreadsheet_id, store_id, &table).await {
            if let Err(e) = self.lease.finalize(Stage::Export, leased.store_process_id, true).await {
                warn!(store_id, error = %e, "failed to finalize export lease");
            }
            info!(store_id, "store table uploaded to spreadsheet");
        }

        Some(store_id)
    }

    async fn scheduled_health_check(&mut self) {
        let due = match self.last_health_check {
            None => true,
            Some(at) => at.elapsed() > HEARTBEAT_PERIOD,
        };
        if !due {
            return;
        }

        if let Err(e) = self.lease.heartbeat_service_health("app_manager", &self.manager_id, &self.version).await {
            warn!(error = %e, "manager health check failed");
        }
        self.last_health_check = Some(Instant::now());
    }

    async fn refresh_status(&self, running: bool, last_response: Option<String>) {
        let mut status = self.status.write().await;
        status.running = running;
        status.last_response = last_response;
    }
}
