// [apps/worker/src/engine.rs]
/*!
 * =================================================================
 * APARATO: WORKER ROUND-ROBIN ENGINE (V9.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: APPLICATION CORE (ESTRATO L1)
 * RESPONSABILIDAD: CICLO DE VIDA DEL ARRENDAMIENTO Y RONDA DE TAREAS
 *
 * VISION:
 * 1. ONE TICK, ONE TASK: Cada llamada a `tick()` adelanta exactamente una
 *    tarea de la tienda más atrasada — ningún store acapara el ciclo.
 * 2. TELEGRAFÍA MÍNIMA: `WorkerStatus` solo expone {running, last_response},
 *    el contrato externo; la telemetría interna vive en el motor mismo.
 *    =================================================================
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fleet_db::{FleetDatabase, LeaseRepository, StoreRepository};
use fleet_domain::Stage;
use marketplace_client::{MarketplaceClient, MarketplaceEndpoints};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::store_process::{StoreProcess, StoreProcessOutcome, TaskContext};

const MAX_STORES_AMOUNT: usize = 15;
const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);
const IDLE_SLEEP: Duration = Duration::from_millis(7500);

/// The control surface's `/status` route, byte-for-byte: `{running,
/// last_response}`. Updated in place at the end of every tick.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WorkerStatus {
    pub running: bool,
    pub last_response: Option<String>,
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self { running: false, last_response: Some("worker not started".to_string()) }
    }
}

struct WorkingStore {
    process: StoreProcess,
    marketplace: MarketplaceClient,
}

pub struct WorkerEngine {
    pool: sqlx::PgPool,
    lease: LeaseRepository,
    stores_repo: StoreRepository,
    endpoints: MarketplaceEndpoints,
    worker_id: String,
    version: String,
    stores: Vec<WorkingStore>,
    current_store_index: usize,
    last_health_check: Option<Instant>,
    stop: Arc<AtomicBool>,
    status: Arc<RwLock<WorkerStatus>>,
}

impl WorkerEngine {
    pub fn new(
        db: &FleetDatabase,
        worker_id: String,
        version: String,
        endpoints: MarketplaceEndpoints,
        stop: Arc<AtomicBool>,
        status: Arc<RwLock<WorkerStatus>>,
    ) -> Self {
        Self {
            pool: db.pool().clone(),
            lease: LeaseRepository::new(db.pool().clone()),
            stores_repo: StoreRepository::new(db.pool().clone()),
            endpoints,
            worker_id,
            version,
            stores: Vec::new(),
            current_store_index: 0,
            last_health_check: None,
            stop,
            status,
        }
    }

    /// Top-level blocking loop, run from `main` on its own task. Mirrors
    /// `worker_class.py::run_iteration`'s responsibilities one tick at a
    /// time: scheduled health check, refill the working set, advance the
    /// round robin, retire finished stores.
    pub async fn run(mut self) {
        self.refresh_status(true, "main loop started".to_string()).await;
        while !self.stop.load(Ordering::SeqCst) {
            self.tick().await;
        }
        self.refresh_status(false, "worker stopped".to_string()).await;
        info!(worker_id = %self.worker_id, "worker shutting down");
    }

    async fn tick(&mut self) {
        self.scheduled_health_check().await;
        self.update_stores().await;

        if self.stores.is_empty() {
            self.refresh_status(true, "- no active stores, idling".to_string()).await;
            tokio::time::sleep(IDLE_SLEEP).await;
            return;
        }

        let index = self.current_store_index % self.stores.len();
        self.current_store_index = self.current_store_index.wrapping_add(1);

        let ctx = TaskContext {
            pool: self.pool.clone(),
            marketplace: self.stores[index].marketplace.clone(),
            store_id: self.stores[index].process.store_id,
        };

        let store_id = self.stores[index].process.store_id;
        let outcome = self.stores[index].process.tick(&ctx).await;

        let message = if matches!(outcome, StoreProcessOutcome::Success | StoreProcessOutcome::Error) {
            let finished = self.stores.remove(index);
            let succeeded = outcome == StoreProcessOutcome::Success;
            if let Err(e) = self.lease.finalize(Stage::DataLoad, finished.process.store_process_id, succeeded).await {
                warn!(store_id = finished.process.store_id, error = %e, "failed to finalize store lease");
            }
            info!(store_id = finished.process.store_id, ?outcome, "store process finished, removed from working set");
            format!("- store {store_id} finished: {outcome:?}")
        } else {
            format!("- store {store_id} tick: {outcome:?}")
        };

        self.refresh_status(true, message).await;
    }

    #[instrument(skip(self))]
    async fn update_stores(&mut self) {
        if self.stores.len() >= MAX_STORES_AMOUNT {
            return;
        }

        let Ok(Some(leased)) = self.lease.acquire(Stage::DataLoad, &self.worker_id).await else {
            return;
        };

        let store = match self.stores_repo.get(leased.store_id).await {
            Ok(Some(store)) => store,
            Ok(None) => {
                warn!(store_id = leased.store_id, "leased store_process has no matching store row");
                return;
            }
            Err(e) => {
                warn!(store_id = leased.store_id, error = %e, "failed to fetch store row");
                return;
            }
        };

        if !store.token_is_valid {
            warn!(store_id = leased.store_id, "store token is not valid, releasing lease");
            let _ = self.lease.finalize(Stage::DataLoad, leased.store_process_id, true).await;
            return;
        }

        let marketplace = match MarketplaceClient::new(&store.api_token, self.endpoints.clone()) {
            Ok(client) => client,
            Err(e) => {
                warn!(store_id = leased.store_id, error = %e, "failed to build marketplace client");
                let _ = self.lease.finalize(Stage::DataLoad, leased.store_process_id, false).await;
                return;
            }
        };

        info!(store_id = leased.store_id, "added store to working set");
        self.stores.push(WorkingStore {
            process: StoreProcess::new(leased.store_id, leased.store_process_id),
            marketplace,
        });
    }

    async fn scheduled_health_check(&mut self) {
        let due = match self.last_health_check {
            None => true,
            Some(at) => at.elapsed() > HEARTBEAT_PERIOD,
        };
        if !due {
            return;
        }

        let leased_ids: Vec<i64> = self.stores.iter().map(|s| s.process.store_process_id).collect();
        if let Err(e) = self.lease.heartbeat_leases(&self.worker_id, &leased_ids).await {
            warn!(error = %e, "store health check failed");
        }
        if let Err(e) = self.lease.heartbeat_service_health("worker", &self.worker_id, &self.version).await {
            warn!(error = %e, "worker health check failed");
        }
        self.last_health_check = Some(Instant::now());
    }

    async fn refresh_status(&self, running: bool, last_response: String) {
        let mut status = self.status.write().await;
        status.running = running;
        status.last_response = Some(last_response);
    }
}
