// [crates/fleet-db/src/repositories/lease/mod.rs]
/*!
 * =================================================================
 * APARATO: LEASE REPOSITORY (V11.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: ARRENDAMIENTO ATÓMICO DE TIENDAS ENTRE SERVICIOS
 *
 * VISION:
 * 1. ATOMIC LEASE: `SELECT ... FOR UPDATE SKIP LOCKED` dentro de un único
 *    `UPDATE ... FROM candidate`, erradicando condiciones de carrera entre
 *    workers y manager compitiendo por la misma fila.
 * 2. RECLAIM UNIFORME: Un solo predicado `RECLAIMABLE` gobierna las tres
 *    etapas (data-load, etl, export) — ninguna duplica su propia lógica
 *    de salud obsoleta.
 *
 * # Mathematical Proof (Lease Atomicity):
 * Al anidar el SELECT dentro del WHERE del UPDATE, la base de datos actúa
 * como semáforo de exclusión mutua a nivel de fila: 1 tienda <-> 1 servicio
 * de forma unívoca en todo instante.
 *    =================================================================
 */

pub mod queries;

use crate::errors::DbError;
use fleet_domain::{Stage, StoreProcess};
use sqlx::{PgPool, Row};
use tracing::{info, instrument, warn};

/// Freshness SLA shared by CardsList, NmReportDetail, AdvertInfo and the
/// manager's data-load/dim-etl eligibility checks.
pub const SCHEDULE: &str = "6 hours 15 minutes";
pub const STALE_DATA_SECONDS: i64 = 3600;
pub const HEALTH_STALE_SECONDS: i64 = 1200;

/// Shared lease-acquisition and finalize surface for the three stages
/// (data-load, etl, export). Workers only ever call the data-load methods;
/// the manager calls etl/export.
pub struct LeaseRepository {
    pool: PgPool,
}

fn row_to_store_process(row: &sqlx::postgres::PgRow) -> Result<StoreProcess, DbError> {
    Ok(StoreProcess {
        store_process_id: row.try_get("store_process_id").map_err(DbError::Query)?,
        store_id: row.try_get("store_id").map_err(DbError::Query)?,
        running: row.try_get("running").map_err(DbError::Query)?,
        service: row.try_get("service").map_err(DbError::Query)?,
        process_health_check: row.try_get("process_health_check").map_err(DbError::Query)?,
        last_worker_start: row.try_get("last_worker_start").map_err(DbError::Query)?,
        last_worker_end: row.try_get("last_worker_end").map_err(DbError::Query)?,
        last_data_load: row.try_get("last_data_load").map_err(DbError::Query)?,
        last_dm_etl: row.try_get("last_dm_etl").map_err(DbError::Query)?,
        last_client_load: row.try_get("last_client_load").map_err(DbError::Query)?,
        created_at: row.try_get("created_at").map_err(DbError::Query)?,
    })
}

impl LeaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn acquire(
        &self,
        stage: Stage,
        service_id: &str,
    ) -> Result<Option<StoreProcess>, DbError> {
        let sql = match stage {
            Stage::DataLoad => queries::acquire_data_load(STALE_DATA_SECONDS),
            Stage::Etl => queries::acquire_etl(SCHEDULE, SCHEDULE),
            Stage::Export => queries::acquire_export(SCHEDULE, SCHEDULE),
        };

        let row = sqlx::query(&sql)
            .bind(HEALTH_STALE_SECONDS.to_string())
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let leased = row_to_store_process(&row)?;
                info!(store_id = leased.store_id, ?stage, "🔑 [LEASE]: ARRENDAMIENTO_ADQUIRIDO");
                Ok(Some(leased))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn finalize(
        &self,
        stage: Stage,
        store_process_id: i64,
        succeeded: bool,
    ) -> Result<(), DbError> {
        let sql = match (stage, succeeded) {
            (Stage::DataLoad, true) => queries::FINALIZE_DATA_LOAD_SUCCESS,
            (Stage::DataLoad, false) => queries::FINALIZE_DATA_LOAD_ERROR,
            (Stage::Etl, _) => queries::FINALIZE_ETL,
            (Stage::Export, _) => queries::FINALIZE_EXPORT,
        };

        let affected = sqlx::query(sql)
            .bind(store_process_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            warn!(store_process_id, "⚠️ [LEASE]: FINALIZE_SIN_FILA -> ya estaba liberada");
        }
        Ok(())
    }

    #[instrument(skip(self, leased_ids))]
    pub async fn heartbeat_leases(&self, service_id: &str, leased_ids: &[i64]) -> Result<(), DbError> {
        if leased_ids.is_empty() {
            return Ok(());
        }
        sqlx::query(queries::HEARTBEAT_LEASES)
            .bind(service_id)
            .bind(leased_ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn heartbeat_service_health(
        &self,
        service_type: &str,
        service_name: &str,
        version: &str,
    ) -> Result<(), DbError> {
        sqlx::query(queries::UPSERT_SERVICE_HEALTH)
            .bind(service_type)
            .bind(service_name)
            .bind(version)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
