// [crates/fleet-db/src/repositories/staging/advert_stats.rs]
/*!
 * =================================================================
 * APARATO: ADVERT STATS STAGING REPOSITORY (V7.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: GRILLA DE CARGA (advert_id × fecha) Y UPSERT DE MÉTRICAS
 *
 * VISION:
 * 1. LOAD GRID NOMINAL: La grilla se regenera completa en cada ronda —
 *    ningún anuncio retirado deja residuo de fechas pendientes.
 * 2. CHUNKED PAGINATION: IDs y fechas se entregan en lotes acotados
 *    (`ADVERT_IDS_CHUNK_MAX_SIZE`, `ADVERT_DATES_CHUNK_MAX_SIZE`) para
 *    respetar el límite del endpoint externo.
 *    =================================================================
 */

use crate::errors::DbError;
use chrono::NaiveDate;
use sqlx::PgPool;

pub const ADVERT_DAYS_TO_LOAD: i64 = 90;
pub const ADVERT_IDS_CHUNK_MAX_SIZE: i64 = 100;
pub const ADVERT_DATES_CHUNK_MAX_SIZE: i64 = 31;

pub struct LoadChunk {
    pub advert_id: i64,
    pub dates: Vec<NaiveDate>,
}

pub struct AdvertStatRow {
    pub advert_id: i64,
    pub date: NaiveDate,
    pub app_type: String,
    pub nm_id: i64,
    pub views: i64,
    pub clicks: i64,
    pub ctr: f64,
    pub cpc: f64,
    pub sum_rub: f64,
    pub atbs: i64,
    pub orders: i64,
    pub shks: i64,
    pub sum_price: f64,
}

pub struct AdvertStatsRepository {
    pool: PgPool,
}

impl AdvertStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rebuilds the `(advert_id, date)` load grid for every advert still
    /// running within the last `ADVERT_DAYS_TO_LOAD` days.
    pub async fn regenerate_load_grid(&self, store_id: i64) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM stg_advert_load_info WHERE store_id = $1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "INSERT INTO stg_advert_load_info (store_id, advert_id, date, loaded)
             WITH filtered_ids AS (
                 SELECT advert_id FROM stg_advert_list
                 WHERE store_id = $1 AND end_time >= (now() - interval '{ADVERT_DAYS_TO_LOAD} days')
             ),
             date_series AS (
                 SELECT generate_series(
                     date_trunc('day', now() - interval '{ADVERT_DAYS_TO_LOAD} days'),
                     date_trunc('day', now()),
                     interval '1 day'
                 )::date AS report_date
             )
             SELECT $1, fi.advert_id, ds.report_date, false
             FROM filtered_ids fi CROSS JOIN date_series ds"
        );
        sqlx::query(&sql).bind(store_id).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Whether the load grid exactly matches the adverts still in scope
    /// (`stg_advert_list`/`stg_advert_load_info` advert-id sets agree).
    pub async fn load_grid_matches_advert_list(&self, store_id: i64) -> Result<bool, DbError> {
        let sql = format!(
            "WITH info_ids AS (
                SELECT DISTINCT advert_id FROM stg_advert_list
                WHERE store_id = $1 AND end_time >= (now() - interval '{ADVERT_DAYS_TO_LOAD} days')
            ),
            load_ids AS (SELECT DISTINCT advert_id FROM stg_advert_load_info WHERE store_id = $1)
            SELECT NOT EXISTS (
                SELECT advert_id FROM load_ids WHERE advert_id NOT IN (SELECT advert_id FROM info_ids)
                UNION
                SELECT advert_id FROM info_ids WHERE advert_id NOT IN (SELECT advert_id FROM load_ids)
            )"
        );
        let (matches,): (bool,) = sqlx::query_as(&sql).bind(store_id).fetch_one(&self.pool).await?;
        Ok(matches)
    }

    pub async fn is_fully_loaded(&self, store_id: i64) -> Result<bool, DbError> {
        let (count_all, loaded): (i64, i64) = sqlx::query_as(
            "SELECT count(*), count(*) FILTER (WHERE loaded) FROM stg_advert_load_info WHERE store_id = $1",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count_all != 0 && count_all == loaded)
    }

    /// Up to `ADVERT_IDS_CHUNK_MAX_SIZE` unloaded advert ids, each with up to
    /// `ADVERT_DATES_CHUNK_MAX_SIZE` unloaded dates.
    pub async fn next_load_chunks(&self, store_id: i64) -> Result<Vec<LoadChunk>, DbError> {
        let sql = format!(
            "WITH distinct_ids AS (
                SELECT DISTINCT advert_id FROM stg_advert_load_info
                WHERE loaded = false AND store_id = $1
                LIMIT {ADVERT_IDS_CHUNK_MAX_SIZE}
            )
            SELECT li.advert_id, array_agg(li.date ORDER BY li.date)
            FROM stg_advert_load_info li
            JOIN distinct_ids di ON li.advert_id = di.advert_id
            WHERE li.loaded = false
            GROUP BY li.advert_id"
        );
        let rows: Vec<(i64, Vec<NaiveDate>)> = sqlx::query_as(&sql).bind(store_id).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(advert_id, mut dates)| {
                dates.truncate(ADVERT_DATES_CHUNK_MAX_SIZE as usize);
                LoadChunk { advert_id, dates }
            })
            .collect())
    }

    pub async fn upsert_stats(&self, store_id: i64, rows: &[AdvertStatRow]) -> Result<(), DbError> {
        for row in rows {
            sqlx::query(
                "INSERT INTO stg_advert_stats (date, store_id, advert_id, app_type, nm_id, views, clicks, ctr, cpc, sum_rub, atbs, orders, shks, sum_price)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
                 ON CONFLICT (date, store_id, advert_id, app_type, nm_id) DO UPDATE SET
                    views = EXCLUDED.views, clicks = EXCLUDED.clicks, ctr = EXCLUDED.ctr, cpc = EXCLUDED.cpc,
                    sum_rub = EXCLUDED.sum_rub, atbs = EXCLUDED.atbs, orders = EXCLUDED.orders,
                    shks = EXCLUDED.shks, sum_price = EXCLUDED.sum_price",
            )
            .bind(row.date)
            .bind(store_id)
            .bind(row.advert_id)
            .bind(&row.app_type)
            .bind(row.nm_id)
            .bind(row.views)
            .bind(row.clicks)
            .bind(row.ctr)
            .bind(row.cpc)
            .bind(row.sum_rub)
            .bind(row.atbs)
            .bind(row.orders)
            .bind(row.shks)
            .bind(row.sum_price)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn mark_loaded(&self, store_id: i64, chunks: &[LoadChunk]) -> Result<(), DbError> {
        for chunk in chunks {
            for date in &chunk.dates {
                sqlx::query(
                    "UPDATE stg_advert_load_info SET loaded = true
                     WHERE store_id = $1 AND advert_id = $2 AND date = $3",
                )
                .bind(store_id)
                .bind(chunk.advert_id)
                .bind(date)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }
}
