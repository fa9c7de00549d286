// [crates/fleet-db/src/repositories/dimensional.rs]
/*!
 * =================================================================
 * APARATO: DIMENSIONAL ETL + EXPORT PROJECTION (V7.0 - FLOTA SOBERANA)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: FUSIÓN DE STAGING EN `dim_tech_list` Y PROYECCIÓN PLANA
 *
 * VISION:
 * 1. ATOMIC REWRITE: DELETE + INSERT...SELECT dentro de una sola
 *    transacción — ninguna fila a medio escribir sobrevive a un fallo.
 * 2. SCHEMA-DRIVEN EXPORT: Las columnas de la hoja de cálculo se descubren
 *    vía `information_schema`, nunca hardcodeadas.
 *    =================================================================
 */

use crate::errors::DbError;
use sqlx::{PgPool, Row};

/// Header row plus data rows for one store's `dim_tech_list` slice, shaped
/// for a spreadsheet `values.update` call (`google_sheet_uploader.py`'s
/// `fetch_all_with_headers` contract: row 0 is the column names). Cells are
/// text, matching what a spreadsheet API accepts in a RAW `values.update`.
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Runs the ETL join (staging -> `dim_tech_list`) for one store inside a
/// single transaction, then stamps `last_dm_etl`/`running = false` on the
/// store's lease row. Mirrors the original manager's select-then-insert
/// pair, but as one `INSERT ... SELECT` instead of materializing rows in
/// the application.
pub struct DimensionalRepository {
    pool: PgPool,
}

impl DimensionalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_etl(&self, store_id: i64) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM dim_tech_list WHERE store_id = $1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(INSERT_QUERY).bind(store_id).execute(&mut *tx).await?;

        sqlx::query(
            "UPDATE store_process SET last_dm_etl = now(), running = false WHERE store_id = $1",
        )
        .bind(store_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Discovers `dim_tech_list`'s columns via `information_schema.columns`
    /// (skipping `id`/`created_at`, matching the uploader's `ignore_columns`)
    /// and coalesces every column but `date`/`vendor_code` to zero, mirroring
    /// `_build_data_query`'s `coalesce_ignore_columns`.
    pub async fn export_table(&self, store_id: i64) -> Result<ExportTable, DbError> {
        let column_rows = sqlx::query(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = 'dim_tech_list'
             ORDER BY ordinal_position",
        )
        .fetch_all(&self.pool)
        .await?;

        let headers: Vec<String> = column_rows
            .iter()
            .map(|row| row.try_get::<String, _>("column_name").map_err(DbError::Query))
            .collect::<Result<_, _>>()?;
        let headers: Vec<String> = headers
            .into_iter()
            .filter(|c| c != "id" && c != "created_at")
            .collect();

        let select_list = headers
            .iter()
            .map(|c| {
                let coalesced = if c == "date" || c == "vendor_code" { c.clone() } else { format!("COALESCE({c}, 0)") };
                format!("({coalesced})::text AS {c}")
            })
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!("SELECT {select_list} FROM dim_tech_list WHERE store_id = $1");
        let data_rows = sqlx::query(&sql).bind(store_id).fetch_all(&self.pool).await?;

        let rows = data_rows
            .iter()
            .map(|row| {
                (0..headers.len())
                    .map(|i| row.try_get::<Option<String>, _>(i).map_err(DbError::Query))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExportTable { headers, rows })
    }
}

const INSERT_QUERY: &str = r#"
INSERT INTO dim_tech_list (
    store_id, date, nm_id, vendor_code,
    open_card_count, add_to_cart_count, orders_count, orders_sum_rub,
    fact_byouts_count, fact_byouts_sum,
    stock_count, to_client_count, from_client_count,
    views_auto, clicks_auto, sum_auto, atbs_auto, orders_auto, shks_auto, price_auto,
    views_mix, clicks_mix, sum_mix, atbs_mix, orders_mix, shks_mix, price_mix,
    views_search, clicks_search, sum_search, atbs_search, orders_search, shks_search, price_search,
    views_cat, clicks_cat, sum_cat, atbs_cat, orders_cat, shks_cat, price_cat,
    views_card, clicks_card, sum_card, atbs_card, orders_card, shks_card, price_card,
    views_main, clicks_main, sum_main, atbs_main, orders_main, shks_main, price_main
)
WITH
advert_base AS (
    SELECT
        sas.date, sas.nm_id, sal.advert_type,
        SUM(sas.views) AS views, SUM(sas.clicks) AS clicks,
        SUM(sas.sum_rub) AS sum_rub, SUM(sas.atbs) AS atbs,
        SUM(sas.orders) AS orders, SUM(sas.shks) AS shks,
        SUM(sas.sum_price) AS sum_price
    FROM stg_advert_stats sas
    JOIN stg_advert_list sal ON sas.store_id = sal.store_id AND sas.advert_id = sal.advert_id
    WHERE sas.store_id = $1
    GROUP BY sas.date, sas.nm_id, sal.advert_type
),
store_nm_report AS (
    SELECT snrd.date, snrd.nm_id, scl.vendor_code, snrd.open_card_count,
           snrd.add_to_cart_count, snrd.orders_count, snrd.orders_sum_rub
    FROM stg_nm_report_detail snrd
    JOIN stg_cards_list scl ON scl.nm_id = snrd.nm_id AND scl.store_id = snrd.store_id
    WHERE snrd.store_id = $1 AND snrd.date >= CURRENT_DATE - INTERVAL '89 days'
),
sales_fact AS (
    SELECT date, nm_id,
           COUNT(*) FILTER (WHERE sale_type = 'S') - COUNT(*) FILTER (WHERE sale_type = 'R') AS fact_byouts_count,
           SUM(price_with_disc) AS fact_byouts_sum
    FROM stg_fact_sales
    WHERE store_id = $1
    GROUP BY date, nm_id
),
stock_fact AS (
    SELECT * FROM stg_fact_stock WHERE store_id = $1
),
advert_data AS (
    SELECT date, nm_id,
        SUM(views) FILTER (WHERE advert_type = 8) AS views_auto,
        SUM(clicks) FILTER (WHERE advert_type = 8) AS clicks_auto,
        SUM(sum_rub) FILTER (WHERE advert_type = 8) AS sum_auto,
        SUM(atbs) FILTER (WHERE advert_type = 8) AS atbs_auto,
        SUM(orders) FILTER (WHERE advert_type = 8) AS orders_auto,
        SUM(shks) FILTER (WHERE advert_type = 8) AS shks_auto,
        SUM(sum_price) FILTER (WHERE advert_type = 8) AS price_auto,
        SUM(views) FILTER (WHERE advert_type = 9) AS views_mix,
        SUM(clicks) FILTER (WHERE advert_type = 9) AS clicks_mix,
        SUM(sum_rub) FILTER (WHERE advert_type = 9) AS sum_mix,
        SUM(atbs) FILTER (WHERE advert_type = 9) AS atbs_mix,
        SUM(orders) FILTER (WHERE advert_type = 9) AS orders_mix,
        SUM(shks) FILTER (WHERE advert_type = 9) AS shks_mix,
        SUM(sum_price) FILTER (WHERE advert_type = 9) AS price_mix,
        SUM(views) FILTER (WHERE advert_type = 6) AS views_search,
        SUM(clicks) FILTER (WHERE advert_type = 6) AS clicks_search,
        SUM(sum_rub) FILTER (WHERE advert_type = 6) AS sum_search,
        SUM(atbs) FILTER (WHERE advert_type = 6) AS atbs_search,
        SUM(orders) FILTER (WHERE advert_type = 6) AS orders_search,
        SUM(shks) FILTER (WHERE advert_type = 6) AS shks_search,
        SUM(sum_price) FILTER (WHERE advert_type = 6) AS price_search,
        SUM(views) FILTER (WHERE advert_type = 4) AS views_cat,
        SUM(clicks) FILTER (WHERE advert_type = 4) AS clicks_cat,
        SUM(sum_rub) FILTER (WHERE advert_type = 4) AS sum_cat,
        SUM(atbs) FILTER (WHERE advert_type = 4) AS atbs_cat,
        SUM(orders) FILTER (WHERE advert_type = 4) AS orders_cat,
        SUM(shks) FILTER (WHERE advert_type = 4) AS shks_cat,
        SUM(sum_price) FILTER (WHERE advert_type = 4) AS price_cat,
        SUM(views) FILTER (WHERE advert_type = 5) AS views_card,
        SUM(clicks) FILTER (WHERE advert_type = 5) AS clicks_card,
        SUM(sum_rub) FILTER (WHERE advert_type = 5) AS sum_card,
        SUM(atbs) FILTER (WHERE advert_type = 5) AS atbs_card,
        SUM(orders) FILTER (WHERE advert_type = 5) AS orders_card,
        SUM(shks) FILTER (WHERE advert_type = 5) AS shks_card,
        SUM(sum_price) FILTER (WHERE advert_type = 5) AS price_card,
        SUM(views) FILTER (WHERE advert_type = 7) AS views_main,
        SUM(clicks) FILTER (WHERE advert_type = 7) AS clicks_main,
        SUM(sum_rub) FILTER (WHERE advert_type = 7) AS sum_main,
        SUM(atbs) FILTER (WHERE advert_type = 7) AS atbs_main,
        SUM(orders) FILTER (WHERE advert_type = 7) AS orders_main,
        SUM(shks) FILTER (WHERE advert_type = 7) AS shks_main,
        SUM(sum_price) FILTER (WHERE advert_type = 7) AS price_main
    FROM advert_base
    GROUP BY date, nm_id
)
SELECT
    $1, store_nm_report.date, store_nm_report.nm_id, store_nm_report.vendor_code,
    store_nm_report.open_card_count, store_nm_report.add_to_cart_count,
    store_nm_report.orders_count, store_nm_report.orders_sum_rub,
    COALESCE(sales_fact.fact_byouts_count, 0), COALESCE(sales_fact.fact_byouts_sum, 0),
    COALESCE(stock_fact.stock_count, 0), COALESCE(stock_fact.to_client_count, 0), COALESCE(stock_fact.from_client_count, 0),
    COALESCE(advert_data.views_auto, 0), COALESCE(advert_data.clicks_auto, 0), COALESCE(advert_data.sum_auto, 0),
    COALESCE(advert_data.atbs_auto, 0), COALESCE(advert_data.orders_auto, 0), COALESCE(advert_data.shks_auto, 0),
    COALESCE(advert_data.price_auto, 0),
    COALESCE(advert_data.views_mix, 0), COALESCE(advert_data.clicks_mix, 0), COALESCE(advert_data.sum_mix, 0),
    COALESCE(advert_data.atbs_mix, 0), COALESCE(advert_data.orders_mix, 0), COALESCE(advert_data.shks_mix, 0),
    COALESCE(advert_data.price_mix, 0),
    COALESCE(advert_data.views_search, 0), COALESCE(advert_data.clicks_search, 0), COALESCE(advert_data.sum_search, 0),
    COALESCE(advert_data.atbs_search, 0), COALESCE(advert_data.orders_search, 0), COALESCE(advert_data.shks_search, 0),
    COALESCE(advert_data.price_search, 0),
    COALESCE(advert_data.views_cat, 0), COALESCE(advert_data.clicks_cat, 0), COALESCE(advert_data.sum_cat, 0),
    COALESCE(advert_data.atbs_cat, 0), COALESCE(advert_data.orders_cat, 0), COALESCE(advert_data.shks_cat, 0),
    COALESCE(advert_data.price_cat, 0),
    COALESCE(advert_data.views_card, 0), COALESCE(advert_data.clicks_card, 0), COALESCE(advert_data.sum_card, 0),
    COALESCE(advert_data.atbs_card, 0), COALESCE(advert_data.orders_card, 0), COALESCE(advert_data.shks_card, 0),
    COALESCE(advert_data.price_card, 0),
    COALESCE(advert_data.views_main, 0), COALESCE(advert_data.clicks_main, 0), COALESCE(advert_data.sum_main, 0),
    COALESCE(advert_data.atbs_main, 0), COALESCE(advert_data.orders_main, 0), COALESCE(advert_data.shks_main, 0),
    COALESCE(advert_data.price_main, 0)
FROM store_nm_report
LEFT JOIN sales_fact ON sales_fact.nm_id = store_nm_report.nm_id AND sales_fact.date = store_nm_report.date
LEFT JOIN stock_fact ON stock_fact.nm_id = store_nm_report.nm_id AND stock_fact.date = store_nm_report.date
LEFT JOIN advert_data ON advert_data.nm_id = store_nm_report.nm_id AND advert_data.date = store_nm_report.date
ORDER BY store_nm_report.date, store_nm_report.nm_id
"#;
