use crate::errors::DbError;
use sqlx::PgPool;
use tracing::{info, instrument};

/// Idempotent DDL applied once at connect. The real schema lives in whatever
/// migration tooling operates this database (out of scope per the spec);
/// this `CREATE TABLE IF NOT EXISTS` set exists so the crate is runnable
/// against a bare Postgres instance for local development and integration
/// tests.
const TABLES: &[(&str, &str)] = &[
    ("store", r#"
        CREATE TABLE IF NOT EXISTS store (
            store_id BIGINT PRIMARY KEY,
            store_name TEXT NOT NULL,
            api_token TEXT NOT NULL,
            token_is_valid BOOLEAN NOT NULL DEFAULT TRUE,
            secret_key TEXT NOT NULL,
            table_id TEXT NOT NULL
        );
    "#),
    ("store_process", r#"
        CREATE TABLE IF NOT EXISTS store_process (
            store_process_id BIGSERIAL PRIMARY KEY,
            store_id BIGINT NOT NULL REFERENCES store(store_id),
            running BOOLEAN NOT NULL DEFAULT FALSE,
            service TEXT,
            process_health_check TIMESTAMPTZ,
            last_worker_start TIMESTAMPTZ,
            last_worker_end TIMESTAMPTZ,
            last_data_load TIMESTAMPTZ,
            last_dm_etl TIMESTAMPTZ,
            last_client_load TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
    "#),
    ("service_health", r#"
        CREATE TABLE IF NOT EXISTS service_health (
            service_type TEXT NOT NULL,
            service_name TEXT NOT NULL,
            version TEXT NOT NULL,
            last_health_check TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (service_type, service_name)
        );
    "#),
    ("stg_cards_list", r#"
        CREATE TABLE IF NOT EXISTS stg_cards_list (
            store_id BIGINT NOT NULL,
            nm_id BIGINT NOT NULL,
            vendor_code TEXT,
            title TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            UNIQUE (store_id, nm_id)
        );
    "#),
    ("stg_nm_report_detail", r#"
        CREATE TABLE IF NOT EXISTS stg_nm_report_detail (
            date DATE NOT NULL,
            store_id BIGINT NOT NULL,
            nm_id BIGINT NOT NULL,
            open_card_count BIGINT NOT NULL DEFAULT 0,
            add_to_cart_count BIGINT NOT NULL DEFAULT 0,
            orders_count BIGINT NOT NULL DEFAULT 0,
            orders_sum_rub DOUBLE PRECISION NOT NULL DEFAULT 0,
            buyouts_count BIGINT NOT NULL DEFAULT 0,
            buyouts_sum_rub DOUBLE PRECISION NOT NULL DEFAULT 0,
            cancel_count BIGINT NOT NULL DEFAULT 0,
            cancel_sum_rub DOUBLE PRECISION NOT NULL DEFAULT 0,
            avg_price_rub DOUBLE PRECISION NOT NULL DEFAULT 0,
            UNIQUE (date, store_id, nm_id)
        );
    "#),
    ("stg_nm_report_detail_info", r#"
        CREATE TABLE IF NOT EXISTS stg_nm_report_detail_info (
            id BIGSERIAL PRIMARY KEY,
            store_id BIGINT NOT NULL,
            page INT NOT NULL,
            is_next_page BOOLEAN,
            cant_be_load BOOLEAN NOT NULL DEFAULT FALSE,
            fact_date DATE NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            UNIQUE (store_id, fact_date)
        );
    "#),
    ("stg_fact_stock", r#"
        CREATE TABLE IF NOT EXISTS stg_fact_stock (
            date DATE NOT NULL,
            store_id BIGINT NOT NULL,
            nm_id BIGINT NOT NULL,
            stock_count BIGINT NOT NULL DEFAULT 0,
            to_client_count BIGINT NOT NULL DEFAULT 0,
            from_client_count BIGINT NOT NULL DEFAULT 0,
            UNIQUE (date, store_id, nm_id)
        );
    "#),
    ("stg_fact_sales", r#"
        CREATE TABLE IF NOT EXISTS stg_fact_sales (
            sale_id TEXT PRIMARY KEY,
            store_id BIGINT NOT NULL,
            nm_id BIGINT NOT NULL,
            date TIMESTAMPTZ NOT NULL,
            last_change_date TIMESTAMPTZ NOT NULL,
            sale_type TEXT,
            price_with_disc DOUBLE PRECISION
        );
    "#),
    ("stg_fact_sales_progress", r#"
        CREATE TABLE IF NOT EXISTS stg_fact_sales_progress (
            store_id BIGINT PRIMARY KEY,
            last_change_date TIMESTAMPTZ NOT NULL,
            is_final BOOLEAN NOT NULL DEFAULT FALSE
        );
    "#),
    ("stg_advert_list", r#"
        CREATE TABLE IF NOT EXISTS stg_advert_list (
            store_id BIGINT NOT NULL,
            advert_id BIGINT NOT NULL,
            advert_type INT NOT NULL,
            start_time TIMESTAMPTZ,
            end_time TIMESTAMPTZ,
            create_time TIMESTAMPTZ,
            change_time TIMESTAMPTZ,
            last_info_update_time TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            UNIQUE (store_id, advert_id)
        );
    "#),
    ("stg_advert_load_info", r#"
        CREATE TABLE IF NOT EXISTS stg_advert_load_info (
            store_id BIGINT NOT NULL,
            advert_id BIGINT NOT NULL,
            date DATE NOT NULL,
            loaded BOOLEAN NOT NULL DEFAULT FALSE,
            UNIQUE (store_id, advert_id, date)
        );
    "#),
    ("stg_advert_stats", r#"
        CREATE TABLE IF NOT EXISTS stg_advert_stats (
            date DATE NOT NULL,
            store_id BIGINT NOT NULL,
            advert_id BIGINT NOT NULL,
            app_type TEXT NOT NULL,
            nm_id BIGINT NOT NULL,
            views BIGINT NOT NULL DEFAULT 0,
            clicks BIGINT NOT NULL DEFAULT 0,
            ctr DOUBLE PRECISION NOT NULL DEFAULT 0,
            cpc DOUBLE PRECISION NOT NULL DEFAULT 0,
            sum_rub DOUBLE PRECISION NOT NULL DEFAULT 0,
            atbs BIGINT NOT NULL DEFAULT 0,
            orders BIGINT NOT NULL DEFAULT 0,
            shks BIGINT NOT NULL DEFAULT 0,
            sum_price DOUBLE PRECISION NOT NULL DEFAULT 0,
            UNIQUE (date, store_id, advert_id, app_type, nm_id)
        );
    "#),
    ("dim_tech_list", r#"
        CREATE TABLE IF NOT EXISTS dim_tech_list (
            store_id BIGINT NOT NULL,
            date DATE NOT NULL,
            nm_id BIGINT NOT NULL,
            vendor_code TEXT,
            open_card_count BIGINT NOT NULL DEFAULT 0,
            add_to_cart_count BIGINT NOT NULL DEFAULT 0,
            orders_count BIGINT NOT NULL DEFAULT 0,
            orders_sum_rub DOUBLE PRECISION NOT NULL DEFAULT 0,
            fact_byouts_count BIGINT NOT NULL DEFAULT 0,
            fact_byouts_sum DOUBLE PRECISION NOT NULL DEFAULT 0,
            stock_count BIGINT NOT NULL DEFAULT 0,
            to_client_count BIGINT NOT NULL DEFAULT 0,
            from_client_count BIGINT NOT NULL DEFAULT 0,
            views_auto BIGINT NOT NULL DEFAULT 0, clicks_auto BIGINT NOT NULL DEFAULT 0,
            sum_auto DOUBLE PRECISION NOT NULL DEFAULT 0, atbs_auto BIGINT NOT NULL DEFAULT 0,
            orders_auto BIGINT NOT NULL DEFAULT 0, shks_auto BIGINT NOT NULL DEFAULT 0,
            price_auto DOUBLE PRECISION NOT NULL DEFAULT 0,
            views_mix BIGINT NOT NULL DEFAULT 0, clicks_mix BIGINT NOT NULL DEFAULT 0,
            sum_mix DOUBLE PRECISION NOT NULL DEFAULT 0, atbs_mix BIGINT NOT NULL DEFAULT 0,
            orders_mix BIGINT NOT NULL DEFAULT 0, shks_mix BIGINT NOT NULL DEFAULT 0,
            price_mix DOUBLE PRECISION NOT NULL DEFAULT 0,
            views_search BIGINT NOT NULL DEFAULT 0, clicks_search BIGINT NOT NULL DEFAULT 0,
            sum_search DOUBLE PRECISION NOT NULL DEFAULT 0, atbs_search BIGINT NOT NULL DEFAULT 0,
            orders_search BIGINT NOT NULL DEFAULT 0, shks_search BIGINT NOT NULL DEFAULT 0,
            price_search DOUBLE PRECISION NOT NULL DEFAULT 0,
            views_cat BIGINT NOT NULL DEFAULT 0, clicks_cat BIGINT NOT NULL DEFAULT 0,
            sum_cat DOUBLE PRECISION NOT NULL DEFAULT 0, atbs_cat BIGINT NOT NULL DEFAULT 0,
            orders_cat BIGINT NOT NULL DEFAULT 0, shks_cat BIGINT NOT NULL DEFAULT 0,
            price_cat DOUBLE PRECISION NOT NULL DEFAULT 0,
            views_card BIGINT NOT NULL DEFAULT 0, clicks_card BIGINT NOT NULL DEFAULT 0,
            sum_card DOUBLE PRECISION NOT NULL DEFAULT 0, atbs_card BIGINT NOT NULL DEFAULT 0,
            orders_card BIGINT NOT NULL DEFAULT 0, shks_card BIGINT NOT NULL DEFAULT 0,
            price_card DOUBLE PRECISION NOT NULL DEFAULT 0,
            views_main BIGINT NOT NULL DEFAULT 0, clicks_main BIGINT NOT NULL DEFAULT 0,
            sum_main DOUBLE PRECISION NOT NULL DEFAULT 0, atbs_main BIGINT NOT NULL DEFAULT 0,
            orders_main BIGINT NOT NULL DEFAULT 0, shks_main BIGINT NOT NULL DEFAULT 0,
            price_main DOUBLE PRECISION NOT NULL DEFAULT 0,
            PRIMARY KEY (store_id, date, nm_id)
        );
    "#),
];

#[instrument(skip(pool))]
pub async fn apply_schema(pool: &PgPool) -> Result<(), DbError> {
    for (name, ddl) in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| DbError::Mapping(format!("schema bootstrap failed for {name}: {e}")))?;
    }
    info!("store-process schema bootstrap complete");
    Ok(())
}
