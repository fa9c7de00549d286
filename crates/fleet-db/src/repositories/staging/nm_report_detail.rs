use crate::errors::DbError;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};

pub const TARGET_DATES_AMOUNT: i64 = 90;

pub struct NextToLoad {
    pub target_date: NaiveDate,
    pub target_id: Option<i64>,
    pub page: Option<i32>,
    pub is_next_page: Option<bool>,
}

pub struct ReportDetailRow {
    pub nm_id: i64,
    pub open_card_count: i64,
    pub add_to_cart_count: i64,
    pub orders_count: i64,
    pub orders_sum_rub: f64,
    pub buyouts_count: i64,
    pub buyouts_sum_rub: f64,
    pub cancel_count: i64,
    pub cancel_sum_rub: f64,
    pub avg_price_rub: f64,
}

pub struct NmReportDetailRepository {
    pool: PgPool,
}

impl NmReportDetailRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mirrors the original `get_next_to_load` query: the last
    /// `TARGET_DATES_AMOUNT` days before the SLA window, left-joined against
    /// the per-date progress table, picking the earliest date still missing
    /// a progress row or still mid-pagination.
    pub async fn next_to_load(&self, store_id: i64, sla: &str) -> Result<Option<NextToLoad>, DbError> {
        let sql = format!(
            "SELECT * FROM (
                WITH target_dates AS (
                    SELECT (date_trunc('day', generate_series(
                        ((now() - interval '{sla}') - interval '{TARGET_DATES_AMOUNT} days')::date,
                        ((now() - interval '{sla}') - interval '1 days')::date,
                        interval '1 day'
                    )))::date AS target_date
                ),
                store_info AS (
                    SELECT id, fact_date, page, is_next_page, cant_be_load
                    FROM stg_nm_report_detail_info WHERE store_id = $1
                )
                SELECT td.target_date, si.id, si.page, si.is_next_page, si.cant_be_load
                FROM target_dates td
                LEFT JOIN store_info si ON td.target_date = si.fact_date
            ) m
            WHERE m.is_next_page = true OR m.is_next_page IS NULL
            LIMIT 1"
        );

        let row = sqlx::query(&sql).bind(store_id).fetch_optional(&self.pool).await?;
        Ok(match row {
            Some(r) => Some(NextToLoad {
                target_date: r.try_get("target_date").map_err(DbError::Query)?,
                target_id: r.try_get("id").map_err(DbError::Query)?,
                page: r.try_get("page").map_err(DbError::Query)?,
                is_next_page: r.try_get("is_next_page").map_err(DbError::Query)?,
            }),
            None => None,
        })
    }

    pub async fn delete_date(&self, store_id: i64, date: NaiveDate) -> Result<(), DbError> {
        sqlx::query("DELETE FROM stg_nm_report_detail WHERE store_id = $1 AND date = $2")
            .bind(store_id)
            .bind(date)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_rows(
        &self,
        store_id: i64,
        date: NaiveDate,
        rows: &[ReportDetailRow],
    ) -> Result<(), DbError> {
        for row in rows {
            sqlx::query(
                "INSERT INTO stg_nm_report_detail
                    (date, store_id, nm_id, open_card_count, add_to_cart_count, orders_count,
                     orders_sum_rub, buyouts_count, buyouts_sum_rub, cancel_count, cancel_sum_rub, avg_price_rub)
                 VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
                 ON CONFLICT (date, store_id, nm_id) DO NOTHING",
            )
            .bind(date)
            .bind(store_id)
            .bind(row.nm_id)
            .bind(row.open_card_count)
            .bind(row.add_to_cart_count)
            .bind(row.orders_count)
            .bind(row.orders_sum_rub)
            .bind(row.buyouts_count)
            .bind(row.buyouts_sum_rub)
            .bind(row.cancel_count)
            .bind(row.cancel_sum_rub)
            .bind(row.avg_price_rub)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn insert_progress(
        &self,
        store_id: i64,
        date: NaiveDate,
        page: i32,
        is_next_page: bool,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO stg_nm_report_detail_info (store_id, page, is_next_page, cant_be_load, fact_date, created_at)
             VALUES ($1, $2, $3, false, $4, now())",
        )
        .bind(store_id)
        .bind(page)
        .bind(is_next_page)
        .bind(date)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_progress(
        &self,
        target_id: i64,
        store_id: i64,
        date: NaiveDate,
        page: i32,
        is_next_page: bool,
    ) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE stg_nm_report_detail_info
             SET store_id = $1, page = $2, is_next_page = $3, cant_be_load = false, fact_date = $4, created_at = now()
             WHERE id = $5",
        )
        .bind(store_id)
        .bind(page)
        .bind(is_next_page)
        .bind(date)
        .bind(target_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
