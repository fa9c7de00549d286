use crate::errors::DbError;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct FactSalesProgress {
    pub last_change_date: DateTime<Utc>,
    pub is_final: bool,
}

pub struct FactSalesRow {
    pub sale_id: String,
    pub nm_id: i64,
    pub date: DateTime<Utc>,
    pub last_change_date: DateTime<Utc>,
    pub sale_type: Option<String>,
    pub price_with_disc: Option<f64>,
}

pub struct FactSalesRepository {
    pool: PgPool,
}

impl FactSalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn progress(&self, store_id: i64, default_cursor: DateTime<Utc>) -> Result<FactSalesProgress, DbError> {
        let row: Option<(DateTime<Utc>, bool)> = sqlx::query_as(
            "SELECT last_change_date, is_final FROM stg_fact_sales_progress WHERE store_id = $1",
        )
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some((last_change_date, is_final)) => FactSalesProgress { last_change_date, is_final },
            None => FactSalesProgress { last_change_date: default_cursor, is_final: false },
        })
    }

    pub async fn upsert_rows(&self, store_id: i64, rows: &[FactSalesRow]) -> Result<(), DbError> {
        for row in rows {
            sqlx::query(
                "INSERT INTO stg_fact_sales (sale_id, store_id, nm_id, date, last_change_date, sale_type, price_with_disc)
                 VALUES ($1,$2,$3,$4,$5,$6,$7)
                 ON CONFLICT (sale_id) DO UPDATE SET
                    last_change_date = EXCLUDED.last_change_date,
                    price_with_disc = EXCLUDED.price_with_disc",
            )
            .bind(&row.sale_id)
            .bind(store_id)
            .bind(row.nm_id)
            .bind(row.date)
            .bind(row.last_change_date)
            .bind(&row.sale_type)
            .bind(row.price_with_disc)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn advance_progress(
        &self,
        store_id: i64,
        last_change_date: DateTime<Utc>,
        is_final: bool,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO stg_fact_sales_progress (store_id, last_change_date, is_final)
             VALUES ($1, $2, $3)
             ON CONFLICT (store_id) DO UPDATE SET last_change_date = EXCLUDED.last_change_date, is_final = EXCLUDED.is_final",
        )
        .bind(store_id)
        .bind(last_change_date)
        .bind(is_final)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
