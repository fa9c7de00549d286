use crate::errors::DbError;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct FactStockRow {
    pub nm_id: i64,
    pub stock_count: i64,
    pub to_client_count: i64,
    pub from_client_count: i64,
}

pub struct FactStockRepository {
    pool: PgPool,
}

impl FactStockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Target date is always yesterday; `true` means yesterday is already loaded.
    pub async fn is_yesterday_loaded(&self, store_id: i64) -> Result<bool, DbError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM stg_fact_stock
                WHERE date = CURRENT_DATE - INTERVAL '1 day' AND store_id = $1
            )",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn insert_rows(
        &self,
        store_id: i64,
        date: NaiveDate,
        rows: &[FactStockRow],
    ) -> Result<(), DbError> {
        for row in rows {
            sqlx::query(
                "INSERT INTO stg_fact_stock (date, store_id, nm_id, stock_count, to_client_count, from_client_count)
                 VALUES ($1,$2,$3,$4,$5,$6)",
            )
            .bind(date)
            .bind(store_id)
            .bind(row.nm_id)
            .bind(row.stock_count)
            .bind(row.to_client_count)
            .bind(row.from_client_count)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}
