use crate::errors::DbError;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub const ADVERT_INFO_BATCH_SIZE: i64 = 45;

pub struct AdvertListRow {
    pub advert_id: i64,
    pub advert_type: i32,
}

pub struct AdvertInfoUpdate {
    pub advert_id: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub create_time: Option<DateTime<Utc>>,
    pub change_time: Option<DateTime<Utc>>,
}

pub struct AdvertInfoRepository {
    pool: PgPool,
}

impl AdvertInfoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Phase A freshness: the advert list is fresh if it was written within
    /// the SLA window (or the store genuinely has zero adverts).
    pub async fn advert_list_is_fresh(&self, store_id: i64, sla: &str) -> Result<bool, DbError> {
        let sql = format!(
            "SELECT NOT EXISTS (
                SELECT 1 FROM stg_advert_list
                WHERE store_id = $1 AND created_at <= now() - interval '{sla}'
            ) AND EXISTS (SELECT 1 FROM stg_advert_list WHERE store_id = $1)"
        );
        let (fresh,): (bool,) = sqlx::query_as(&sql).bind(store_id).fetch_one(&self.pool).await?;
        Ok(fresh)
    }

    pub async fn replace_advert_list(&self, store_id: i64, rows: &[AdvertListRow]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM stg_advert_list WHERE store_id = $1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;
        for row in rows {
            sqlx::query(
                "INSERT INTO stg_advert_list (store_id, advert_id, advert_type, created_at)
                 VALUES ($1, $2, $3, now())
                 ON CONFLICT (store_id, advert_id) DO NOTHING",
            )
            .bind(store_id)
            .bind(row.advert_id)
            .bind(row.advert_type)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Phase B: adverts lacking a fresh `last_info_update_time`, oldest first.
    pub async fn adverts_needing_info(&self, store_id: i64, sla: &str, limit: i64) -> Result<Vec<i64>, DbError> {
        let sql = format!(
            "SELECT advert_id FROM stg_advert_list
             WHERE store_id = $1 AND (last_info_update_time IS NULL OR last_info_update_time <= now() - interval '{sla}')
             ORDER BY advert_id ASC
             LIMIT $2"
        );
        let rows: Vec<(i64,)> = sqlx::query_as(&sql).bind(store_id).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn advert_info_is_fresh(&self, store_id: i64, sla: &str) -> Result<bool, DbError> {
        let sql = format!(
            "SELECT NOT EXISTS (
                SELECT 1 FROM stg_advert_list
                WHERE store_id = $1 AND (last_info_update_time IS NULL OR last_info_update_time <= now() - interval '{sla}')
            )"
        );
        let (fresh,): (bool,) = sqlx::query_as(&sql).bind(store_id).fetch_one(&self.pool).await?;
        Ok(fresh)
    }

    pub async fn apply_info_updates(&self, store_id: i64, updates: &[AdvertInfoUpdate]) -> Result<(), DbError> {
        for update in updates {
            sqlx::query(
                "UPDATE stg_advert_list
                 SET start_time = $1, end_time = $2, create_time = $3, change_time = $4, last_info_update_time = now()
                 WHERE store_id = $5 AND advert_id = $6",
            )
            .bind(update.start_time)
            .bind(update.end_time)
            .bind(update.create_time)
            .bind(update.change_time)
            .bind(store_id)
            .bind(update.advert_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}
