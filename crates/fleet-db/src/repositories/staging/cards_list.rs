use crate::errors::DbError;
use sqlx::PgPool;

pub struct CardsListRow {
    pub nm_id: i64,
    pub vendor_code: Option<String>,
    pub title: Option<String>,
}

pub struct CardsListRepository {
    pool: PgPool,
}

impl CardsListRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `{actual, count_all}` freshness counts per §8 S3: `actual` rows were
    /// written inside the current SLA window, `count_all` is every row for
    /// the store. SUCCESS requires `actual == count_all`.
    pub async fn freshness(&self, store_id: i64, sla: &str) -> Result<(i64, i64), DbError> {
        let sql = format!(
            "SELECT
                count(*) FILTER (WHERE created_at > now() - interval '{sla}') AS actual,
                count(*) AS count_all
             FROM stg_cards_list WHERE store_id = $1"
        );
        let row: (i64, i64) = sqlx::query_as(&sql)
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn replace_all(&self, store_id: i64, rows: &[CardsListRow]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM stg_cards_list WHERE store_id = $1")
            .bind(store_id)
            .execute(&mut *tx)
            .await?;

        for row in rows {
            sqlx::query(
                "INSERT INTO stg_cards_list (store_id, nm_id, vendor_code, title, created_at)
                 VALUES ($1, $2, $3, $4, now())
                 ON CONFLICT (store_id, nm_id) DO NOTHING",
            )
            .bind(store_id)
            .bind(row.nm_id)
            .bind(&row.vendor_code)
            .bind(&row.title)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
