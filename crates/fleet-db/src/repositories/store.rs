use crate::errors::DbError;
use fleet_domain::Store;
use sqlx::{PgPool, Row};

/// Lookup for the store row a lease points at — the worker needs the
/// marketplace api token, the manager only the store id, but both go
/// through this one repository.
pub struct StoreRepository {
    pool: PgPool,
}

fn row_to_store(row: &sqlx::postgres::PgRow) -> Result<Store, DbError> {
    Ok(Store {
        store_id: row.try_get("store_id").map_err(DbError::Query)?,
        store_name: row.try_get("store_name").map_err(DbError::Query)?,
        api_token: row.try_get("api_token").map_err(DbError::Query)?,
        token_is_valid: row.try_get("token_is_valid").map_err(DbError::Query)?,
        secret_key: row.try_get("secret_key").map_err(DbError::Query)?,
        table_id: row.try_get("table_id").map_err(DbError::Query)?,
    })
}

impl StoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, store_id: i64) -> Result<Option<Store>, DbError> {
        let row = sqlx::query("SELECT * FROM store WHERE store_id = $1")
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_store).transpose()
    }
}
