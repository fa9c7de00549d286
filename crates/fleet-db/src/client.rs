use crate::errors::DbError;
use crate::schema::apply_schema;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

/// One pooled Postgres connection per process. The spec models the process
/// as holding a single connection with `SET timezone = 'Europe/Moscow'`
/// applied once at connect; a small pool (capped at 1) gives the same
/// serialized-per-process behavior while still letting sqlx manage
/// reconnection transparently.
#[derive(Clone)]
pub struct FleetDatabase {
    pool: PgPool,
}

impl FleetDatabase {
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        if database_url.is_empty() {
            return Err(DbError::Configuration("DATABASE_URL is empty".into()));
        }

        info!("connecting to store-process database");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("SET timezone = 'Europe/Moscow'")
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        apply_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
