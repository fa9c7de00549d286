//! The dimensional ETL join and the spreadsheet-export projection, run
//! against a real Postgres instance.

use fleet_db::{DimensionalRepository, FleetDatabase};

async fn test_db() -> Option<FleetDatabase> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    };
    Some(FleetDatabase::connect(&url).await.expect("connect"))
}

#[tokio::test]
async fn run_etl_joins_staging_into_dim_tech_list() {
    let Some(db) = test_db().await else { return };
    let store_id = 930_001;
    let pool = db.pool();

    sqlx::query(
        "INSERT INTO stg_cards_list (store_id, nm_id, vendor_code, title)
         VALUES ($1, 55, 'sku-55', 'widget') ON CONFLICT (store_id, nm_id) DO NOTHING",
    )
    .bind(store_id)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO stg_nm_report_detail
            (date, store_id, nm_id, open_card_count, add_to_cart_count, orders_count, orders_sum_rub)
         VALUES (CURRENT_DATE, $1, 55, 10, 3, 1, 999.0)
         ON CONFLICT (date, store_id, nm_id) DO NOTHING",
    )
    .bind(store_id)
    .execute(pool)
    .await
    .unwrap();

    let dimensional = DimensionalRepository::new(pool.clone());
    dimensional.run_etl(store_id).await.unwrap();

    let row = sqlx::query_as::<_, (i64, Option<String>, i64)>(
        "SELECT nm_id, vendor_code, open_card_count FROM dim_tech_list WHERE store_id = $1",
    )
    .bind(store_id)
    .fetch_one(pool)
    .await
    .unwrap();

    assert_eq!(row, (55, Some("sku-55".to_string()), 10));
}

#[tokio::test]
async fn run_etl_is_idempotent_on_rerun() {
    let Some(db) = test_db().await else { return };
    let store_id = 930_002;
    let pool = db.pool();

    sqlx::query(
        "INSERT INTO stg_cards_list (store_id, nm_id, vendor_code, title)
         VALUES ($1, 77, 'sku-77', 'gadget') ON CONFLICT (store_id, nm_id) DO NOTHING",
    )
    .bind(store_id)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO stg_nm_report_detail
            (date, store_id, nm_id, open_card_count, add_to_cart_count, orders_count, orders_sum_rub)
         VALUES (CURRENT_DATE, $1, 77, 1, 1, 1, 1.0)
         ON CONFLICT (date, store_id, nm_id) DO NOTHING",
    )
    .bind(store_id)
    .execute(pool)
    .await
    .unwrap();

    let dimensional = DimensionalRepository::new(pool.clone());
    dimensional.run_etl(store_id).await.unwrap();
    dimensional.run_etl(store_id).await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM dim_tech_list WHERE store_id = $1")
        .bind(store_id)
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(count, 1, "re-running the ETL must not duplicate rows");
}

#[tokio::test]
async fn export_table_excludes_id_and_created_at_and_coalesces_numeric_columns() {
    let Some(db) = test_db().await else { return };
    let store_id = 930_003;
    let pool = db.pool();

    sqlx::query(
        "INSERT INTO stg_cards_list (store_id, nm_id, vendor_code, title)
         VALUES ($1, 91, 'sku-91', 'thing') ON CONFLICT (store_id, nm_id) DO NOTHING",
    )
    .bind(store_id)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO stg_nm_report_detail
            (date, store_id, nm_id, open_card_count, add_to_cart_count, orders_count, orders_sum_rub)
         VALUES (CURRENT_DATE, $1, 91, 5, 2, 1, 50.0)
         ON CONFLICT (date, store_id, nm_id) DO NOTHING",
    )
    .bind(store_id)
    .execute(pool)
    .await
    .unwrap();

    let dimensional = DimensionalRepository::new(pool.clone());
    dimensional.run_etl(store_id).await.unwrap();

    let table = dimensional.export_table(store_id).await.unwrap();
    assert!(!table.headers.contains(&"id".to_string()));
    assert!(!table.headers.contains(&"created_at".to_string()));
    assert!(table.headers.contains(&"vendor_code".to_string()));

    let nm_id_col = table.headers.iter().position(|h| h == "nm_id").unwrap();
    let row = table.rows.iter().find(|r| r[nm_id_col].as_deref() == Some("91")).unwrap();

    let fact_byouts_col = table.headers.iter().position(|h| h == "fact_byouts_count").unwrap();
    assert_eq!(row[fact_byouts_col].as_deref(), Some("0"));
}
