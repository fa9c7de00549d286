//! Idempotence of the staging upserts (§8): re-ingesting the same page of
//! marketplace data must not duplicate rows or fail.

use fleet_db::repositories::staging::cards_list::CardsListRow;
use fleet_db::CardsListRepository;
use fleet_db::FleetDatabase;

async fn test_db() -> Option<FleetDatabase> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    };
    Some(FleetDatabase::connect(&url).await.expect("connect"))
}

#[tokio::test]
async fn replace_all_is_idempotent_under_repeated_ingestion() {
    let Some(db) = test_db().await else { return };
    let store_id = 920_001;
    let repo = CardsListRepository::new(db.pool().clone());

    let rows = vec![
        CardsListRow { nm_id: 1, vendor_code: Some("sku-1".into()), title: Some("first".into()) },
        CardsListRow { nm_id: 2, vendor_code: Some("sku-2".into()), title: Some("second".into()) },
    ];

    repo.replace_all(store_id, &rows).await.unwrap();
    let (_, count_after_first) = repo.freshness(store_id, "1 second").await.unwrap();
    assert_eq!(count_after_first, 2);

    // Re-ingesting the identical page must leave the row count unchanged.
    repo.replace_all(store_id, &rows).await.unwrap();
    let (_, count_after_second) = repo.freshness(store_id, "1 second").await.unwrap();
    assert_eq!(count_after_second, 2);
}

#[tokio::test]
async fn freshness_reports_success_only_once_every_row_is_within_the_sla() {
    let Some(db) = test_db().await else { return };
    let store_id = 920_002;
    let repo = CardsListRepository::new(db.pool().clone());

    // Previous runs of this same test leave their row behind (this file has
    // no per-test table wipe, unlike the lease tests); start from a clean
    // slate for this store before asserting the empty-store baseline.
    sqlx::query("DELETE FROM stg_cards_list WHERE store_id = $1")
        .bind(store_id)
        .execute(db.pool())
        .await
        .unwrap();

    let (actual, count_all) = repo.freshness(store_id, "6 hours 15 minutes").await.unwrap();
    assert_eq!((actual, count_all), (0, 0), "an empty store has no rows to be fresh");

    repo.replace_all(
        store_id,
        &[CardsListRow { nm_id: 42, vendor_code: None, title: None }],
    )
    .await
    .unwrap();

    let (actual, count_all) = repo.freshness(store_id, "6 hours 15 minutes").await.unwrap();
    assert_eq!(actual, count_all);
    assert_eq!(count_all, 1);
}
