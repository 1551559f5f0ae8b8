//! Embedded migrations and database bootstrap, as used by `wedplan db-init`.

use uuid::Uuid;

use wedplan_db::config::DbConfig;
use wedplan_db::pool;
use wedplan_test_utils::{create_test_db, drop_test_db, pg_url};

#[tokio::test]
async fn migrations_are_idempotent() {
    let (temp_pool, db_name) = create_test_db().await;

    // create_test_db already migrated once; a second run is a no-op.
    pool::run_migrations(&temp_pool)
        .await
        .expect("second migration run should succeed");

    let counts = pool::table_counts(&temp_pool).await.unwrap();
    assert_eq!(counts.len(), 7);
    for (table, count) in &counts {
        assert_eq!(*count, 0, "table {table} should be empty after migrations");
    }

    temp_pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ensure_database_exists_creates_then_noops() {
    let db_name = format!("wedplan_test_{}", Uuid::new_v4().simple());
    let config = DbConfig::new(format!("{}/{db_name}", pg_url().await)).with_max_connections(2);

    pool::ensure_database_exists(&config)
        .await
        .expect("first ensure should create the database");
    pool::ensure_database_exists(&config)
        .await
        .expect("second ensure should be a no-op");

    let db_pool = pool::create_pool(&config).await.unwrap();
    pool::run_migrations(&db_pool).await.unwrap();
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&db_pool).await.unwrap();
    assert_eq!(one, 1);
    db_pool.close().await;

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn ensure_database_exists_rejects_unsafe_names() {
    let config = DbConfig::new(format!("{}/bad-name;drop", pg_url().await));
    let err = pool::ensure_database_exists(&config).await.unwrap_err();
    assert!(err.to_string().contains("invalid characters"));
}
