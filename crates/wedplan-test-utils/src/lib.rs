//! Shared test utilities for wedplan integration tests.
//!
//! Provides a PostgreSQL instance shared across tests, one fresh database
//! per test, and seed helpers for users and catalog vendors.
//!
//! Two modes:
//! - **`WEDPLAN_TEST_PG_URL`** set: use that server directly (CI service
//!   container or a local instance).
//! - **No env var**: spin up a container via testcontainers, shared per test
//!   binary through a `OnceCell`.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use wedplan_db::models::{User, Vendor, VendorCategory};
use wedplan_db::pool;
use wedplan_db::queries::{users, vendors};

struct SharedPg {
    base_url: String,
    /// Held to keep the container alive. `None` when using an external URL.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_PG: OnceCell<SharedPg> = OnceCell::const_new();

async fn init_shared_pg() -> SharedPg {
    if let Ok(url) = std::env::var("WEDPLAN_TEST_PG_URL") {
        return SharedPg {
            base_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("17")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedPg {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Base URL (no database name) of the shared PostgreSQL server.
pub async fn pg_url() -> &'static str {
    let shared = SHARED_PG.get_or_init(init_shared_pg).await;
    &shared.base_url
}

async fn maintenance_pool() -> PgPool {
    let maint_url = format!("{}/postgres", pg_url().await);
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&maint_url)
        .await
        .expect("failed to connect to maintenance database")
}

/// Create a temporary database with migrations applied.
///
/// Returns `(pool, db_name)`; hand `db_name` to [`drop_test_db`] when done.
pub async fn create_test_db() -> (PgPool, String) {
    let maint_pool = maintenance_pool().await;
    let db_name = format!("wedplan_test_{}", Uuid::new_v4().simple());
    let stmt = format!("CREATE DATABASE {db_name}");
    maint_pool
        .execute(stmt.as_str())
        .await
        .unwrap_or_else(|e| panic!("failed to create temp database {db_name}: {e}"));
    maint_pool.close().await;

    let temp_url = format!("{}/{db_name}", pg_url().await);
    let temp_pool = PgPoolOptions::new()
        .max_connections(8)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&temp_url)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to temp database {db_name}: {e}"));

    pool::run_migrations(&temp_pool)
        .await
        .expect("migrations should succeed");

    (temp_pool, db_name)
}

/// Drop a temporary database, terminating its open connections first.
pub async fn drop_test_db(db_name: &str) {
    let maint_pool = maintenance_pool().await;

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) \
         FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = maint_pool.execute(terminate.as_str()).await;

    let stmt = format!("DROP DATABASE IF EXISTS {db_name}");
    let _ = maint_pool.execute(stmt.as_str()).await;
    maint_pool.close().await;
}

/// Insert a user with a unique email derived from `name`.
pub async fn seed_user(pool: &PgPool, name: &str, phone: &str) -> User {
    let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4().simple());
    users::insert_user(
        pool,
        &users::NewUser {
            email: &email,
            password_hash: None,
            name,
            gender: None,
            phone,
        },
    )
    .await
    .expect("seed user should insert")
}

/// Insert a vendor with one service item per entry in `prices`.
pub async fn seed_vendor(
    pool: &PgPool,
    category: VendorCategory,
    name: &str,
    region: &str,
    prices: &[i64],
) -> Vendor {
    let vendor = vendors::insert_vendor(
        pool,
        &vendors::NewVendor {
            category,
            name,
            region,
            address: None,
            thumbnail_url: Some("https://img.example.com/thumb.jpg"),
            description: None,
            badges: &[],
        },
    )
    .await
    .expect("seed vendor should insert");

    for (idx, price) in prices.iter().enumerate() {
        vendors::insert_service_item(pool, vendor.id, &format!("package {}", idx + 1), *price)
            .await
            .expect("seed service item should insert");
    }

    vendor
}
