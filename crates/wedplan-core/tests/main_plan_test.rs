//! Main-plan registry against a real PostgreSQL database, including
//! concurrent switches for the same user.

use futures::future::join_all;
use sqlx::PgPool;
use uuid::Uuid;

use wedplan_core::CoreError;
use wedplan_core::composer::{CreatedPlan, create_users_info};
use wedplan_core::profile::ProfileInput;
use wedplan_core::recommend::RecommendationEngine;
use wedplan_core::registry::{list_plans, main_plan, set_main_plan};
use wedplan_test_utils::{create_test_db, drop_test_db, seed_user};

async fn new_profile(pool: &PgPool, user_id: Uuid, region: &str) -> CreatedPlan {
    let input = ProfileInput {
        preferred_region: Some(region.to_owned()),
        ..Default::default()
    };
    create_users_info(pool, &RecommendationEngine::default(), user_id, &input)
        .await
        .expect("profile should be created")
}

async fn main_count(pool: &PgPool, user_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users_info WHERE user_id = $1 AND is_main_plan")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn set_main_plan_switches_the_single_main() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Lia", "010-2000-0001").await;
    let first = new_profile(&pool, user.id, "Seoul").await;
    let second = new_profile(&pool, user.id, "Busan").await;

    let change = set_main_plan(&pool, user.id, second.plan.id).await.unwrap();
    assert_eq!(change.plan_id, second.plan.id);
    assert_eq!(change.users_info_id, second.users_info.id);

    let listed = list_plans(&pool, user.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].users_info.id, first.users_info.id);
    assert!(!listed[0].users_info.is_main_plan);
    assert!(listed[1].users_info.is_main_plan);
    assert_eq!(listed[1].plan.as_ref().map(|p| p.id), Some(second.plan.id));
    assert_eq!(main_count(&pool, user.id).await, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn repeating_set_main_plan_changes_nothing() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Mo", "010-2000-0002").await;
    new_profile(&pool, user.id, "Seoul").await;
    let target = new_profile(&pool, user.id, "Daegu").await;

    set_main_plan(&pool, user.id, target.plan.id).await.unwrap();
    let before = list_plans(&pool, user.id).await.unwrap();
    set_main_plan(&pool, user.id, target.plan.id).await.unwrap();
    let after = list_plans(&pool, user.id).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(main_count(&pool, user.id).await, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn foreign_or_missing_plan_is_not_found() {
    let (pool, db_name) = create_test_db().await;
    let owner = seed_user(&pool, "Na", "010-2000-0003").await;
    let other = seed_user(&pool, "Ok", "010-2000-0004").await;
    let plan = new_profile(&pool, owner.id, "Seoul").await;
    new_profile(&pool, other.id, "Seoul").await;

    let err = set_main_plan(&pool, other.id, plan.plan.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = set_main_plan(&pool, owner.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    // Nothing moved for either user.
    assert_eq!(main_count(&pool, owner.id).await, 1);
    assert_eq!(main_count(&pool, other.id).await, 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn concurrent_switches_leave_exactly_one_main() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Pa", "010-2000-0005").await;

    let mut plan_ids = Vec::new();
    for region in ["Seoul", "Busan", "Incheon", "Jeju"] {
        plan_ids.push(new_profile(&pool, user.id, region).await.plan.id);
    }

    let switches = (0..12).map(|i| {
        let pool = pool.clone();
        let plan_id = plan_ids[i % plan_ids.len()];
        async move { set_main_plan(&pool, user.id, plan_id).await }
    });
    let results = join_all(switches).await;

    assert!(results.iter().all(Result::is_ok), "every switch should succeed: {results:?}");
    assert_eq!(main_count(&pool, user.id).await, 1);

    let main = main_plan(&pool, user.id).await.unwrap().expect("user has a main plan");
    assert!(plan_ids.contains(&main.plan.expect("main has a plan").id));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn main_plan_is_none_without_profiles() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Ra", "010-2000-0006").await;

    assert!(main_plan(&pool, user.id).await.unwrap().is_none());
    assert!(list_plans(&pool, user.id).await.unwrap().is_empty());

    let created = new_profile(&pool, user.id, "Seoul").await;
    let main = main_plan(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(main.users_info.id, created.users_info.id);
    assert_eq!(main.users_info.preferred_region.as_deref(), Some("Seoul"));

    pool.close().await;
    drop_test_db(&db_name).await;
}
