//! Reservation coordinator against a real PostgreSQL database.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

use wedplan_core::CoreError;
use wedplan_core::composer::create_users_info;
use wedplan_core::profile::ProfileInput;
use wedplan_core::recommend::RecommendationEngine;
use wedplan_core::reservation::{
    ReservationChanges, ReservationRequest, create_reservation, list_reservations, update_reservation,
};
use wedplan_db::models::{ReservationStatus, User, VendorCategory};
use wedplan_test_utils::{create_test_db, drop_test_db, seed_user, seed_vendor};

async fn plan_for(pool: &PgPool, user: &User) -> Uuid {
    create_users_info(pool, &RecommendationEngine::default(), user.id, &ProfileInput::default())
        .await
        .expect("plan should be created")
        .plan
        .id
}

fn request(vendor_id: impl ToString, date: &str, time: &str) -> ReservationRequest {
    ReservationRequest {
        vendor_id: vendor_id.to_string(),
        reservation_date: date.into(),
        reservation_time: time.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn reservation_gets_pending_defaults_and_user_contact() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Sora", "010-3000-0001").await;
    let vendor = seed_vendor(&pool, VendorCategory::Dress, "Veil", "Seoul", &[300]).await;
    let plan_id = plan_for(&pool, &user).await;

    let reservation = create_reservation(&pool, user.id, plan_id, &request(vendor.id, "25-12-25", "14:00"))
        .await
        .unwrap();

    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert!(!reservation.is_deposit_paid);
    assert_eq!(reservation.deposit_amount, 0);
    assert_eq!(reservation.visitor_count, 2);
    assert_eq!(reservation.visitor_name, "Sora");
    assert_eq!(reservation.visitor_phone, "010-3000-0001");
    assert_eq!(reservation.plan_id, Some(plan_id));
    assert_eq!(reservation.reservation_date, NaiveDate::from_ymd_opt(2025, 12, 25).unwrap());
    assert_eq!(reservation.reservation_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn explicit_visitor_details_override_defaults() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Tae", "010-3000-0002").await;
    let vendor = seed_vendor(&pool, VendorCategory::Studio, "Lens", "Seoul", &[100]).await;
    let plan_id = plan_for(&pool, &user).await;

    let mut req = request(vendor.id, "26-01-09", "09:30");
    req.visitor_name = Some("Mother".into());
    req.visitor_phone = Some("010-9999-0000".into());
    req.visitor_count = Some(4);
    req.memo = Some("bring album samples".into());

    let reservation = create_reservation(&pool, user.id, plan_id, &req).await.unwrap();
    assert_eq!(reservation.visitor_name, "Mother");
    assert_eq!(reservation.visitor_phone, "010-9999-0000");
    assert_eq!(reservation.visitor_count, 4);
    assert_eq!(reservation.memo.as_deref(), Some("bring album samples"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn date_and_time_errors_are_distinct_and_come_first() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Uri", "010-3000-0003").await;
    let vendor = seed_vendor(&pool, VendorCategory::Venue, "Hall", "Seoul", &[100]).await;
    let plan_id = plan_for(&pool, &user).await;

    let err = create_reservation(&pool, user.id, plan_id, &request(vendor.id, "2025-12-25", "14:00"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("yy-mm-dd"));

    let err = create_reservation(&pool, user.id, plan_id, &request(vendor.id, "25-13-35", "14:00"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("calendar"));

    let err = create_reservation(&pool, user.id, plan_id, &request(vendor.id, "25-12-25", "25:00"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("reservation_time"));

    // A bad date is reported even when the vendor id is garbage too.
    let err = create_reservation(&pool, user.id, plan_id, &request("nope", "25/12/25", "14:00"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("reservation_date"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn vendor_and_plan_checks() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Vin", "010-3000-0004").await;
    let stranger = seed_user(&pool, "Won", "010-3000-0005").await;
    let vendor = seed_vendor(&pool, VendorCategory::Makeup, "Glow", "Seoul", &[100]).await;
    let plan_id = plan_for(&pool, &user).await;
    let strangers_plan = plan_for(&pool, &stranger).await;

    let err = create_reservation(&pool, user.id, plan_id, &request("not-a-uuid", "25-12-25", "14:00"))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("vendor_id"));

    let err = create_reservation(&pool, user.id, plan_id, &request(Uuid::new_v4(), "25-12-25", "14:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(ref m) if m == "vendor not found"));

    let err = create_reservation(&pool, user.id, Uuid::new_v4(), &request(vendor.id, "25-12-25", "14:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(ref m) if m == "plan not found"));

    let err = create_reservation(&pool, user.id, strangers_plan, &request(vendor.id, "25-12-25", "14:00"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.field(), Some("plan_id"));
    assert!(err.to_string().contains("no access"));

    let mut zero = request(vendor.id, "25-12-25", "14:00");
    zero.visitor_count = Some(0);
    let err = create_reservation(&pool, user.id, plan_id, &zero).await.unwrap_err();
    assert_eq!(err.field(), Some("visitor_count"));

    assert!(list_reservations(&pool, user.id).await.unwrap().is_empty());

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn duplicate_slots_are_allowed_and_listed_newest_first() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Xu", "010-3000-0006").await;
    let vendor = seed_vendor(&pool, VendorCategory::Venue, "Hall", "Seoul", &[100]).await;
    let plan_id = plan_for(&pool, &user).await;

    let first = create_reservation(&pool, user.id, plan_id, &request(vendor.id, "25-12-25", "14:00"))
        .await
        .unwrap();
    let second = create_reservation(&pool, user.id, plan_id, &request(vendor.id, "25-12-25", "14:00"))
        .await
        .unwrap();

    let listed = list_reservations(&pool, user.id).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn update_revalidates_and_is_owner_only() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Yu", "010-3000-0007").await;
    let stranger = seed_user(&pool, "Ze", "010-3000-0008").await;
    let vendor = seed_vendor(&pool, VendorCategory::Studio, "Lens", "Seoul", &[100]).await;
    let plan_id = plan_for(&pool, &user).await;
    let reservation = create_reservation(&pool, user.id, plan_id, &request(vendor.id, "25-12-25", "14:00"))
        .await
        .unwrap();

    let changes = ReservationChanges {
        reservation_time: Some("16:30".into()),
        visitor_count: Some(3),
        ..Default::default()
    };
    let updated = update_reservation(&pool, user.id, reservation.id, &changes).await.unwrap();
    assert_eq!(updated.reservation_time, NaiveTime::from_hms_opt(16, 30, 0).unwrap());
    assert_eq!(updated.reservation_date, reservation.reservation_date);
    assert_eq!(updated.visitor_count, 3);
    assert_eq!(updated.status, ReservationStatus::Pending);

    let bad = ReservationChanges {
        reservation_date: Some("25-02-30".into()),
        ..Default::default()
    };
    let err = update_reservation(&pool, user.id, reservation.id, &bad).await.unwrap_err();
    assert!(err.to_string().contains("calendar"));

    let err = update_reservation(&pool, stranger.id, reservation.id, &changes)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn blank_memo_clears_and_absent_memo_keeps() {
    let (pool, db_name) = create_test_db().await;
    let user = seed_user(&pool, "Bo", "010-3000-0009").await;
    let vendor = seed_vendor(&pool, VendorCategory::Makeup, "Glow", "Seoul", &[100]).await;
    let plan_id = plan_for(&pool, &user).await;
    let mut req = request(vendor.id, "25-12-25", "14:00");
    req.memo = Some("bring album samples".into());
    let reservation = create_reservation(&pool, user.id, plan_id, &req).await.unwrap();

    let kept = update_reservation(
        &pool,
        user.id,
        reservation.id,
        &ReservationChanges {
            visitor_count: Some(4),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(kept.memo.as_deref(), Some("bring album samples"));

    let cleared = update_reservation(
        &pool,
        user.id,
        reservation.id,
        &ReservationChanges {
            memo: Some("  ".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.memo, None);
    assert_eq!(cleared.visitor_count, 4);

    pool.close().await;
    drop_test_db(&db_name).await;
}
