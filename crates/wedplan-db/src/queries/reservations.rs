//! Database query functions for the `reservations` table.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::Reservation;

/// Fields of a new reservation. Status, deposit flags and timestamps come
/// from the column defaults.
#[derive(Debug, Clone)]
pub struct NewReservation<'a> {
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub visitor_name: &'a str,
    pub visitor_phone: &'a str,
    pub visitor_count: i32,
    pub memo: Option<&'a str>,
}

pub async fn insert_reservation<'e>(
    executor: impl PgExecutor<'e>,
    new: &NewReservation<'_>,
) -> Result<Reservation> {
    let reservation = sqlx::query_as::<_, Reservation>(
        "INSERT INTO reservations \
             (user_id, vendor_id, plan_id, reservation_date, reservation_time, \
              visitor_name, visitor_phone, visitor_count, memo) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.vendor_id)
    .bind(new.plan_id)
    .bind(new.reservation_date)
    .bind(new.reservation_time)
    .bind(new.visitor_name)
    .bind(new.visitor_phone)
    .bind(new.visitor_count)
    .bind(new.memo)
    .fetch_one(executor)
    .await
    .context("failed to insert reservation")?;

    Ok(reservation)
}

pub async fn get_reservation<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Reservation>> {
    let reservation = sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch reservation")?;

    Ok(reservation)
}

/// Lock a reservation row for an edit.
pub async fn lock_reservation<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<Reservation>> {
    let reservation =
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await
            .context("failed to lock reservation")?;

    Ok(reservation)
}

/// A user's reservations, newest first.
pub async fn list_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Vec<Reservation>> {
    let rows = sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .context("failed to list reservations")?;

    Ok(rows)
}

/// Whether a non-cancelled reservation ties `vendor_id` to `plan_id`.
pub async fn exists_for_plan_vendor<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
    vendor_id: Uuid,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS( \
             SELECT 1 FROM reservations \
             WHERE plan_id = $1 AND vendor_id = $2 AND status <> 'CANCELLED' \
         )",
    )
    .bind(plan_id)
    .bind(vendor_id)
    .fetch_one(executor)
    .await
    .context("failed to check reservations for plan vendor")?;

    Ok(exists)
}

/// Editable reservation fields. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdate<'a> {
    pub reservation_date: Option<NaiveDate>,
    pub reservation_time: Option<NaiveTime>,
    pub visitor_name: Option<&'a str>,
    pub visitor_phone: Option<&'a str>,
    pub visitor_count: Option<i32>,
    /// `Some("")` clears the memo.
    pub memo: Option<&'a str>,
}

/// Apply the `Some` fields of `update`; `None` leaves a column as it is.
pub async fn update_reservation<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    update: &ReservationUpdate<'_>,
) -> Result<Reservation> {
    let reservation = sqlx::query_as::<_, Reservation>(
        "UPDATE reservations \
         SET reservation_date = COALESCE($2, reservation_date), \
             reservation_time = COALESCE($3, reservation_time), \
             visitor_name = COALESCE($4, visitor_name), \
             visitor_phone = COALESCE($5, visitor_phone), \
             visitor_count = COALESCE($6, visitor_count), \
             memo = CASE WHEN $7::text IS NULL THEN memo ELSE NULLIF($7, '') END, \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(update.reservation_date)
    .bind(update.reservation_time)
    .bind(update.visitor_name)
    .bind(update.visitor_phone)
    .bind(update.visitor_count)
    .bind(update.memo)
    .fetch_optional(executor)
    .await
    .context("failed to update reservation")?;

    reservation.with_context(|| format!("reservation {id} not found"))
}
