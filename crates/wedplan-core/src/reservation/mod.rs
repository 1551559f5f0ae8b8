//! Reservation coordinator: booking a vendor visit against a plan.
//!
//! Reservations start out PENDING with no deposit. Status transitions
//! belong to the payment and vendor flows and are never made here.

pub mod parse;

use anyhow::Context;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use wedplan_db::models::Reservation;
use wedplan_db::queries::{plans, reservations, users, vendors};

use crate::error::{CoreError, CoreResult};

pub use parse::{parse_reservation_date, parse_reservation_time};

/// Party size used when the request names none.
pub const DEFAULT_VISITOR_COUNT: i32 = 2;

/// A reservation request as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationRequest {
    pub vendor_id: String,
    /// `yy-mm-dd`
    pub reservation_date: String,
    /// `hh:mm`
    pub reservation_time: String,
    #[serde(default)]
    pub visitor_name: Option<String>,
    #[serde(default)]
    pub visitor_phone: Option<String>,
    #[serde(default)]
    pub visitor_count: Option<i32>,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Editable fields of an existing reservation. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationChanges {
    #[serde(default)]
    pub reservation_date: Option<String>,
    #[serde(default)]
    pub reservation_time: Option<String>,
    #[serde(default)]
    pub visitor_name: Option<String>,
    #[serde(default)]
    pub visitor_phone: Option<String>,
    #[serde(default)]
    pub visitor_count: Option<i32>,
    #[serde(default)]
    pub memo: Option<String>,
}

fn check_visitor_count(count: Option<i32>) -> CoreResult<()> {
    if matches!(count, Some(n) if n < 1) {
        return Err(CoreError::validation(
            "visitor_count",
            "visitor_count must be at least 1",
        ));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Book a visit to a vendor as part of `plan_id`.
///
/// Checks run in a fixed order and the first failure is returned: date,
/// time, vendor, plan ownership, party size. Visitor name and phone
/// default to the user's own.
pub async fn create_reservation(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    request: &ReservationRequest,
) -> CoreResult<Reservation> {
    let reservation_date = parse_reservation_date(&request.reservation_date)?;
    let reservation_time = parse_reservation_time(&request.reservation_time)?;
    let vendor_id = Uuid::parse_str(request.vendor_id.trim())
        .map_err(|_| CoreError::validation("vendor_id", "vendor_id must be a valid UUID"))?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    vendors::get_vendor(&mut *tx, vendor_id)
        .await?
        .ok_or_else(|| CoreError::not_found("vendor not found"))?;

    let owner = plans::get_plan_owner(&mut *tx, plan_id)
        .await?
        .ok_or_else(|| CoreError::not_found("plan not found"))?;
    if owner.user_id != user_id {
        return Err(CoreError::validation("plan_id", "no access to this plan"));
    }

    check_visitor_count(request.visitor_count)?;

    let user = users::get_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("user not found"))?;

    let reservation = reservations::insert_reservation(
        &mut *tx,
        &reservations::NewReservation {
            user_id,
            vendor_id,
            plan_id: Some(plan_id),
            reservation_date,
            reservation_time,
            visitor_name: non_blank(request.visitor_name.as_deref()).unwrap_or(user.name.as_str()),
            visitor_phone: non_blank(request.visitor_phone.as_deref()).unwrap_or(user.phone.as_str()),
            visitor_count: request.visitor_count.unwrap_or(DEFAULT_VISITOR_COUNT),
            memo: request.memo.as_deref(),
        },
    )
    .await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        %user_id,
        %plan_id,
        %vendor_id,
        reservation_id = %reservation.id,
        date = %reservation_date,
        time = %reservation_time,
        "reservation created"
    );
    Ok(reservation)
}

/// Edit the slot, visitor details or memo of one of the user's
/// reservations. Status is never changed. A blank memo clears it.
pub async fn update_reservation(
    pool: &PgPool,
    user_id: Uuid,
    reservation_id: Uuid,
    changes: &ReservationChanges,
) -> CoreResult<Reservation> {
    let reservation_date = changes
        .reservation_date
        .as_deref()
        .map(parse_reservation_date)
        .transpose()?;
    let reservation_time = changes
        .reservation_time
        .as_deref()
        .map(parse_reservation_time)
        .transpose()?;
    check_visitor_count(changes.visitor_count)?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    reservations::lock_reservation(&mut *tx, reservation_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| CoreError::not_found("reservation not found"))?;

    let updated = reservations::update_reservation(
        &mut *tx,
        reservation_id,
        &reservations::ReservationUpdate {
            reservation_date,
            reservation_time,
            visitor_name: non_blank(changes.visitor_name.as_deref()),
            visitor_phone: non_blank(changes.visitor_phone.as_deref()),
            visitor_count: changes.visitor_count,
            memo: changes.memo.as_deref().map(str::trim),
        },
    )
    .await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(%user_id, %reservation_id, "reservation updated");
    Ok(updated)
}

/// The user's reservations, newest first.
pub async fn list_reservations(pool: &PgPool, user_id: Uuid) -> CoreResult<Vec<Reservation>> {
    Ok(reservations::list_for_user(pool, user_id).await?)
}
