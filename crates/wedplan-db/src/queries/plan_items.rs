//! Database query functions for the `plan_items` table.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::models::{PlanItem, PlanItemSource, VendorCategory};

/// Fields of a new plan item.
#[derive(Debug, Clone)]
pub struct NewPlanItem<'a> {
    pub plan_id: Uuid,
    pub vendor_id: Uuid,
    pub service_item_id: Option<Uuid>,
    pub source: PlanItemSource,
    pub selection_reason: &'a str,
    pub order_index: i32,
}

pub async fn insert_plan_item<'e>(
    executor: impl PgExecutor<'e>,
    new: &NewPlanItem<'_>,
) -> Result<PlanItem> {
    let item = sqlx::query_as::<_, PlanItem>(
        "INSERT INTO plan_items (plan_id, vendor_id, service_item_id, source, selection_reason, order_index) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.plan_id)
    .bind(new.vendor_id)
    .bind(new.service_item_id)
    .bind(new.source)
    .bind(new.selection_reason)
    .bind(new.order_index)
    .fetch_one(executor)
    .await
    .context("failed to insert plan item")?;

    Ok(item)
}

/// List the items of a plan in category order.
pub async fn list_items_for_plan<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<Vec<PlanItem>> {
    let items = sqlx::query_as::<_, PlanItem>(
        "SELECT * FROM plan_items WHERE plan_id = $1 ORDER BY order_index ASC, created_at ASC",
    )
    .bind(plan_id)
    .fetch_all(executor)
    .await
    .context("failed to list plan items")?;

    Ok(items)
}

/// Fetch the item binding `vendor_id` to `plan_id`, row-locked for the rest
/// of the transaction.
pub async fn lock_item_for_vendor<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
    vendor_id: Uuid,
) -> Result<Option<PlanItem>> {
    let item = sqlx::query_as::<_, PlanItem>(
        "SELECT * FROM plan_items \
         WHERE plan_id = $1 AND vendor_id = $2 \
         ORDER BY created_at ASC \
         LIMIT 1 \
         FOR UPDATE",
    )
    .bind(plan_id)
    .bind(vendor_id)
    .fetch_optional(executor)
    .await
    .context("failed to lock plan item")?;

    Ok(item)
}

/// Fetch the item occupying a category slot of a plan, row-locked.
pub async fn lock_item_for_category<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
    category: VendorCategory,
) -> Result<Option<PlanItem>> {
    let item = sqlx::query_as::<_, PlanItem>(
        "SELECT pi.* FROM plan_items pi \
         JOIN vendors v ON v.id = pi.vendor_id \
         WHERE pi.plan_id = $1 AND v.category = $2 \
         ORDER BY pi.created_at ASC \
         LIMIT 1 \
         FOR UPDATE OF pi",
    )
    .bind(plan_id)
    .bind(category)
    .fetch_optional(executor)
    .await
    .context("failed to lock plan item for category")?;

    Ok(item)
}

/// Point an existing item at a different vendor.
pub async fn replace_item_vendor<'e>(
    executor: impl PgExecutor<'e>,
    item_id: Uuid,
    vendor_id: Uuid,
    service_item_id: Option<Uuid>,
    source: PlanItemSource,
    selection_reason: &str,
) -> Result<PlanItem> {
    let item = sqlx::query_as::<_, PlanItem>(
        "UPDATE plan_items \
         SET vendor_id = $2, service_item_id = $3, source = $4, selection_reason = $5, \
             is_confirmed = false, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(item_id)
    .bind(vendor_id)
    .bind(service_item_id)
    .bind(source)
    .bind(selection_reason)
    .fetch_optional(executor)
    .await
    .context("failed to replace plan item vendor")?;

    item.with_context(|| format!("plan item {item_id} not found"))
}

pub async fn delete_plan_item<'e>(executor: impl PgExecutor<'e>, item_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM plan_items WHERE id = $1")
        .bind(item_id)
        .execute(executor)
        .await
        .context("failed to delete plan item")?;

    Ok(result.rows_affected() > 0)
}

/// Vendor and effective price of one plan item.
#[derive(Debug, Clone, FromRow)]
pub struct PlanItemPrice {
    pub item_id: Uuid,
    pub vendor_id: Uuid,
    pub category: VendorCategory,
    /// The chosen service item's price, or the vendor's cheapest price when
    /// no service item is attached. `None` for unpriced vendors.
    pub price: Option<i64>,
}

/// Effective prices of every item in a plan.
pub async fn list_item_prices<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<Vec<PlanItemPrice>> {
    let rows = sqlx::query_as::<_, PlanItemPrice>(
        "SELECT pi.id AS item_id, pi.vendor_id, v.category, \
                COALESCE(si.price, \
                         (SELECT MIN(s2.price) FROM service_items s2 WHERE s2.vendor_id = pi.vendor_id) \
                ) AS price \
         FROM plan_items pi \
         JOIN vendors v ON v.id = pi.vendor_id \
         LEFT JOIN service_items si ON si.id = pi.service_item_id \
         WHERE pi.plan_id = $1 \
         ORDER BY pi.order_index ASC",
    )
    .bind(plan_id)
    .fetch_all(executor)
    .await
    .context("failed to list plan item prices")?;

    Ok(rows)
}

/// A plan item joined with its vendor and the latest live reservation for
/// the same plan and vendor.
#[derive(Debug, Clone, FromRow)]
pub struct PlanItemDetailRow {
    pub id: Uuid,
    pub is_confirmed: bool,
    pub source: PlanItemSource,
    pub selection_reason: String,
    pub order_index: i32,
    pub service_item_id: Option<Uuid>,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub vendor_category: VendorCategory,
    pub vendor_region: String,
    pub vendor_thumbnail_url: Option<String>,
    pub reservation_date: Option<NaiveDate>,
    pub reservation_time: Option<NaiveTime>,
}

pub async fn list_item_details<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<Vec<PlanItemDetailRow>> {
    let rows = sqlx::query_as::<_, PlanItemDetailRow>(
        "SELECT pi.id, pi.is_confirmed, pi.source, pi.selection_reason, pi.order_index, \
                pi.service_item_id, \
                v.id AS vendor_id, v.name AS vendor_name, v.category AS vendor_category, \
                v.region AS vendor_region, v.thumbnail_url AS vendor_thumbnail_url, \
                r.reservation_date, r.reservation_time \
         FROM plan_items pi \
         JOIN vendors v ON v.id = pi.vendor_id \
         LEFT JOIN LATERAL ( \
             SELECT reservation_date, reservation_time FROM reservations \
             WHERE plan_id = pi.plan_id AND vendor_id = pi.vendor_id AND status <> 'CANCELLED' \
             ORDER BY created_at DESC \
             LIMIT 1 \
         ) r ON true \
         WHERE pi.plan_id = $1 \
         ORDER BY pi.order_index ASC, pi.created_at ASC",
    )
    .bind(plan_id)
    .fetch_all(executor)
    .await
    .context("failed to list plan item details")?;

    Ok(rows)
}
