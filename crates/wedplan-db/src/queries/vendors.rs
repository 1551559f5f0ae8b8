//! Database query functions for the `vendors` and `service_items` tables.
//!
//! The catalog is read-mostly: the planner never mutates vendors, and the
//! insert helpers exist for catalog import and test seeding.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::models::{ServiceItem, Vendor, VendorCategory};

/// Fields of a new vendor row.
#[derive(Debug, Clone)]
pub struct NewVendor<'a> {
    pub category: VendorCategory,
    pub name: &'a str,
    pub region: &'a str,
    pub address: Option<&'a str>,
    pub thumbnail_url: Option<&'a str>,
    pub description: Option<&'a str>,
    pub badges: &'a [String],
}

pub async fn insert_vendor<'e>(
    executor: impl PgExecutor<'e>,
    new: &NewVendor<'_>,
) -> Result<Vendor> {
    let vendor = sqlx::query_as::<_, Vendor>(
        "INSERT INTO vendors (category, name, region, address, thumbnail_url, description, badges) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(new.category)
    .bind(new.name)
    .bind(new.region)
    .bind(new.address)
    .bind(new.thumbnail_url)
    .bind(new.description)
    .bind(new.badges)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert vendor {:?}", new.name))?;

    Ok(vendor)
}

pub async fn insert_service_item<'e>(
    executor: impl PgExecutor<'e>,
    vendor_id: Uuid,
    name: &str,
    price: i64,
) -> Result<ServiceItem> {
    let item = sqlx::query_as::<_, ServiceItem>(
        "INSERT INTO service_items (vendor_id, name, price) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(vendor_id)
    .bind(name)
    .bind(price)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert service item {name:?}"))?;

    Ok(item)
}

/// Fetch a vendor by ID.
pub async fn get_vendor<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Vendor>> {
    let vendor = sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch vendor")?;

    Ok(vendor)
}

/// Find a vendor by its unique (category, name) pair.
pub async fn get_vendor_by_name<'e>(
    executor: impl PgExecutor<'e>,
    category: VendorCategory,
    name: &str,
) -> Result<Option<Vendor>> {
    let vendor =
        sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE category = $1 AND name = $2")
            .bind(category)
            .bind(name)
            .fetch_optional(executor)
            .await
            .context("failed to fetch vendor by name")?;

    Ok(vendor)
}

/// List vendors, optionally filtered by category and region, by name.
pub async fn list_vendors<'e>(
    executor: impl PgExecutor<'e>,
    category: Option<VendorCategory>,
    region: Option<&str>,
) -> Result<Vec<Vendor>> {
    let vendors = sqlx::query_as::<_, Vendor>(
        "SELECT * FROM vendors \
         WHERE ($1::text IS NULL OR category = $1) \
           AND ($2::text IS NULL OR region = $2) \
         ORDER BY category ASC, name ASC",
    )
    .bind(category)
    .bind(region)
    .fetch_all(executor)
    .await
    .context("failed to list vendors")?;

    Ok(vendors)
}

/// Service items of a vendor, cheapest first.
pub async fn list_service_items<'e>(
    executor: impl PgExecutor<'e>,
    vendor_id: Uuid,
) -> Result<Vec<ServiceItem>> {
    let items = sqlx::query_as::<_, ServiceItem>(
        "SELECT * FROM service_items WHERE vendor_id = $1 ORDER BY price ASC, id ASC",
    )
    .bind(vendor_id)
    .fetch_all(executor)
    .await
    .context("failed to list service items")?;

    Ok(items)
}

/// A vendor as seen by the recommender: catalog fields plus its cheapest
/// offering and whether it is already booked on the wedding date.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct VendorCandidate {
    pub id: Uuid,
    pub category: VendorCategory,
    pub name: String,
    pub region: String,
    pub badges: Vec<String>,
    pub service_item_id: Option<Uuid>,
    pub price: Option<i64>,
    pub booked_on_wedding_date: bool,
}

/// Candidates for one category.
///
/// `region` restricts to an exact region match when given. When
/// `wedding_date` is given, `booked_on_wedding_date` reports whether a
/// non-cancelled reservation already exists for that vendor on that day.
pub async fn find_candidates<'e>(
    executor: impl PgExecutor<'e>,
    category: VendorCategory,
    region: Option<&str>,
    wedding_date: Option<NaiveDate>,
) -> Result<Vec<VendorCandidate>> {
    let rows = sqlx::query_as::<_, VendorCandidate>(
        "SELECT v.id, v.category, v.name, v.region, v.badges, \
                cheapest.id AS service_item_id, cheapest.price, \
                ($3::date IS NOT NULL AND EXISTS ( \
                    SELECT 1 FROM reservations r \
                    WHERE r.vendor_id = v.id \
                      AND r.reservation_date = $3 \
                      AND r.status <> 'CANCELLED' \
                )) AS booked_on_wedding_date \
         FROM vendors v \
         LEFT JOIN LATERAL ( \
             SELECT si.id, si.price FROM service_items si \
             WHERE si.vendor_id = v.id \
             ORDER BY si.price ASC, si.id ASC \
             LIMIT 1 \
         ) cheapest ON true \
         WHERE v.category = $1 \
           AND ($2::text IS NULL OR v.region = $2) \
         ORDER BY v.id ASC",
    )
    .bind(category)
    .bind(region)
    .bind(wedding_date)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to find {category} candidates"))?;

    Ok(rows)
}
