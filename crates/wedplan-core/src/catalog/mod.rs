//! Vendor catalog import from TOML files.

pub mod parser;
pub mod toml_format;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info};

use wedplan_db::models::VendorCategory;
use wedplan_db::queries::vendors;

pub use parser::{CatalogParseError, parse_catalog_toml};
pub use toml_format::{CatalogToml, ServiceItemToml, VendorToml};

/// Counts reported by [`import_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub vendors_created: usize,
    pub vendors_skipped: usize,
    pub items_created: usize,
}

/// Insert every vendor of a validated catalog, with its service items, in
/// one transaction.
///
/// Vendors that already exist (same category and name) are skipped and
/// their items left alone, so importing the same file twice is harmless.
pub async fn import_catalog(pool: &PgPool, catalog: &CatalogToml) -> Result<ImportSummary> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    let mut summary = ImportSummary::default();

    for entry in &catalog.vendors {
        let category: VendorCategory = entry
            .category
            .parse()
            .with_context(|| format!("vendor {:?}", entry.name))?;

        if vendors::get_vendor_by_name(&mut *tx, category, &entry.name)
            .await?
            .is_some()
        {
            debug!(%category, name = %entry.name, "vendor already present, skipped");
            summary.vendors_skipped += 1;
            continue;
        }

        let vendor = vendors::insert_vendor(
            &mut *tx,
            &vendors::NewVendor {
                category,
                name: &entry.name,
                region: entry.region.trim(),
                address: entry.address.as_deref(),
                thumbnail_url: entry.thumbnail_url.as_deref(),
                description: entry.description.as_deref(),
                badges: &entry.badges,
            },
        )
        .await?;
        summary.vendors_created += 1;

        for item in &entry.items {
            vendors::insert_service_item(&mut *tx, vendor.id, &item.name, item.price).await?;
            summary.items_created += 1;
        }
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        created = summary.vendors_created,
        skipped = summary.vendors_skipped,
        items = summary.items_created,
        "catalog imported"
    );
    Ok(summary)
}
