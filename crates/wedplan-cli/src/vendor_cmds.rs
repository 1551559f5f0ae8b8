//! Operator-mode CLI handlers for `wedplan vendor` subcommands.
//!
//! Implements:
//! - `wedplan vendor import <file>` -- load vendors from a catalog TOML file
//! - `wedplan vendor list`          -- browse the catalog

use anyhow::{Context, Result};
use sqlx::PgPool;

use wedplan_core::catalog::{import_catalog, parse_catalog_toml};
use wedplan_db::models::VendorCategory;
use wedplan_db::queries::vendors;

use crate::VendorCommands;
use crate::plan_cmds::money;

/// Dispatch a `VendorCommands` variant to the appropriate handler.
pub async fn run_vendor_command(command: VendorCommands, pool: &PgPool) -> Result<()> {
    match command {
        VendorCommands::Import { file } => cmd_import(pool, &file).await,
        VendorCommands::List { category, region } => {
            cmd_list(pool, category.as_deref(), region.as_deref()).await
        }
    }
}

async fn cmd_import(pool: &PgPool, file_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read catalog file: {file_path}"))?;
    let catalog = parse_catalog_toml(&content)
        .with_context(|| format!("failed to parse catalog file: {file_path}"))?;

    let summary = import_catalog(pool, &catalog).await?;

    println!("Catalog imported from {file_path}.");
    println!("  Vendors created: {}", summary.vendors_created);
    println!("  Vendors skipped: {}", summary.vendors_skipped);
    println!("  Items created:   {}", summary.items_created);
    Ok(())
}

async fn cmd_list(pool: &PgPool, category: Option<&str>, region: Option<&str>) -> Result<()> {
    let category = category.map(str::parse::<VendorCategory>).transpose()?;
    let vendors = vendors::list_vendors(pool, category, region).await?;

    if vendors.is_empty() {
        println!("No vendors found. Use `wedplan vendor import <file>` to load a catalog.");
        return Ok(());
    }

    let name_w = vendors.iter().map(|v| v.name.len()).max().unwrap_or(4).max(4);
    let region_w = vendors.iter().map(|v| v.region.len()).max().unwrap_or(6).max(6);

    println!(
        "{:<36}  {:<6}  {:<name_w$}  {:<region_w$}  {:>12}",
        "ID", "TYPE", "NAME", "REGION", "FROM",
    );
    for vendor in &vendors {
        let cheapest = vendors::list_service_items(pool, vendor.id)
            .await?
            .first()
            .map(|item| item.price);
        println!(
            "{:<36}  {:<6}  {:<name_w$}  {:<region_w$}  {:>12}",
            vendor.id,
            vendor.category,
            vendor.name,
            vendor.region,
            money(cheapest),
        );
    }
    Ok(())
}
