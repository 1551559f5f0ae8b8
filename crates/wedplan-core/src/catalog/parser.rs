//! Catalog TOML parser with validation.
//!
//! Checks that categories are known, names and regions are non-blank,
//! vendor names are unique per category and prices are not negative.

use std::collections::HashSet;

use thiserror::Error;

use wedplan_db::models::VendorCategory;

use super::toml_format::CatalogToml;

#[derive(Debug, Error)]
pub enum CatalogParseError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("catalog must contain at least one vendor")]
    NoVendors,

    #[error("invalid category {value:?} on vendor {vendor:?} (expected STUDIO, DRESS, MAKEUP or VENUE)")]
    InvalidCategory { vendor: String, value: String },

    #[error("vendor name must not be blank")]
    BlankName,

    #[error("vendor {0:?} has a blank region")]
    BlankRegion(String),

    #[error("duplicate vendor {name:?} in category {category}")]
    DuplicateVendor { category: VendorCategory, name: String },

    #[error("item {item:?} of vendor {vendor:?} has negative price {price}")]
    NegativePrice { vendor: String, item: String, price: i64 },
}

/// Parse and validate a catalog file.
pub fn parse_catalog_toml(content: &str) -> Result<CatalogToml, CatalogParseError> {
    let catalog: CatalogToml = toml::from_str(content)?;
    validate(&catalog)?;
    Ok(catalog)
}

fn validate(catalog: &CatalogToml) -> Result<(), CatalogParseError> {
    if catalog.vendors.is_empty() {
        return Err(CatalogParseError::NoVendors);
    }

    let mut seen = HashSet::new();
    for vendor in &catalog.vendors {
        if vendor.name.trim().is_empty() {
            return Err(CatalogParseError::BlankName);
        }
        if vendor.region.trim().is_empty() {
            return Err(CatalogParseError::BlankRegion(vendor.name.clone()));
        }

        let category: VendorCategory =
            vendor
                .category
                .parse()
                .map_err(|_| CatalogParseError::InvalidCategory {
                    vendor: vendor.name.clone(),
                    value: vendor.category.clone(),
                })?;

        if !seen.insert((category, vendor.name.as_str())) {
            return Err(CatalogParseError::DuplicateVendor {
                category,
                name: vendor.name.clone(),
            });
        }

        if let Some(item) = vendor.items.iter().find(|i| i.price < 0) {
            return Err(CatalogParseError::NegativePrice {
                vendor: vendor.name.clone(),
                item: item.name.clone(),
                price: item.price,
            });
        }
    }

    Ok(())
}
