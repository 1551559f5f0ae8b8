//! TOML format types for vendor catalog files.
//!
//! ```toml
//! [[vendors]]
//! category = "VENUE"
//! name = "Grand Hall"
//! region = "Seoul"
//! badges = ["popular"]
//!
//! [[vendors.items]]
//! name = "Saturday lunch"
//! price = 12000000
//! ```

use serde::{Deserialize, Serialize};

/// Top-level structure of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogToml {
    #[serde(default)]
    pub vendors: Vec<VendorToml>,
}

/// A single `[[vendors]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VendorToml {
    /// STUDIO, DRESS, MAKEUP or VENUE (case-insensitive).
    pub category: String,
    /// Unique within its category.
    pub name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub badges: Vec<String>,
    /// Priced offerings. A vendor without items is unpriced.
    #[serde(default)]
    pub items: Vec<ServiceItemToml>,
}

/// A `[[vendors.items]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceItemToml {
    pub name: String,
    pub price: i64,
}
