//! The `VendorCatalog` trait: where the recommender gets its candidates.
//!
//! The Postgres implementation runs on a borrowed connection, so the
//! candidate reads of an operation happen inside that operation's
//! transaction. [`InMemoryCatalog`] backs unit tests and dry runs.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use wedplan_db::models::VendorCategory;
use wedplan_db::queries::vendors;

pub use wedplan_db::queries::vendors::VendorCandidate;

/// One candidate lookup.
#[derive(Debug, Clone, Copy)]
pub struct CandidateQuery<'a> {
    pub category: VendorCategory,
    /// Exact region match when set.
    pub region: Option<&'a str>,
    /// Used to flag vendors already booked on the wedding day.
    pub wedding_date: Option<NaiveDate>,
}

/// Read access to the vendor catalog.
#[async_trait]
pub trait VendorCatalog: Send {
    async fn find_candidates(&mut self, query: &CandidateQuery<'_>) -> Result<Vec<VendorCandidate>>;
}

#[async_trait]
impl VendorCatalog for PgConnection {
    async fn find_candidates(&mut self, query: &CandidateQuery<'_>) -> Result<Vec<VendorCandidate>> {
        vendors::find_candidates(&mut *self, query.category, query.region, query.wedding_date).await
    }
}

#[async_trait]
impl VendorCatalog for PgPool {
    async fn find_candidates(&mut self, query: &CandidateQuery<'_>) -> Result<Vec<VendorCandidate>> {
        vendors::find_candidates(&*self, query.category, query.region, query.wedding_date).await
    }
}

/// A fixed, in-process catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    vendors: Vec<VendorCandidate>,
    queries: usize,
}

impl InMemoryCatalog {
    pub fn new(vendors: Vec<VendorCandidate>) -> Self {
        Self {
            vendors,
            queries: 0,
        }
    }

    /// Number of lookups served so far.
    pub fn queries(&self) -> usize {
        self.queries
    }
}

#[async_trait]
impl VendorCatalog for InMemoryCatalog {
    async fn find_candidates(&mut self, query: &CandidateQuery<'_>) -> Result<Vec<VendorCandidate>> {
        self.queries += 1;
        let mut found: Vec<VendorCandidate> = self
            .vendors
            .iter()
            .filter(|v| v.category == query.category)
            .filter(|v| query.region.is_none_or(|region| v.region == region))
            .cloned()
            .collect();
        found.sort_by_key(|v| v.id);
        Ok(found)
    }
}
