//! Recommendation engine: picks at most one vendor per category.
//!
//! Categories are filled in the fixed order of [`VendorCategory::ALL`].
//! For each one the engine asks the catalog for candidates (preferred
//! region first, whole catalog as a fallback), drops excluded and
//! over-budget vendors, scores the rest with the injected [`Scorer`] and
//! keeps the best. A category with nothing eligible is left out of the
//! result.

pub mod budget;
pub mod candidates;
pub mod scoring;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use wedplan_db::models::VendorCategory;

use crate::profile::WeddingProfile;

pub use budget::{BudgetAllocator, CategoryWeights};
pub use candidates::{CandidateQuery, InMemoryCatalog, VendorCandidate, VendorCatalog};
pub use scoring::{HeuristicScorer, Score, Scorer, ScoringContext};

/// The engine's pick for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub category: VendorCategory,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub service_item_id: Option<Uuid>,
    pub price: Option<i64>,
    pub selection_reason: String,
    pub confidence_score: f64,
}

/// One pick per category, in category order. Missing categories had no
/// eligible candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CombinationResult {
    picks: BTreeMap<VendorCategory, Recommendation>,
}

impl CombinationResult {
    pub fn get(&self, category: VendorCategory) -> Option<&Recommendation> {
        self.picks.get(&category)
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.picks.values()
    }

    /// Sum of the priced picks, saturating at `i64::MAX`.
    pub fn total_price(&self) -> i64 {
        self.picks
            .values()
            .filter_map(|r| r.price)
            .fold(0, i64::saturating_add)
    }
}

impl IntoIterator for CombinationResult {
    type Item = Recommendation;
    type IntoIter = std::collections::btree_map::IntoValues<VendorCategory, Recommendation>;

    fn into_iter(self) -> Self::IntoIter {
        self.picks.into_values()
    }
}

/// Exclusions for one run.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    pub vendor_ids: HashSet<Uuid>,
    pub categories: HashSet<VendorCategory>,
}

impl Exclusions {
    /// Exclude every category except `category`.
    pub fn only(category: VendorCategory) -> Self {
        Self {
            vendor_ids: HashSet::new(),
            categories: VendorCategory::ALL
                .into_iter()
                .filter(|c| *c != category)
                .collect(),
        }
    }

    pub fn with_vendors(mut self, vendor_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.vendor_ids.extend(vendor_ids);
        self
    }
}

/// Stateless vendor recommender. Cheap to clone and share.
#[derive(Clone)]
pub struct RecommendationEngine {
    scorer: Arc<dyn Scorer>,
    weights: CategoryWeights,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(Arc::new(HeuristicScorer))
    }
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("scorer", &self.scorer.name())
            .field("weights", &self.weights)
            .finish()
    }
}

impl RecommendationEngine {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self {
            scorer,
            weights: CategoryWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: CategoryWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Build a combination for `profile`.
    ///
    /// Only catalog errors are returned. An empty result is a valid
    /// outcome, not an error.
    pub async fn recommend<C>(
        &self,
        catalog: &mut C,
        profile: &WeddingProfile,
        exclusions: &Exclusions,
    ) -> Result<CombinationResult>
    where
        C: VendorCatalog + ?Sized,
    {
        let categories: Vec<VendorCategory> = VendorCategory::ALL
            .into_iter()
            .filter(|c| !exclusions.categories.contains(c))
            .collect();

        let mut budget = BudgetAllocator::new(profile.budget_limit, self.weights);
        let mut result = CombinationResult::default();

        for (idx, &category) in categories.iter().enumerate() {
            let allocation = budget.allocation(category, &categories[idx..]);
            match self
                .pick(catalog, profile, category, allocation, &exclusions.vendor_ids)
                .await?
            {
                Some(pick) => {
                    debug!(
                        %category,
                        vendor_id = %pick.vendor_id,
                        price = ?pick.price,
                        allocation = ?allocation,
                        confidence = pick.confidence_score,
                        "category filled"
                    );
                    budget.spend(pick.price);
                    result.picks.insert(category, pick);
                }
                None => {
                    debug!(%category, allocation = ?allocation, "no eligible vendor, category skipped");
                }
            }
        }

        Ok(result)
    }

    async fn pick<C>(
        &self,
        catalog: &mut C,
        profile: &WeddingProfile,
        category: VendorCategory,
        allocation: Option<i64>,
        excluded: &HashSet<Uuid>,
    ) -> Result<Option<Recommendation>>
    where
        C: VendorCatalog + ?Sized,
    {
        let region = profile.preferred_region.as_deref();
        let mut query = CandidateQuery {
            category,
            region,
            wedding_date: profile.wedding_date,
        };

        let mut eligible = filter_eligible(catalog.find_candidates(&query).await?, allocation, excluded);
        let mut region_fallback = false;

        if eligible.is_empty() {
            if let Some(region) = region {
                query.region = None;
                eligible = eligible_outside(
                    catalog.find_candidates(&query).await?,
                    allocation,
                    excluded,
                    region,
                );
                region_fallback = !eligible.is_empty();
                if region_fallback {
                    warn!(%category, region, "no eligible vendor in preferred region, widening search");
                }
            }
        }

        let context = ScoringContext {
            allocation,
            region_fallback,
        };

        let mut best: Option<(f64, VendorCandidate, String)> = None;
        for candidate in eligible {
            let score = match self.scorer.score(&candidate, profile, &context).await {
                Ok(score) => score,
                Err(err) => {
                    warn!(
                        scorer = self.scorer.name(),
                        vendor_id = %candidate.id,
                        error = %err,
                        "scoring failed, candidate skipped"
                    );
                    continue;
                }
            };
            let confidence = clamp_confidence(score.confidence);
            let better = match &best {
                None => true,
                Some((best_conf, best_vendor, _)) => {
                    rank(confidence, &candidate, *best_conf, best_vendor) == Ordering::Less
                }
            };
            if better {
                best = Some((confidence, candidate, score.reason));
            }
        }

        Ok(best.map(|(confidence, vendor, reason)| Recommendation {
            category,
            vendor_id: vendor.id,
            vendor_name: vendor.name,
            service_item_id: vendor.service_item_id,
            price: vendor.price,
            selection_reason: reason,
            confidence_score: confidence,
        }))
    }
}

fn fits(price: Option<i64>, allocation: Option<i64>) -> bool {
    match (allocation, price) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(allocation), Some(price)) => price <= allocation,
    }
}

fn filter_eligible(
    candidates: Vec<VendorCandidate>,
    allocation: Option<i64>,
    excluded: &HashSet<Uuid>,
) -> Vec<VendorCandidate> {
    candidates
        .into_iter()
        .filter(|c| !excluded.contains(&c.id) && fits(c.price, allocation))
        .collect()
}

/// Like [`filter_eligible`], minus the vendors of `region`, which were already
/// found ineligible.
fn eligible_outside(
    candidates: Vec<VendorCandidate>,
    allocation: Option<i64>,
    excluded: &HashSet<Uuid>,
    region: &str,
) -> Vec<VendorCandidate> {
    filter_eligible(candidates, allocation, excluded)
        .into_iter()
        .filter(|c| c.region != region)
        .collect()
}

fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) }
}

/// `Less` when `a` should be preferred over `b`: higher confidence, then
/// lower price (unpriced last), then lower vendor id.
fn rank(a_conf: f64, a: &VendorCandidate, b_conf: f64, b: &VendorCandidate) -> Ordering {
    b_conf
        .total_cmp(&a_conf)
        .then_with(|| match (a.price, b.price) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.id.cmp(&b.id))
}
