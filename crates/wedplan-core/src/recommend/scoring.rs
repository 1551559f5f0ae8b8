//! The `Scorer` trait and the default heuristic implementation.
//!
//! A scorer rates one candidate vendor against a wedding profile. The
//! engine only compares confidences; how they are produced is up to the
//! implementation, so a remote model can be swapped in behind the same
//! trait.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::profile::WeddingProfile;

use super::candidates::VendorCandidate;

/// A scorer's verdict on one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Score {
    /// Expected to be in `[0, 1]`; the engine clamps it.
    pub confidence: f64,
    pub reason: String,
}

/// Per-category facts the engine knows when asking for a score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringContext {
    /// Budget share of the category being filled. `None` when the profile
    /// has no budget.
    pub allocation: Option<i64>,
    /// Set when the region filter was dropped for this category.
    pub region_fallback: bool,
}

/// Rates candidate vendors.
///
/// # Object Safety
///
/// The engine stores scorers as `Arc<dyn Scorer>`, so every method must
/// stay object-safe.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &str;

    async fn score(
        &self,
        vendor: &VendorCandidate,
        profile: &WeddingProfile,
        context: &ScoringContext,
    ) -> Result<Score>;
}

// Compile-time assertion: Scorer must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Scorer) {}
};

const AVAILABILITY_WEIGHT: f64 = 0.35;
const REGION_WEIGHT: f64 = 0.25;
const PRICE_WEIGHT: f64 = 0.25;
const BADGE_WEIGHT: f64 = 0.15;

/// Badges beyond this count add nothing.
const BADGE_CAP: usize = 3;

/// Deterministic rule-based scorer.
///
/// Combines four signals, each in `[0, 1]`:
///
/// - availability: the vendor has no active reservation on the wedding day
/// - region: the vendor is in the preferred region
/// - price fit: how much of the category allocation the price uses
/// - badges: qualitative markers such as "popular"
///
/// Signals the profile gives no information about score a neutral 1.0
/// (availability, region) or 0.5 (price).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    fn availability(vendor: &VendorCandidate, profile: &WeddingProfile) -> (f64, Option<String>) {
        match profile.wedding_date {
            None => (1.0, None),
            Some(date) if vendor.booked_on_wedding_date => {
                (0.0, Some(format!("already booked on {date}")))
            }
            Some(date) => (1.0, Some(format!("available on {date}"))),
        }
    }

    fn region(
        vendor: &VendorCandidate,
        profile: &WeddingProfile,
        context: &ScoringContext,
    ) -> (f64, Option<String>) {
        match profile.preferred_region.as_deref() {
            None => (1.0, None),
            Some(region) if vendor.region == region => (1.0, Some(format!("located in {region}"))),
            Some(region) => {
                let note = if context.region_fallback {
                    format!("nothing suitable in {region}, suggested from {}", vendor.region)
                } else {
                    format!("outside {region}")
                };
                (0.3, Some(note))
            }
        }
    }

    fn price_fit(vendor: &VendorCandidate, context: &ScoringContext) -> (f64, Option<String>) {
        match (context.allocation, vendor.price) {
            (None, Some(price)) => (0.5, Some(format!("quoted at {price}"))),
            (None, None) => (0.3, None),
            (Some(_), None) => (0.0, None),
            (Some(allocation), Some(price)) if price > allocation => {
                (0.0, Some(format!("{price} exceeds the {allocation} allocation")))
            }
            (Some(0), Some(_)) => (1.0, Some("free of charge".to_owned())),
            (Some(allocation), Some(price)) => (
                price as f64 / allocation as f64,
                Some(format!("{price} within the {allocation} allocation")),
            ),
        }
    }

    fn badges(vendor: &VendorCandidate) -> (f64, Option<String>) {
        if vendor.badges.is_empty() {
            return (0.0, None);
        }
        let counted = vendor.badges.len().min(BADGE_CAP);
        (
            counted as f64 / BADGE_CAP as f64,
            Some(format!("badges: {}", vendor.badges.join(", "))),
        )
    }
}

#[async_trait]
impl Scorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn score(
        &self,
        vendor: &VendorCandidate,
        profile: &WeddingProfile,
        context: &ScoringContext,
    ) -> Result<Score> {
        let (availability, a_note) = Self::availability(vendor, profile);
        let (region, r_note) = Self::region(vendor, profile, context);
        let (price, p_note) = Self::price_fit(vendor, context);
        let (badges, b_note) = Self::badges(vendor);

        let confidence = availability * AVAILABILITY_WEIGHT
            + region * REGION_WEIGHT
            + price * PRICE_WEIGHT
            + badges * BADGE_WEIGHT;

        let notes: Vec<String> = [a_note, r_note, p_note, b_note]
            .into_iter()
            .flatten()
            .collect();
        let reason = if notes.is_empty() {
            format!("{} ({})", vendor.name, vendor.category)
        } else {
            format!("{}: {}", vendor.name, notes.join("; "))
        };

        Ok(Score { confidence, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;
    use wedplan_db::models::VendorCategory;

    fn candidate(price: Option<i64>, booked: bool, badges: &[&str]) -> VendorCandidate {
        VendorCandidate {
            id: Uuid::from_u128(1),
            category: VendorCategory::Studio,
            name: "Lumi".to_owned(),
            region: "Seoul".to_owned(),
            badges: badges.iter().map(|b| b.to_string()).collect(),
            service_item_id: None,
            price,
            booked_on_wedding_date: booked,
        }
    }

    fn profile() -> WeddingProfile {
        WeddingProfile {
            wedding_date: NaiveDate::from_ymd_opt(2026, 5, 16),
            preferred_region: Some("Seoul".to_owned()),
            budget_limit: Some(1000),
        }
    }

    #[test]
    fn scorer_is_object_safe() {
        let scorer: Box<dyn Scorer> = Box::new(HeuristicScorer);
        assert_eq!(scorer.name(), "heuristic");
    }

    #[tokio::test]
    async fn booked_vendor_scores_below_available_one() {
        let ctx = ScoringContext {
            allocation: Some(500),
            region_fallback: false,
        };
        let free = HeuristicScorer
            .score(&candidate(Some(400), false, &[]), &profile(), &ctx)
            .await
            .unwrap();
        let booked = HeuristicScorer
            .score(&candidate(Some(400), true, &[]), &profile(), &ctx)
            .await
            .unwrap();
        assert!(free.confidence > booked.confidence);
        assert!(booked.reason.contains("already booked on 2026-05-16"));
    }

    #[tokio::test]
    async fn badges_raise_confidence_up_to_cap() {
        let ctx = ScoringContext::default();
        let none = HeuristicScorer
            .score(&candidate(Some(1), false, &[]), &WeddingProfile::default(), &ctx)
            .await
            .unwrap();
        let three = HeuristicScorer
            .score(&candidate(Some(1), false, &["a", "b", "c"]), &WeddingProfile::default(), &ctx)
            .await
            .unwrap();
        let five = HeuristicScorer
            .score(
                &candidate(Some(1), false, &["a", "b", "c", "d", "e"]),
                &WeddingProfile::default(),
                &ctx,
            )
            .await
            .unwrap();
        assert!(three.confidence > none.confidence);
        assert!((three.confidence - five.confidence).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn confidence_stays_in_unit_range() {
        let ctx = ScoringContext {
            allocation: Some(400),
            region_fallback: false,
        };
        let score = HeuristicScorer
            .score(&candidate(Some(400), false, &["a", "b", "c"]), &profile(), &ctx)
            .await
            .unwrap();
        assert!((0.0..=1.0).contains(&score.confidence));
        assert!((score.confidence - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn fallback_is_mentioned_in_reason() {
        let mut vendor = candidate(Some(100), false, &[]);
        vendor.region = "Busan".to_owned();
        let ctx = ScoringContext {
            allocation: None,
            region_fallback: true,
        };
        let score = HeuristicScorer.score(&vendor, &profile(), &ctx).await.unwrap();
        assert!(score.reason.contains("nothing suitable in Seoul"));
    }
}
