//! Per-category budget allocation.
//!
//! Before each category is filled, whatever budget is still unspent is
//! split across the categories not yet processed in proportion to their
//! weights. A category that ends up empty spends nothing, so its share
//! flows to the categories after it.

use serde::{Deserialize, Serialize};

use wedplan_db::models::VendorCategory;

/// Relative budget weight of each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub studio: u32,
    pub dress: u32,
    pub makeup: u32,
    pub venue: u32,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            studio: 2,
            dress: 2,
            makeup: 1,
            venue: 5,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: VendorCategory) -> u32 {
        match category {
            VendorCategory::Studio => self.studio,
            VendorCategory::Dress => self.dress,
            VendorCategory::Makeup => self.makeup,
            VendorCategory::Venue => self.venue,
        }
    }
}

/// Tracks the unspent budget of one recommendation run.
#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    remaining: Option<i64>,
    weights: CategoryWeights,
}

impl BudgetAllocator {
    /// `total = None` means unconstrained. Negative totals are treated as 0.
    pub fn new(total: Option<i64>, weights: CategoryWeights) -> Self {
        Self {
            remaining: total.map(|t| t.max(0)),
            weights,
        }
    }

    pub fn remaining(&self) -> Option<i64> {
        self.remaining
    }

    /// The share of the remaining budget for `category`, given the
    /// categories still to be processed (`pending`, which includes
    /// `category` itself).
    ///
    /// When every pending weight is zero the remainder is split evenly.
    pub fn allocation(&self, category: VendorCategory, pending: &[VendorCategory]) -> Option<i64> {
        let remaining = self.remaining?;
        if pending.len() <= 1 {
            return Some(remaining);
        }

        let total_weight: u64 = pending
            .iter()
            .map(|c| u64::from(self.weights.weight(*c)))
            .sum();

        let share = if total_weight == 0 {
            i128::from(remaining) / pending.len() as i128
        } else {
            i128::from(remaining) * i128::from(self.weights.weight(category))
                / i128::from(total_weight)
        };

        // share <= remaining, so the conversion cannot fail.
        Some(i64::try_from(share).unwrap_or(remaining))
    }

    /// Record a selection. Unpriced selections spend nothing.
    pub fn spend(&mut self, price: Option<i64>) {
        if let (Some(remaining), Some(price)) = (self.remaining.as_mut(), price) {
            *remaining = (*remaining - price.max(0)).max(0);
        }
    }
}
