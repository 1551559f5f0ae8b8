//! Wedding profile input and its validated form.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use wedplan_db::models::UsersInfo;

use crate::error::{CoreError, CoreResult};

/// Raw profile as submitted by a client. Every field is optional; an empty
/// object is a valid request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub wedding_date: Option<String>,
    #[serde(default)]
    pub preferred_region: Option<String>,
    #[serde(default)]
    pub budget_limit: Option<i64>,
}

/// A validated wedding profile: the constraints the recommender works with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeddingProfile {
    pub wedding_date: Option<NaiveDate>,
    pub preferred_region: Option<String>,
    pub budget_limit: Option<i64>,
}

impl ProfileInput {
    /// Validate into a [`WeddingProfile`].
    ///
    /// `wedding_date` must be `YYYY-MM-DD`; `budget_limit` must not be
    /// negative. Blank strings count as absent.
    pub fn validate(&self) -> CoreResult<WeddingProfile> {
        let wedding_date = match self.wedding_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                CoreError::validation("wedding_date", "wedding_date must be in YYYY-MM-DD format")
            })?),
        };

        if matches!(self.budget_limit, Some(budget) if budget < 0) {
            return Err(CoreError::validation(
                "budget_limit",
                "budget_limit must not be negative",
            ));
        }

        let preferred_region = self
            .preferred_region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_owned);

        Ok(WeddingProfile {
            wedding_date,
            preferred_region,
            budget_limit: self.budget_limit,
        })
    }
}

impl WeddingProfile {
    /// The same profile with a different budget, used when re-running the
    /// recommender against what is left of the budget.
    pub fn with_budget(&self, budget_limit: Option<i64>) -> Self {
        Self {
            budget_limit,
            ..self.clone()
        }
    }
}

impl From<&UsersInfo> for WeddingProfile {
    fn from(info: &UsersInfo) -> Self {
        Self {
            wedding_date: info.wedding_date,
            preferred_region: info.preferred_region.clone(),
            budget_limit: info.budget_limit,
        }
    }
}
