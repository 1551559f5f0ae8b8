use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Vendor category.
///
/// Variants are declared in recommendation order, so the derived `Ord`
/// matches [`VendorCategory::ALL`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorCategory {
    Studio,
    Dress,
    Makeup,
    Venue,
}

impl VendorCategory {
    /// Every category in recommendation order.
    pub const ALL: [VendorCategory; 4] = [Self::Studio, Self::Dress, Self::Makeup, Self::Venue];

    /// Position of this category in [`VendorCategory::ALL`]; stored as a
    /// plan item's `order_index`.
    pub fn order_index(self) -> i32 {
        match self {
            Self::Studio => 0,
            Self::Dress => 1,
            Self::Makeup => 2,
            Self::Venue => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Studio => "STUDIO",
            Self::Dress => "DRESS",
            Self::Makeup => "MAKEUP",
            Self::Venue => "VENUE",
        }
    }
}

impl fmt::Display for VendorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorCategory {
    type Err = VendorCategoryParseError;

    /// Case-insensitive, so CLI input like `venue` is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STUDIO" => Ok(Self::Studio),
            "DRESS" => Ok(Self::Dress),
            "MAKEUP" => Ok(Self::Makeup),
            "VENUE" => Ok(Self::Venue),
            _ => Err(VendorCategoryParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`VendorCategory`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid vendor category: {0:?} (expected STUDIO, DRESS, MAKEUP or VENUE)")]
pub struct VendorCategoryParseError(pub String);

// ---------------------------------------------------------------------------

/// Provenance of a plan item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanItemSource {
    AiRecommend,
    UserSelect,
}

impl fmt::Display for PlanItemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AiRecommend => "AI_RECOMMEND",
            Self::UserSelect => "USER_SELECT",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------

/// Status of a reservation. Only `Pending` is ever written by the planner;
/// the rest are set by the payment and vendor-confirmation flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    AwaitingPayment,
    Confirmed,
    Cancelled,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::AwaitingPayment => "AWAITING_PAYMENT",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// An account holder. Credentials are owned by the external auth surface.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub name: String,
    pub gender: Option<String>,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One wedding-profile snapshot. Carries the main-plan flag.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsersInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wedding_date: Option<NaiveDate>,
    pub preferred_region: Option<String>,
    pub budget_limit: Option<i64>,
    pub is_main_plan: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub category: VendorCategory,
    pub name: String,
    pub region: String,
    pub address: Option<String>,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub badges: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A priced offering of a vendor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceItem {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

/// The materialized vendor selection for a [`UsersInfo`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub users_info_id: Uuid,
    pub title: String,
    pub total_budget: Option<i64>,
    pub is_ai_generated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One category slot of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanItem {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub vendor_id: Uuid,
    pub service_item_id: Option<Uuid>,
    pub source: PlanItemSource,
    pub selection_reason: String,
    pub order_index: i32,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vendor_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
    pub status: ReservationStatus,
    pub is_deposit_paid: bool,
    pub deposit_amount: i64,
    pub visitor_name: String,
    pub visitor_phone: String,
    pub visitor_count: i32,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
