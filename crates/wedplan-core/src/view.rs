//! Read shapes returned to clients.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use uuid::Uuid;

use wedplan_db::models::{Plan, PlanItemSource, UsersInfo, Vendor, VendorCategory};
use wedplan_db::queries::plan_items::PlanItemDetailRow;
use wedplan_db::queries::plans::PlanListRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsersInfoView {
    pub id: Uuid,
    pub is_main_plan: bool,
    pub wedding_date: Option<NaiveDate>,
    pub preferred_region: Option<String>,
    pub budget_limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanView {
    pub id: Uuid,
    pub title: String,
    pub total_budget: Option<i64>,
    pub is_ai_generated: bool,
}

/// One entry of a user's plan list. `plan` is `None` for a profile
/// without a plan row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanListEntry {
    pub users_info: UsersInfoView,
    pub plan: Option<PlanView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorSummary {
    pub id: Uuid,
    pub name: String,
    pub category: VendorCategory,
    pub region: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationSlot {
    pub reservation_date: NaiveDate,
    pub reservation_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanItemView {
    pub id: Uuid,
    pub is_confirmed: bool,
    pub source: PlanItemSource,
    pub selection_reason: String,
    pub order_index: i32,
    pub vendor: VendorSummary,
    pub reservation: Option<ReservationSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDetail {
    pub users_info: UsersInfoView,
    pub plan: PlanView,
    pub plan_items: Vec<PlanItemView>,
}

impl From<&UsersInfo> for UsersInfoView {
    fn from(info: &UsersInfo) -> Self {
        Self {
            id: info.id,
            is_main_plan: info.is_main_plan,
            wedding_date: info.wedding_date,
            preferred_region: info.preferred_region.clone(),
            budget_limit: info.budget_limit,
        }
    }
}

impl From<&Plan> for PlanView {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id,
            title: plan.title.clone(),
            total_budget: plan.total_budget,
            is_ai_generated: plan.is_ai_generated,
        }
    }
}

impl From<&Vendor> for VendorSummary {
    fn from(vendor: &Vendor) -> Self {
        Self {
            id: vendor.id,
            name: vendor.name.clone(),
            category: vendor.category,
            region: vendor.region.clone(),
            thumbnail_url: vendor.thumbnail_url.clone(),
        }
    }
}

impl From<PlanListRow> for PlanListEntry {
    fn from(row: PlanListRow) -> Self {
        let plan = row.plan_id.map(|id| PlanView {
            id,
            title: row.title.unwrap_or_default(),
            total_budget: row.total_budget,
            is_ai_generated: row.is_ai_generated.unwrap_or(false),
        });
        Self {
            users_info: UsersInfoView {
                id: row.users_info_id,
                is_main_plan: row.is_main_plan,
                wedding_date: row.wedding_date,
                preferred_region: row.preferred_region,
                budget_limit: row.budget_limit,
            },
            plan,
        }
    }
}

impl From<PlanItemDetailRow> for PlanItemView {
    fn from(row: PlanItemDetailRow) -> Self {
        let reservation = match (row.reservation_date, row.reservation_time) {
            (Some(reservation_date), Some(reservation_time)) => Some(ReservationSlot {
                reservation_date,
                reservation_time,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            is_confirmed: row.is_confirmed,
            source: row.source,
            selection_reason: row.selection_reason,
            order_index: row.order_index,
            vendor: VendorSummary {
                id: row.vendor_id,
                name: row.vendor_name,
                category: row.vendor_category,
                region: row.vendor_region,
                thumbnail_url: row.vendor_thumbnail_url,
            },
            reservation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn profile_without_plan_serializes_null_plan() {
        let row = PlanListRow {
            users_info_id: Uuid::nil(),
            is_main_plan: true,
            wedding_date: None,
            preferred_region: Some("Seoul".into()),
            budget_limit: None,
            users_info_created_at: Utc::now(),
            plan_id: None,
            title: None,
            total_budget: None,
            is_ai_generated: None,
        };
        let json = serde_json::to_value(PlanListEntry::from(row)).unwrap();
        assert!(json["plan"].is_null());
        assert_eq!(json["users_info"]["is_main_plan"], true);
        assert_eq!(json["users_info"]["preferred_region"], "Seoul");
    }

    #[test]
    fn item_without_reservation_has_null_slot() {
        let row = PlanItemDetailRow {
            id: Uuid::nil(),
            is_confirmed: false,
            source: PlanItemSource::AiRecommend,
            selection_reason: "fits".into(),
            order_index: 3,
            service_item_id: None,
            vendor_id: Uuid::nil(),
            vendor_name: "Grand Hall".into(),
            vendor_category: VendorCategory::Venue,
            vendor_region: "Seoul".into(),
            vendor_thumbnail_url: None,
            reservation_date: None,
            reservation_time: None,
        };
        let json = serde_json::to_value(PlanItemView::from(row)).unwrap();
        assert!(json["reservation"].is_null());
        assert_eq!(json["source"], "AI_RECOMMEND");
        assert_eq!(json["vendor"]["category"], "VENUE");
    }
}
