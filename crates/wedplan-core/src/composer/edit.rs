//! Item-level plan edits: regeneration, manual selection and removal.

use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use wedplan_db::models::{PlanItem, PlanItemSource};
use wedplan_db::queries::{plan_items, plans, reservations, users_info, vendors};

use crate::error::{CoreError, CoreResult};
use crate::profile::WeddingProfile;
use crate::recommend::{Exclusions, RecommendationEngine};

use super::owned;

const RESERVED_MESSAGE: &str = "vendor has an active reservation for this plan";

/// Whether [`add_or_replace_vendor`] appended a new item or overwrote the
/// item of the vendor's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddVendorAction {
    Added,
    Replaced,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddVendorOutcome {
    pub action: AddVendorAction,
    pub item: PlanItem,
}

/// Replace the vendor of one plan item with the recommender's next best
/// pick in the same category.
///
/// The budget available to the replacement is the profile budget minus the
/// prices of the other items. Every vendor already in the plan is excluded.
pub async fn regenerate_vendor(
    pool: &PgPool,
    engine: &RecommendationEngine,
    user_id: Uuid,
    plan_id: Uuid,
    vendor_id: Uuid,
) -> CoreResult<PlanItem> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    // Plan row before item row, the same order as the other edits.
    let owner = owned(plans::lock_plan(&mut *tx, plan_id).await?, user_id)?;

    let item = plan_items::lock_item_for_vendor(&mut *tx, plan_id, vendor_id)
        .await?
        .ok_or_else(|| CoreError::not_found("vendor is not part of this plan"))?;

    if reservations::exists_for_plan_vendor(&mut *tx, plan_id, vendor_id).await? {
        return Err(CoreError::conflict(RESERVED_MESSAGE));
    }

    let info = users_info::get_users_info(&mut *tx, owner.users_info_id)
        .await?
        .ok_or_else(|| CoreError::not_found("plan not found"))?;

    let prices = plan_items::list_item_prices(&mut *tx, plan_id).await?;
    let category = prices
        .iter()
        .find(|p| p.item_id == item.id)
        .map(|p| p.category)
        .with_context(|| format!("plan item {} has no vendor row", item.id))?;

    let remaining = remaining_budget(
        info.budget_limit,
        prices.iter().filter(|p| p.item_id != item.id).map(|p| p.price),
    );

    let profile = WeddingProfile::from(&info).with_budget(remaining);
    let exclusions = Exclusions::only(category).with_vendors(prices.iter().map(|p| p.vendor_id));

    let combination = engine.recommend(&mut *tx, &profile, &exclusions).await?;
    let pick = combination
        .get(category)
        .ok_or_else(|| CoreError::not_found("no alternative vendor"))?;

    let updated = plan_items::replace_item_vendor(
        &mut *tx,
        item.id,
        pick.vendor_id,
        pick.service_item_id,
        PlanItemSource::AiRecommend,
        &pick.selection_reason,
    )
    .await?;
    plans::touch_plan(&mut *tx, plan_id).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        %plan_id,
        %category,
        old_vendor = %vendor_id,
        new_vendor = %updated.vendor_id,
        "plan item regenerated"
    );
    Ok(updated)
}

/// Budget left for one item once the other items are paid for. Never
/// negative; `None` stays unconstrained.
fn remaining_budget(budget: Option<i64>, other_prices: impl IntoIterator<Item = Option<i64>>) -> Option<i64> {
    let spent = other_prices
        .into_iter()
        .flatten()
        .fold(0i64, i64::saturating_add);
    budget.map(|b| b.saturating_sub(spent).max(0))
}

/// Put a user-chosen vendor into a plan.
///
/// If the plan already has an item in the vendor's category that item is
/// overwritten; otherwise a new item is appended. The recommender and the
/// budget play no part.
pub async fn add_or_replace_vendor(
    pool: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    vendor_id: Uuid,
) -> CoreResult<AddVendorOutcome> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    owned(plans::lock_plan(&mut *tx, plan_id).await?, user_id)?;

    let vendor = vendors::get_vendor(&mut *tx, vendor_id)
        .await?
        .ok_or_else(|| CoreError::not_found("vendor not found"))?;
    let reason = format!("Selected by user: {}", vendor.name);

    let outcome = match plan_items::lock_item_for_category(&mut *tx, plan_id, vendor.category).await? {
        Some(existing) => {
            let item = plan_items::replace_item_vendor(
                &mut *tx,
                existing.id,
                vendor.id,
                None,
                PlanItemSource::UserSelect,
                &reason,
            )
            .await?;
            AddVendorOutcome {
                action: AddVendorAction::Replaced,
                item,
            }
        }
        None => {
            let item = plan_items::insert_plan_item(
                &mut *tx,
                &plan_items::NewPlanItem {
                    plan_id,
                    vendor_id: vendor.id,
                    service_item_id: None,
                    source: PlanItemSource::UserSelect,
                    selection_reason: &reason,
                    order_index: vendor.category.order_index(),
                },
            )
            .await?;
            AddVendorOutcome {
                action: AddVendorAction::Added,
                item,
            }
        }
    };
    plans::touch_plan(&mut *tx, plan_id).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(%plan_id, %vendor_id, action = ?outcome.action, "vendor selected by user");
    Ok(outcome)
}

/// Drop a vendor from a plan. Refused while the vendor is reserved
/// against the plan.
pub async fn remove_vendor(pool: &PgPool, user_id: Uuid, plan_id: Uuid, vendor_id: Uuid) -> CoreResult<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    owned(plans::lock_plan(&mut *tx, plan_id).await?, user_id)?;

    let item = plan_items::lock_item_for_vendor(&mut *tx, plan_id, vendor_id)
        .await?
        .ok_or_else(|| CoreError::not_found("vendor is not part of this plan"))?;

    if reservations::exists_for_plan_vendor(&mut *tx, plan_id, vendor_id).await? {
        return Err(CoreError::conflict(RESERVED_MESSAGE));
    }

    plan_items::delete_plan_item(&mut *tx, item.id).await?;
    plans::touch_plan(&mut *tx, plan_id).await?;

    tx.commit().await.context("failed to commit transaction")?;

    info!(%plan_id, %vendor_id, "vendor removed from plan");
    Ok(())
}
