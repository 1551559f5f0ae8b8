//! Plan composer: profile creation, plan materialization and plan reads.
//!
//! Every write runs in one transaction. Catalog reads made by the
//! recommender during a write go through the same transaction.

mod edit;

pub use edit::{AddVendorAction, AddVendorOutcome, add_or_replace_vendor, regenerate_vendor, remove_vendor};

use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use wedplan_db::models::{Plan, PlanItem, PlanItemSource, UsersInfo};
use wedplan_db::queries::{plan_items, plans, users, users_info};

use crate::error::{CoreError, CoreResult};
use crate::profile::ProfileInput;
use crate::recommend::{Exclusions, RecommendationEngine};
use crate::view::{PlanDetail, PlanItemView, PlanView, UsersInfoView};

/// Title of a plan built from a non-empty recommendation.
pub const AI_PLAN_TITLE: &str = "AI Recommended Plan";

/// Title of a plan the recommender could not fill.
pub const EMPTY_PLAN_TITLE: &str = "My Wedding Plan";

/// Result of [`create_users_info`].
#[derive(Debug, Clone, Serialize)]
pub struct CreatedPlan {
    pub users_info: UsersInfo,
    pub plan: Plan,
    pub plan_items: Vec<PlanItem>,
}

/// Resolve a plan the user owns, or fail with NotFound. Plans of other
/// users are reported the same way as missing ones.
pub(crate) fn owned(owner: Option<plans::PlanOwner>, user_id: Uuid) -> CoreResult<plans::PlanOwner> {
    owner
        .filter(|o| o.user_id == user_id)
        .ok_or_else(|| CoreError::not_found("plan not found"))
}

/// Create a wedding profile and its plan.
///
/// The first profile of a user becomes the main one. The recommender runs
/// with no exclusions; when it finds nothing the plan is still created,
/// empty and not AI-generated.
pub async fn create_users_info(
    pool: &PgPool,
    engine: &RecommendationEngine,
    user_id: Uuid,
    input: &ProfileInput,
) -> CoreResult<CreatedPlan> {
    let profile = input.validate()?;

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    users::lock_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("user not found"))?;

    let is_main = users_info::count_for_user(&mut *tx, user_id).await? == 0;
    let info = users_info::insert_users_info(
        &mut *tx,
        user_id,
        &users_info::NewUsersInfo {
            wedding_date: profile.wedding_date,
            preferred_region: profile.preferred_region.as_deref(),
            budget_limit: profile.budget_limit,
        },
        is_main,
    )
    .await?;

    let combination = engine
        .recommend(&mut *tx, &profile, &Exclusions::default())
        .await?;

    let (title, is_ai_generated) = if combination.is_empty() {
        (EMPTY_PLAN_TITLE, false)
    } else {
        (AI_PLAN_TITLE, true)
    };
    let plan = plans::insert_plan(&mut *tx, info.id, title, profile.budget_limit, is_ai_generated).await?;

    let mut items = Vec::with_capacity(combination.len());
    for pick in combination {
        let item = plan_items::insert_plan_item(
            &mut *tx,
            &plan_items::NewPlanItem {
                plan_id: plan.id,
                vendor_id: pick.vendor_id,
                service_item_id: pick.service_item_id,
                source: PlanItemSource::AiRecommend,
                selection_reason: &pick.selection_reason,
                order_index: pick.category.order_index(),
            },
        )
        .await?;
        items.push(item);
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        %user_id,
        users_info_id = %info.id,
        plan_id = %plan.id,
        is_main,
        items = items.len(),
        "plan created"
    );

    Ok(CreatedPlan {
        users_info: info,
        plan,
        plan_items: items,
    })
}

/// Delete a profile and, through the cascade, its plan and items.
///
/// Reservations survive with `plan_id` nulled. When the deleted profile
/// was main, the most recently created remaining one takes over.
pub async fn delete_users_info(pool: &PgPool, user_id: Uuid, users_info_id: Uuid) -> CoreResult<()> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    users::lock_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("user not found"))?;

    let info = users_info::get_users_info(&mut *tx, users_info_id)
        .await?
        .filter(|info| info.user_id == user_id)
        .ok_or_else(|| CoreError::not_found("users_info not found"))?;

    users_info::delete_users_info(&mut *tx, info.id).await?;

    let mut promoted = None;
    if info.is_main_plan {
        if let Some(next) = users_info::latest_for_user(&mut *tx, user_id).await? {
            users_info::mark_main(&mut *tx, next.id).await?;
            promoted = Some(next.id);
        }
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(%user_id, %users_info_id, promoted = ?promoted, "users_info deleted");
    Ok(())
}

/// The full view of one plan.
pub async fn get_plan_detail(pool: &PgPool, user_id: Uuid, plan_id: Uuid) -> CoreResult<PlanDetail> {
    let owner = owned(plans::get_plan_owner(pool, plan_id).await?, user_id)?;

    let info = users_info::get_users_info(pool, owner.users_info_id)
        .await?
        .ok_or_else(|| CoreError::not_found("plan not found"))?;
    let plan = plans::get_plan(pool, plan_id)
        .await?
        .ok_or_else(|| CoreError::not_found("plan not found"))?;
    let rows = plan_items::list_item_details(pool, plan_id).await?;

    Ok(PlanDetail {
        users_info: UsersInfoView::from(&info),
        plan: PlanView::from(&plan),
        plan_items: rows.into_iter().map(PlanItemView::from).collect(),
    })
}
