//! Main-plan registry.
//!
//! Each user with at least one profile has exactly one main profile.
//! Switches lock the user row, clear every other main flag and then set
//! the target, so concurrent switches for the same user serialize and the
//! partial unique index never sees two mains.

use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use wedplan_db::queries::{plans, users, users_info};

use crate::composer::owned;
use crate::error::{CoreError, CoreResult};
use crate::view::{PlanListEntry, PlanView, UsersInfoView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MainPlanChange {
    pub plan_id: Uuid,
    pub users_info_id: Uuid,
}

/// Make `plan_id` the user's main plan. Idempotent.
pub async fn set_main_plan(pool: &PgPool, user_id: Uuid, plan_id: Uuid) -> CoreResult<MainPlanChange> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    users::lock_user(&mut *tx, user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("user not found"))?;

    // Resolved after the lock so a concurrent delete is observed.
    let owner = owned(plans::get_plan_owner(&mut *tx, plan_id).await?, user_id)?;

    let cleared = users_info::clear_main_except(&mut *tx, user_id, owner.users_info_id).await?;
    let marked = users_info::mark_main(&mut *tx, owner.users_info_id).await?;

    tx.commit().await.context("failed to commit transaction")?;

    if cleared > 0 || marked > 0 {
        info!(%user_id, %plan_id, users_info_id = %owner.users_info_id, "main plan switched");
    }

    Ok(MainPlanChange {
        plan_id,
        users_info_id: owner.users_info_id,
    })
}

/// Every profile of the user with its plan, oldest first.
pub async fn list_plans(pool: &PgPool, user_id: Uuid) -> CoreResult<Vec<PlanListEntry>> {
    let rows = plans::list_plan_rows(pool, user_id).await?;
    Ok(rows.into_iter().map(PlanListEntry::from).collect())
}

/// The user's main profile and its plan, if the user has any profile.
pub async fn main_plan(pool: &PgPool, user_id: Uuid) -> CoreResult<Option<PlanListEntry>> {
    let Some(info) = users_info::main_for_user(pool, user_id).await? else {
        return Ok(None);
    };
    let plan = plans::get_plan_for_users_info(pool, info.id).await?;

    Ok(Some(PlanListEntry {
        users_info: UsersInfoView::from(&info),
        plan: plan.as_ref().map(PlanView::from),
    }))
}
