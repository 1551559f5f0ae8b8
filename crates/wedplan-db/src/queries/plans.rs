//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::models::Plan;

/// Insert a plan for a profile. A profile has at most one plan (unique
/// `users_info_id`).
pub async fn insert_plan<'e>(
    executor: impl PgExecutor<'e>,
    users_info_id: Uuid,
    title: &str,
    total_budget: Option<i64>,
    is_ai_generated: bool,
) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (users_info_id, title, total_budget, is_ai_generated) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(users_info_id)
    .bind(title)
    .bind(total_budget)
    .bind(is_ai_generated)
    .fetch_one(executor)
    .await
    .context("failed to insert plan")?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Fetch the plan belonging to a profile.
pub async fn get_plan_for_users_info<'e>(
    executor: impl PgExecutor<'e>,
    users_info_id: Uuid,
) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE users_info_id = $1")
        .bind(users_info_id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch plan for users_info")?;

    Ok(plan)
}

/// The ownership chain of a plan: plan -> users_info -> user.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PlanOwner {
    pub plan_id: Uuid,
    pub users_info_id: Uuid,
    pub user_id: Uuid,
}

/// Resolve who owns a plan.
pub async fn get_plan_owner<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<Option<PlanOwner>> {
    let owner = sqlx::query_as::<_, PlanOwner>(
        "SELECT p.id AS plan_id, ui.id AS users_info_id, ui.user_id \
         FROM plans p \
         JOIN users_info ui ON ui.id = p.users_info_id \
         WHERE p.id = $1",
    )
    .bind(plan_id)
    .fetch_optional(executor)
    .await
    .context("failed to resolve plan owner")?;

    Ok(owner)
}

/// Lock a plan row for the rest of the transaction and return its owner.
pub async fn lock_plan<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<Option<PlanOwner>> {
    let owner = sqlx::query_as::<_, PlanOwner>(
        "SELECT p.id AS plan_id, ui.id AS users_info_id, ui.user_id \
         FROM plans p \
         JOIN users_info ui ON ui.id = p.users_info_id \
         WHERE p.id = $1 \
         FOR UPDATE OF p",
    )
    .bind(plan_id)
    .fetch_optional(executor)
    .await
    .context("failed to lock plan")?;

    Ok(owner)
}

/// Bump a plan's `updated_at` after its items change.
pub async fn touch_plan<'e>(executor: impl PgExecutor<'e>, plan_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE plans SET updated_at = now() WHERE id = $1")
        .bind(plan_id)
        .execute(executor)
        .await
        .context("failed to touch plan")?;

    Ok(())
}

/// One row of a user's plan list: the profile, joined with its plan when
/// one exists.
#[derive(Debug, Clone, FromRow)]
pub struct PlanListRow {
    pub users_info_id: Uuid,
    pub is_main_plan: bool,
    pub wedding_date: Option<NaiveDate>,
    pub preferred_region: Option<String>,
    pub budget_limit: Option<i64>,
    pub users_info_created_at: DateTime<Utc>,
    pub plan_id: Option<Uuid>,
    pub title: Option<String>,
    pub total_budget: Option<i64>,
    pub is_ai_generated: Option<bool>,
}

/// List every profile of a user with its plan, oldest first, in one query.
pub async fn list_plan_rows<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Vec<PlanListRow>> {
    let rows = sqlx::query_as::<_, PlanListRow>(
        "SELECT ui.id AS users_info_id, ui.is_main_plan, ui.wedding_date, \
                ui.preferred_region, ui.budget_limit, ui.created_at AS users_info_created_at, \
                p.id AS plan_id, p.title, p.total_budget, p.is_ai_generated \
         FROM users_info ui \
         LEFT JOIN plans p ON p.users_info_id = ui.id \
         WHERE ui.user_id = $1 \
         ORDER BY ui.created_at ASC, ui.id ASC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .context("failed to list plans for user")?;

    Ok(rows)
}
