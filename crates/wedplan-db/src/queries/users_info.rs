//! Database query functions for the `users_info` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::UsersInfo;

/// Profile fields of a new `users_info` row.
#[derive(Debug, Clone, Default)]
pub struct NewUsersInfo<'a> {
    pub wedding_date: Option<NaiveDate>,
    pub preferred_region: Option<&'a str>,
    pub budget_limit: Option<i64>,
}

/// Insert a profile for `user_id` with the given main flag.
pub async fn insert_users_info<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    profile: &NewUsersInfo<'_>,
    is_main_plan: bool,
) -> Result<UsersInfo> {
    let info = sqlx::query_as::<_, UsersInfo>(
        "INSERT INTO users_info (user_id, wedding_date, preferred_region, budget_limit, is_main_plan) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(profile.wedding_date)
    .bind(profile.preferred_region)
    .bind(profile.budget_limit)
    .bind(is_main_plan)
    .fetch_one(executor)
    .await
    .context("failed to insert users_info")?;

    Ok(info)
}

/// Fetch a profile by ID.
pub async fn get_users_info<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<UsersInfo>> {
    let info = sqlx::query_as::<_, UsersInfo>("SELECT * FROM users_info WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch users_info")?;

    Ok(info)
}

/// Number of profiles owned by a user.
pub async fn count_for_user<'e>(executor: impl PgExecutor<'e>, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users_info WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(executor)
        .await
        .context("failed to count users_info rows")?;

    Ok(count)
}

/// The user's main profile, if any.
pub async fn main_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Option<UsersInfo>> {
    let info = sqlx::query_as::<_, UsersInfo>(
        "SELECT * FROM users_info WHERE user_id = $1 AND is_main_plan",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .context("failed to fetch main users_info")?;

    Ok(info)
}

/// The most recently created profile of a user.
pub async fn latest_for_user<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
) -> Result<Option<UsersInfo>> {
    let info = sqlx::query_as::<_, UsersInfo>(
        "SELECT * FROM users_info WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .context("failed to fetch latest users_info")?;

    Ok(info)
}

/// Clear the main flag on every profile of `user_id` except `keep_id`.
///
/// Returns the number of rows that changed.
pub async fn clear_main_except<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    keep_id: Uuid,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE users_info \
         SET is_main_plan = false, updated_at = now() \
         WHERE user_id = $1 AND id <> $2 AND is_main_plan",
    )
    .bind(user_id)
    .bind(keep_id)
    .execute(executor)
    .await
    .context("failed to clear main plan flags")?;

    Ok(result.rows_affected())
}

/// Set the main flag on one profile. A profile that is already main is left
/// untouched, `updated_at` included.
pub async fn mark_main<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE users_info \
         SET is_main_plan = true, updated_at = now() \
         WHERE id = $1 AND NOT is_main_plan",
    )
    .bind(id)
    .execute(executor)
    .await
    .context("failed to mark main plan")?;

    Ok(result.rows_affected())
}

/// Delete a profile. Its plan and plan items cascade.
pub async fn delete_users_info<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users_info WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .context("failed to delete users_info")?;

    Ok(result.rows_affected() > 0)
}
