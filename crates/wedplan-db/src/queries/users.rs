//! Database query functions for the `users` table.
//!
//! Registration and login live outside the planner; these helpers exist for
//! visitor defaults, per-user locking and seeding.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::User;

/// Fields required to create a user row.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub name: &'a str,
    pub gender: Option<&'a str>,
    pub phone: &'a str,
}

/// Insert a user. Fails on a duplicate email (unique constraint).
pub async fn insert_user<'e>(executor: impl PgExecutor<'e>, new: &NewUser<'_>) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, name, gender, phone) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.name)
    .bind(new.gender)
    .bind(new.phone)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert user {:?}", new.email))?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch a user by email address.
pub async fn get_user_by_email<'e>(
    executor: impl PgExecutor<'e>,
    email: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
        .context("failed to fetch user by email")?;

    Ok(user)
}

/// Fetch a user and take a row lock on it for the rest of the transaction.
///
/// Every write that touches a user's main-plan flag goes through this lock,
/// so such writes serialize per user.
pub async fn lock_user<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to lock user")?;

    Ok(user)
}
