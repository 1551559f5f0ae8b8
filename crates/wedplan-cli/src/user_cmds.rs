//! `wedplan user add` and `wedplan token issue`.
//!
//! Registration and login are out of scope for the planner; these commands
//! let an operator create accounts and hand out session tokens for the
//! HTTP API.

use anyhow::{Result, bail};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use wedplan_core::token::{TokenConfig, issue_token};
use wedplan_db::queries::users::{self, NewUser};

use crate::plan_cmds::parse_id;
use crate::{TokenCommands, UserCommands};

pub async fn run_user_command(command: UserCommands, pool: &PgPool) -> Result<()> {
    match command {
        UserCommands::Add {
            email,
            name,
            phone,
            gender,
        } => {
            let user = users::insert_user(
                pool,
                &NewUser {
                    email: &email,
                    password_hash: None,
                    name: &name,
                    gender: gender.as_deref(),
                    phone: &phone,
                },
            )
            .await?;
            println!("User created.");
            println!("  User ID: {}", user.id);
            println!("  Email:   {}", user.email);
            Ok(())
        }
    }
}

pub async fn run_token_command(
    command: TokenCommands,
    pool: &PgPool,
    tokens: &TokenConfig,
) -> Result<()> {
    match command {
        TokenCommands::Issue { user_id, ttl_hours } => {
            if ttl_hours <= 0 {
                bail!("--ttl-hours must be positive");
            }
            let user_id = parse_id("user", &user_id)?;
            if users::get_user(pool, user_id).await?.is_none() {
                bail!("user {user_id} not found");
            }
            let token = issue_token(tokens, user_id, Utc::now(), Duration::hours(ttl_hours))?;
            println!("{token}");
            Ok(())
        }
    }
}
