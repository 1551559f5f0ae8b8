//! Operator-mode CLI handlers for `wedplan plan` subcommands.
//!
//! Implements:
//! - `wedplan plan list <user-id>`            -- a user's profiles and plans
//! - `wedplan plan show <plan-id> --user <id>` -- one plan with its items

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use wedplan_core::composer::get_plan_detail;
use wedplan_core::registry::list_plans;
use wedplan_core::view::PlanListEntry;

use crate::PlanCommands;

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::List { user_id } => cmd_list(pool, &user_id).await,
        PlanCommands::Show { plan_id, user_id } => cmd_show(pool, &plan_id, &user_id).await,
    }
}

pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).with_context(|| format!("invalid {kind} ID: {raw:?}"))
}

/// Render an optional amount for a table cell.
pub(crate) fn money(amount: Option<i64>) -> String {
    amount.map_or_else(|| "-".to_owned(), |a| a.to_string())
}

// -----------------------------------------------------------------------
// wedplan plan list <user-id>
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool, user_id: &str) -> Result<()> {
    let user_id = parse_id("user", user_id)?;
    let entries = list_plans(pool, user_id).await?;

    if entries.is_empty() {
        println!("No plans found for user {user_id}.");
        return Ok(());
    }

    println!("{}", list_header());
    for entry in &entries {
        println!("{}", list_row(entry));
    }
    Ok(())
}

fn list_header() -> String {
    format!(
        "{:<4}  {:<36}  {:<36}  {:<10}  {:<12}  {:>12}  TITLE",
        "MAIN", "USERS_INFO", "PLAN", "DATE", "REGION", "BUDGET",
    )
}

fn list_row(entry: &PlanListEntry) -> String {
    let info = &entry.users_info;
    let marker = if info.is_main_plan { "*" } else { "" };
    let plan_id = entry
        .plan
        .as_ref()
        .map_or_else(|| "-".to_owned(), |p| p.id.to_string());
    let title = entry.plan.as_ref().map_or("-", |p| p.title.as_str());
    let date = info
        .wedding_date
        .map_or_else(|| "-".to_owned(), |d| d.to_string());
    format!(
        "{:<4}  {:<36}  {:<36}  {:<10}  {:<12}  {:>12}  {}",
        marker,
        info.id,
        plan_id,
        date,
        info.preferred_region.as_deref().unwrap_or("-"),
        money(info.budget_limit),
        title,
    )
}

// -----------------------------------------------------------------------
// wedplan plan show <plan-id> --user <user-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, plan_id: &str, user_id: &str) -> Result<()> {
    let plan_id = parse_id("plan", plan_id)?;
    let user_id = parse_id("user", user_id)?;
    let detail = get_plan_detail(pool, user_id, plan_id).await?;

    println!("Plan: {}", detail.plan.title);
    println!("  ID:           {}", detail.plan.id);
    println!("  Main:         {}", detail.users_info.is_main_plan);
    println!("  AI generated: {}", detail.plan.is_ai_generated);
    println!("  Budget:       {}", money(detail.plan.total_budget));
    println!("  Items:        {}", detail.plan_items.len());

    for item in &detail.plan_items {
        println!();
        println!("  [{}] {}", item.vendor.category, item.vendor.name);
        println!("    Vendor ID:   {}", item.vendor.id);
        println!("    Region:      {}", item.vendor.region);
        println!("    Source:      {:?}", item.source);
        println!("    Reason:      {}", item.selection_reason);
        if let Some(slot) = &item.reservation {
            println!(
                "    Reserved:    {} {}",
                slot.reservation_date,
                slot.reservation_time.format("%H:%M")
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use wedplan_core::view::{PlanView, UsersInfoView};

    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        let err = parse_id("plan", "abc").unwrap_err();
        assert!(err.to_string().contains("invalid plan ID"));
        assert!(parse_id("plan", &Uuid::nil().to_string()).is_ok());
    }

    #[test]
    fn list_row_marks_main_and_fills_blanks() {
        let entry = PlanListEntry {
            users_info: UsersInfoView {
                id: Uuid::nil(),
                is_main_plan: true,
                wedding_date: NaiveDate::from_ymd_opt(2026, 5, 9),
                preferred_region: None,
                budget_limit: Some(30_000_000),
            },
            plan: Some(PlanView {
                id: Uuid::nil(),
                title: "My Wedding Plan".into(),
                total_budget: Some(30_000_000),
                is_ai_generated: false,
            }),
        };
        let row = list_row(&entry);
        assert!(row.starts_with('*'));
        assert!(row.contains("2026-05-09"));
        assert!(row.contains("30000000"));
        assert!(row.ends_with("My Wedding Plan"));

        let bare = PlanListEntry { plan: None, ..entry };
        assert!(list_row(&bare).ends_with('-'));
    }
}
