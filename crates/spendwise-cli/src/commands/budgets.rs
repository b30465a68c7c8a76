//! Budget command implementations

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use spendwise_core::db::Database;
use spendwise_core::models::{NewBudget, TransactionType};

/// Fill in the current month and year for missing arguments
fn resolve_month(month: Option<u32>, year: Option<i32>) -> Result<(u32, i32)> {
    let today = Local::now().date_naive();
    let month = month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        anyhow::bail!("Month must be between 1 and 12, got {}", month);
    }
    Ok((month, year.unwrap_or_else(|| today.year())))
}

pub fn cmd_budgets_list(
    db: &Database,
    user: &str,
    month: Option<u32>,
    year: Option<i32>,
) -> Result<()> {
    let (month, year) = resolve_month(month, year)?;
    let statuses = db.get_budget_status(user, month, year)?;

    if statuses.is_empty() {
        println!("No budgets set for {}-{:02}. Add one with:", year, month);
        println!("  spendwise budgets set Groceries 400");
        return Ok(());
    }

    println!();
    println!("💰 Budgets for {}-{:02}", year, month);
    println!("   ─────────────────────────────────────────────────────────────");

    for status in statuses {
        let name = status
            .budget
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Unknown");
        let marker = if status.remaining < 0.0 {
            "\x1b[31m⚠️ over\x1b[0m"
        } else {
            ""
        };
        println!(
            "   {:<20} {:>10.2} / {:>10.2}  ({:>5.1}%) {}",
            name, status.spent, status.budget.amount, status.percentage, marker
        );
    }

    Ok(())
}

pub fn cmd_budgets_set(
    db: &Database,
    user: &str,
    category: &str,
    amount: f64,
    month: Option<u32>,
    year: Option<i32>,
) -> Result<()> {
    let (month, year) = resolve_month(month, year)?;

    let category = db
        .find_category_by_name(user, category, TransactionType::Expense)?
        .ok_or_else(|| anyhow::anyhow!("Expense category '{}' not found", category))?;

    db.upsert_budget(
        user,
        &NewBudget {
            category_id: category.id,
            amount,
            month,
            year,
        },
    )
    .context("Failed to save budget")?;

    println!(
        "✅ Budget for '{}' in {}-{:02} set to {:.2}",
        category.name, year, month, amount
    );

    Ok(())
}
