//! Savings goal command implementations

use anyhow::{Context, Result};
use chrono::Local;
use spendwise_core::db::Database;
use spendwise_core::models::NewGoal;
use spendwise_core::{AnalyticsConfig, AnalyticsService, Outcome};

use super::{parse_date_arg, truncate};

pub fn cmd_goals_list(db: &Database, user: &str) -> Result<()> {
    let config = AnalyticsConfig::default();
    let today = Local::now().date_naive();
    let goals = match AnalyticsService::new(db, &config).goals(user, today) {
        Outcome::Ready(goals) => goals,
        Outcome::InsufficientData { .. } => Vec::new(),
        Outcome::Failure { cause } => anyhow::bail!("Failed to load goals: {}", cause),
    };

    if goals.is_empty() {
        println!("No savings goals yet. Add one with:");
        println!("  spendwise goals add \"Emergency fund\" 5000 --deadline 2025-12-31");
        return Ok(());
    }

    println!();
    println!("🎯 Savings Goals");
    println!("   ─────────────────────────────────────────────────────────────");
    for g in goals {
        let pace = if g.is_on_track {
            "\x1b[32mon track\x1b[0m"
        } else {
            "\x1b[31mbehind\x1b[0m"
        };
        let deadline = match g.days_remaining {
            Some(days) if days >= 0 => format!("{} days left", days),
            Some(days) => format!("{} days overdue", -days),
            None => "no deadline".to_string(),
        };
        println!(
            "   [{}] {:<20} {:>10.2} / {:>10.2}  ({:>5.1}%)  {}",
            g.goal.id,
            truncate(&g.goal.name, 20),
            g.goal.current_amount,
            g.goal.target_amount,
            g.progress,
            pace
        );
        if g.monthly_needed > 0.0 {
            println!("       {}, {:.0} per month needed", deadline, g.monthly_needed);
        } else {
            println!("       {}", deadline);
        }
    }

    Ok(())
}

pub fn cmd_goals_add(
    db: &Database,
    user: &str,
    name: &str,
    target: f64,
    deadline: Option<&str>,
    priority: Option<i64>,
) -> Result<()> {
    let deadline = deadline.map(|d| parse_date_arg(Some(d))).transpose()?;
    let id = db
        .create_goal(
            user,
            &NewGoal {
                name: name.to_string(),
                target_amount: target,
                deadline,
                category: None,
                priority,
                icon: None,
                color: None,
            },
        )
        .context("Failed to create goal")?;

    println!("✅ Created goal #{} '{}' ({:.2})", id, name.trim(), target);
    Ok(())
}

pub fn cmd_goals_contribute(
    db: &Database,
    user: &str,
    id: i64,
    amount: f64,
    note: Option<&str>,
) -> Result<()> {
    db.contribute_to_goal(user, id, amount, note)
        .context("Failed to record contribution")?
        .ok_or_else(|| anyhow::anyhow!("Goal {} not found", id))?;

    let goal = db
        .get_goal(user, id)?
        .ok_or_else(|| anyhow::anyhow!("Goal {} not found", id))?;
    println!(
        "✅ Added {:.2} to '{}' ({:.2} / {:.2})",
        amount, goal.name, goal.current_amount, goal.target_amount
    );
    Ok(())
}

pub fn cmd_goals_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    if !db.delete_goal(user, id)? {
        anyhow::bail!("Goal {} not found", id);
    }
    println!("🗑️  Deleted goal #{}", id);
    Ok(())
}
