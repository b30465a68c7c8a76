//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Analytics thresholds from TOML
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use spendwise_core::{db::Database, AnalyticsConfig};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Load analytics configuration, falling back to defaults when no file exists
pub fn load_config(config_path: Option<&Path>) -> Result<AnalyticsConfig> {
    AnalyticsConfig::load(config_path).context("Failed to load analytics config")
}

/// Parse a `YYYY-MM-DD` argument, defaulting to today
pub fn parse_date_arg(value: Option<&str>) -> Result<NaiveDate> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", s)),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn cmd_init(db_path: &Path, user: &str) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    let created = db
        .seed_default_categories(user)
        .context("Failed to seed default categories")?;
    if created > 0 {
        println!("   Seeded {} default categories for '{}'", created, user);
    } else {
        println!("   Categories already present for '{}'", user);
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: spendwise import --file transactions.csv");
    println!("  2. Run an analysis: spendwise analyze health");
    println!("  3. Start web UI: spendwise serve");

    Ok(())
}
