//! CSV import command

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use spendwise_core::{db::Database, import_csv};
use tracing::info;

pub fn cmd_import(db: &Database, user: &str, file: &Path) -> Result<()> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    println!("📥 Importing transactions from {}...", file.display());

    let stats = import_csv(db, user, BufReader::new(csv_file))
        .with_context(|| format!("Failed to import {}", file.display()))?;

    info!(
        imported = stats.imported,
        skipped = stats.skipped,
        "CSV import finished"
    );

    println!();
    println!("📊 Import Results");
    println!("   ─────────────────────────────");
    println!("   Imported: {}", stats.imported);
    println!("   Skipped (duplicates): {}", stats.skipped);
    if stats.categories_created > 0 {
        println!("   New categories: {}", stats.categories_created);
    }

    if stats.imported > 0 {
        println!();
        println!("✅ Done! Try 'spendwise analyze summary' next.");
    }

    Ok(())
}
