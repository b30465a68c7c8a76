//! Category command implementations

use anyhow::{Context, Result};
use spendwise_core::db::Database;
use spendwise_core::models::{CategoryKind, CategoryUpdate, NewCategory, TransactionType};

fn parse_type(value: &str) -> Result<TransactionType> {
    value.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn cmd_categories_list(
    db: &Database,
    user: &str,
    transaction_type: Option<&str>,
) -> Result<()> {
    let filter = transaction_type.map(parse_type).transpose()?;
    let categories = db.list_categories(user, filter)?;

    if categories.is_empty() {
        println!("No categories yet. Seed the defaults with:");
        println!("  spendwise init");
        return Ok(());
    }

    println!();
    println!("🏷️  Categories");
    println!("   ─────────────────────────────────────────────");

    for cat in categories {
        println!(
            "   [{:>3}] {} {:<20} {:<8} {}",
            cat.id, cat.icon, cat.name, cat.category_type, cat.kind
        );
    }

    Ok(())
}

pub fn cmd_categories_add(
    db: &Database,
    user: &str,
    name: &str,
    transaction_type: &str,
    kind: Option<&str>,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Category name cannot be empty");
    }

    let category_type = parse_type(transaction_type)?;
    let kind: Option<CategoryKind> = kind
        .map(|k| k.parse().map_err(|e: String| anyhow::anyhow!(e)))
        .transpose()?;

    let id = db
        .create_category(
            user,
            &NewCategory {
                name: name.to_string(),
                category_type,
                kind,
                icon: None,
                color: None,
            },
        )
        .with_context(|| format!("Failed to create category '{}'", name))?;

    let created = db
        .get_category(user, id)?
        .ok_or_else(|| anyhow::anyhow!("Category {} not found after insert", id))?;

    println!(
        "✅ Created {} category '{}' (id {}, kind {})",
        created.category_type, created.name, created.id, created.kind
    );

    Ok(())
}

pub fn cmd_categories_rename(db: &Database, user: &str, id: i64, name: &str) -> Result<()> {
    let updated = db
        .update_category(
            user,
            id,
            &CategoryUpdate {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
        .with_context(|| format!("Failed to rename category {}", id))?
        .ok_or_else(|| anyhow::anyhow!("Category {} not found", id))?;

    println!("✏️  Renamed category {} to '{}'", id, updated.name);
    Ok(())
}

pub fn cmd_categories_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    if !db
        .delete_category(user, id)
        .with_context(|| format!("Failed to delete category {}", id))?
    {
        anyhow::bail!("Category {} not found", id);
    }
    println!("🗑️  Deleted category {}", id);
    Ok(())
}
