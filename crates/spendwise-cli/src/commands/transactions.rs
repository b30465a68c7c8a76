//! Transaction command implementations

use anyhow::{Context, Result};
use spendwise_core::db::Database;
use spendwise_core::models::{NewTransaction, TransactionQuery, TransactionType};
use spendwise_core::TransactionInsertResult;

use super::{parse_date_arg, truncate};

pub fn cmd_transactions_list(db: &Database, user: &str, limit: i64) -> Result<()> {
    let query = TransactionQuery {
        limit: Some(limit.max(1)),
        ..Default::default()
    };
    let transactions = db.list_transactions(user, &query)?;

    if transactions.is_empty() {
        println!("No transactions found. Import some with:");
        println!("  spendwise import --file transactions.csv");
        return Ok(());
    }

    let total = db.count_transactions(user)?;

    println!();
    println!("📝 Recent Transactions ({} of {})", transactions.len(), total);
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions {
        let amount_str = if tx.is_expense() {
            format!("\x1b[31m-{:.2}\x1b[0m", tx.amount) // Red for expenses
        } else {
            format!("\x1b[32m+{:.2}\x1b[0m", tx.amount) // Green for income
        };

        println!(
            "   [{}] {} │ {:>12} │ {:<16} │ {}",
            tx.id,
            tx.date,
            amount_str,
            truncate(tx.category_name(), 16),
            truncate(tx.description.as_deref().unwrap_or(""), 35)
        );
    }

    Ok(())
}

pub fn cmd_transactions_add(
    db: &Database,
    user: &str,
    amount: f64,
    transaction_type: &str,
    category: &str,
    date: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let transaction_type: TransactionType = transaction_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let date = parse_date_arg(date)?;

    let category = db
        .get_or_create_category(user, category, transaction_type)
        .context("Failed to resolve category")?;

    let new_tx = NewTransaction {
        category_id: category.id,
        amount,
        transaction_type,
        date,
        description: description.map(str::to_string),
        import_hash: None,
    };

    match db.insert_transaction(user, &new_tx)? {
        TransactionInsertResult::Inserted(id) => {
            println!(
                "✅ Added {} of {:.2} in '{}' on {} (id {})",
                transaction_type, amount, category.name, date, id
            );
        }
        TransactionInsertResult::Duplicate(id) => {
            println!("⚠️  Transaction already recorded (id {})", id);
        }
    }

    Ok(())
}

/// Change some fields of a transaction, keeping the rest
#[allow(clippy::too_many_arguments)]
pub fn cmd_transactions_edit(
    db: &Database,
    user: &str,
    id: i64,
    amount: Option<f64>,
    transaction_type: Option<&str>,
    category: Option<&str>,
    date: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let current = db
        .get_transaction(user, id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {} not found", id))?;

    let transaction_type = match transaction_type {
        Some(t) => t.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        None => current.transaction_type,
    };
    let category_id = match category {
        Some(name) => {
            db.get_or_create_category(user, name, transaction_type)
                .context("Failed to resolve category")?
                .id
        }
        None => current.category_id,
    };
    let date = match date {
        Some(d) => parse_date_arg(Some(d))?,
        None => current.date,
    };

    let edit = NewTransaction {
        category_id,
        amount: amount.unwrap_or(current.amount),
        transaction_type,
        date,
        description: description.map(str::to_string).or(current.description),
        import_hash: None,
    };
    if !db.update_transaction(user, id, &edit)? {
        anyhow::bail!("Transaction {} not found", id);
    }

    println!(
        "✏️  Updated transaction {}: {} {:.2} on {}",
        id, edit.transaction_type, edit.amount, edit.date
    );
    Ok(())
}

pub fn cmd_transactions_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    let tx = db
        .get_transaction(user, id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {} not found", id))?;

    db.delete_transaction(user, id)?;

    println!(
        "🗑️  Deleted transaction {}: {} {:.2} ({})",
        id,
        tx.date,
        tx.amount,
        tx.category_name()
    );

    Ok(())
}
