//! CSV transaction import
//!
//! Expected header: `date,type,amount,category,description`
//!
//! - `date`: `YYYY-MM-DD`
//! - `type`: `income` or `expense`
//! - `amount`: non-negative decimal
//! - `category`: looked up by name, created on first use
//! - `description`: optional
//!
//! Each row is hashed for deduplication, so importing the same file twice
//! only adds its transactions once.

use std::collections::HashMap;
use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::db::{Database, TransactionInsertResult};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, TransactionType};

/// Raw CSV record, before validation
#[derive(Debug, Deserialize)]
struct CsvRecord {
    date: String,
    #[serde(rename = "type")]
    transaction_type: String,
    amount: String,
    category: String,
    #[serde(default)]
    description: Option<String>,
}

/// A validated row ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub date: NaiveDate,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
    pub categories_created: usize,
}

/// Parse and validate CSV rows
///
/// Fails on the first invalid row, reporting its line number.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        // Header is line 1
        let line = idx + 2;
        let record = result?;
        rows.push(validate(record).map_err(|e| Error::Import(format!("line {}: {}", line, e)))?);
    }

    debug!(rows = rows.len(), "Parsed CSV");
    Ok(rows)
}

fn validate(record: CsvRecord) -> std::result::Result<ImportRow, String> {
    let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", record.date))?;
    let transaction_type: TransactionType = record.transaction_type.parse()?;

    let cleaned: String = record.amount.chars().filter(|c| *c != ',' && *c != ' ').collect();
    let amount: f64 = cleaned
        .parse()
        .map_err(|_| format!("invalid amount '{}'", record.amount))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("amount must be a non-negative number, got '{}'", record.amount));
    }

    if record.category.is_empty() {
        return Err("category is required".into());
    }

    Ok(ImportRow {
        date,
        transaction_type,
        amount,
        category: record.category,
        description: record.description.filter(|d| !d.is_empty()),
    })
}

/// Deduplication hash for a row
///
/// `occurrence` counts identical rows earlier in the same file so that two
/// genuine same-day purchases are both kept.
fn import_hash(user_id: &str, row: &ImportRow, occurrence: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(row.date.to_string().as_bytes());
    hasher.update(row.transaction_type.as_str().as_bytes());
    hasher.update(row.amount.to_be_bytes());
    hasher.update(row.category.to_lowercase().as_bytes());
    hasher.update(row.description.as_deref().unwrap_or("").as_bytes());
    if occurrence > 0 {
        hasher.update(occurrence.to_be_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Store parsed rows for a user, creating categories as needed
pub fn import_rows(db: &Database, user_id: &str, rows: &[ImportRow]) -> Result<ImportStats> {
    db.seed_default_categories(user_id)?;

    let mut stats = ImportStats::default();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut category_ids: HashMap<(String, TransactionType), i64> = HashMap::new();

    for row in rows {
        let key = (row.category.to_lowercase(), row.transaction_type);
        let category_id = match category_ids.get(&key) {
            Some(id) => *id,
            None => {
                let existing = db.find_category_by_name(user_id, &row.category, row.transaction_type)?;
                let category = match existing {
                    Some(category) => category,
                    None => {
                        stats.categories_created += 1;
                        db.get_or_create_category(user_id, &row.category, row.transaction_type)?
                    }
                };
                category_ids.insert(key, category.id);
                category.id
            }
        };

        let base = import_hash(user_id, row, 0);
        let occurrence = seen.entry(base.clone()).or_insert(0);
        let hash = if *occurrence == 0 {
            base
        } else {
            import_hash(user_id, row, *occurrence)
        };
        *occurrence += 1;

        let result = db.insert_transaction(
            user_id,
            &NewTransaction {
                category_id,
                amount: row.amount,
                transaction_type: row.transaction_type,
                date: row.date,
                description: row.description.clone(),
                import_hash: Some(hash),
            },
        )?;

        match result {
            TransactionInsertResult::Inserted(_) => stats.imported += 1,
            TransactionInsertResult::Duplicate(_) => stats.skipped += 1,
        }
    }

    info!(
        user = user_id,
        imported = stats.imported,
        skipped = stats.skipped,
        "CSV import finished"
    );
    Ok(stats)
}

/// Parse a CSV stream and store it for a user
pub fn import_csv<R: Read>(db: &Database, user_id: &str, reader: R) -> Result<ImportStats> {
    let rows = parse_csv(reader)?;
    import_rows(db, user_id, &rows)
}
