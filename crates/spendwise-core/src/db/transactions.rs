//! Transaction operations

use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::{parse_date, parse_datetime, parse_enum, Database};
use crate::error::{Error, Result};
use crate::models::{CategoryRef, NewTransaction, Transaction, TransactionQuery};

/// Result of inserting a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionInsertResult {
    /// Transaction was inserted successfully, contains new transaction ID
    Inserted(i64),
    /// Transaction was a duplicate, contains existing transaction ID
    Duplicate(i64),
}

/// Hard cap on an explicit page size; `limit: None` returns every matching row
const MAX_LIST_LIMIT: i64 = 10_000;

const TRANSACTION_SELECT: &str = r#"
    SELECT t.id, t.user_id, t.category_id, t.amount, t.type, t.date, t.description, t.created_at,
           c.id, c.name, c.kind, c.icon, c.color
    FROM transactions t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let transaction_type: String = row.get(4)?;
    let date: String = row.get(5)?;
    let created_at: String = row.get(7)?;

    let category = match row.get::<_, Option<i64>>(8)? {
        Some(id) => {
            let kind: String = row.get(10)?;
            Some(CategoryRef {
                id,
                name: row.get(9)?,
                kind: parse_enum(&kind)?,
                icon: row.get(11)?,
                color: row.get(12)?,
            })
        }
        None => None,
    };

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        transaction_type: parse_enum(&transaction_type)?,
        date: parse_date(&date)?,
        description: row.get(6)?,
        category,
        created_at: parse_datetime(&created_at),
    })
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidData(format!(
            "Amount must be a non-negative number, got {}",
            amount
        )));
    }
    Ok(())
}

impl Database {
    /// Insert a transaction for a user
    ///
    /// Rows carrying an `import_hash` that already exists are reported as
    /// duplicates instead of being inserted again.
    pub fn insert_transaction(
        &self,
        user_id: &str,
        tx: &NewTransaction,
    ) -> Result<TransactionInsertResult> {
        validate_amount(tx.amount)?;
        if self.get_category(user_id, tx.category_id)?.is_none() {
            return Err(Error::NotFound(format!("category {}", tx.category_id)));
        }

        let conn = self.conn()?;

        if let Some(ref hash) = tx.import_hash {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM transactions WHERE import_hash = ?",
                    params![hash],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                return Ok(TransactionInsertResult::Duplicate(existing_id));
            }
        }

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, category_id, amount, type, date, description, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.category_id,
                tx.amount,
                tx.transaction_type.as_str(),
                tx.date.to_string(),
                tx.description,
                tx.import_hash,
            ],
        )?;

        Ok(TransactionInsertResult::Inserted(conn.last_insert_rowid()))
    }

    /// Get a single transaction (scoped to the user)
    pub fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("{} WHERE t.id = ? AND t.user_id = ?", TRANSACTION_SELECT),
                params![id, user_id],
                row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// List transactions matching a query, newest first
    ///
    /// Without a limit every matching row is returned, so analytics windows
    /// always see their full date range. Paged callers set `limit`.
    pub fn list_transactions(
        &self,
        user_id: &str,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut sql = format!("{} WHERE t.user_id = ?", TRANSACTION_SELECT);
        let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(from) = query.from {
            sql.push_str(" AND t.date >= ?");
            values.push(Box::new(from.to_string()));
        }
        if let Some(to) = query.to {
            sql.push_str(" AND t.date <= ?");
            values.push(Box::new(to.to_string()));
        }
        if let Some(transaction_type) = query.transaction_type {
            sql.push_str(" AND t.type = ?");
            values.push(Box::new(transaction_type.as_str()));
        }
        if let Some(category_id) = query.category_id {
            sql.push_str(" AND t.category_id = ?");
            values.push(Box::new(category_id));
        }

        sql.push_str(" ORDER BY t.date DESC, t.id DESC");
        let offset = query.offset.unwrap_or(0).max(0);
        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ? OFFSET ?");
                values.push(Box::new(limit.clamp(0, MAX_LIST_LIMIT)));
                values.push(Box::new(offset));
            }
            // SQLite needs a LIMIT before OFFSET; -1 means unbounded
            None if offset > 0 => {
                sql.push_str(" LIMIT -1 OFFSET ?");
                values.push(Box::new(offset));
            }
            None => {}
        }

        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let transactions = stmt
            .query_map(refs.as_slice(), row_to_transaction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(transactions)
    }

    /// Replace the editable fields of a transaction
    ///
    /// Returns false when the user has no transaction with this ID. The
    /// import hash is left alone so a re-import still deduplicates.
    pub fn update_transaction(&self, user_id: &str, id: i64, tx: &NewTransaction) -> Result<bool> {
        validate_amount(tx.amount)?;
        if self.get_category(user_id, tx.category_id)?.is_none() {
            return Err(Error::NotFound(format!("category {}", tx.category_id)));
        }

        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE transactions
            SET category_id = ?, amount = ?, type = ?, date = ?, description = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                tx.category_id,
                tx.amount,
                tx.transaction_type.as_str(),
                tx.date.to_string(),
                tx.description,
                id,
                user_id,
            ],
        )?;
        Ok(updated > 0)
    }

    /// Delete a transaction, returning whether a row was removed
    pub fn delete_transaction(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Count all transactions for a user
    pub fn count_transactions(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
