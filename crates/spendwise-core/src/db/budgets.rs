//! Budget operations

use rusqlite::{params, Row};

use super::{parse_enum, Database};
use crate::error::{Error, Result};
use crate::models::{Budget, CategoryRef, NewBudget};

pub(super) const BUDGET_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.category_id, b.amount, b.month, b.year,
           c.id, c.name, c.kind, c.icon, c.color
    FROM budgets b
    LEFT JOIN categories c ON c.id = b.category_id
"#;

pub(super) fn row_to_budget(row: &Row) -> rusqlite::Result<Budget> {
    let category = match row.get::<_, Option<i64>>(6)? {
        Some(id) => {
            let kind: String = row.get(8)?;
            Some(CategoryRef {
                id,
                name: row.get(7)?,
                kind: parse_enum(&kind)?,
                icon: row.get(9)?,
                color: row.get(10)?,
            })
        }
        None => None,
    };

    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        month: row.get(4)?,
        year: row.get(5)?,
        category,
    })
}

impl Database {
    /// Create or replace the budget for a category and month
    pub fn upsert_budget(&self, user_id: &str, budget: &NewBudget) -> Result<i64> {
        if !(1..=12).contains(&budget.month) {
            return Err(Error::InvalidData(format!(
                "Month must be between 1 and 12, got {}",
                budget.month
            )));
        }
        if !budget.amount.is_finite() || budget.amount < 0.0 {
            return Err(Error::InvalidData(format!(
                "Budget amount must be a non-negative number, got {}",
                budget.amount
            )));
        }
        if self.get_category(user_id, budget.category_id)?.is_none() {
            return Err(Error::NotFound(format!("category {}", budget.category_id)));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, category_id, amount, month, year)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, category_id, month, year) DO UPDATE SET amount = excluded.amount
            "#,
            params![
                user_id,
                budget.category_id,
                budget.amount,
                budget.month,
                budget.year
            ],
        )?;

        let id = conn.query_row(
            "SELECT id FROM budgets WHERE user_id = ? AND category_id = ? AND month = ? AND year = ?",
            params![user_id, budget.category_id, budget.month, budget.year],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// List the budgets a user set for one month
    pub fn list_budgets(&self, user_id: &str, month: u32, year: i32) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE b.user_id = ? AND b.month = ? AND b.year = ? ORDER BY c.name",
            BUDGET_SELECT
        ))?;

        let budgets = stmt
            .query_map(params![user_id, month, year], row_to_budget)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(budgets)
    }

    /// Delete a budget, returning whether a row was removed
    pub fn delete_budget(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM budgets WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }
}
