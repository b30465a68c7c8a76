//! Spending reports

use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use rusqlite::params;

use super::budgets::{row_to_budget, BUDGET_SELECT};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{BudgetStatus, CategoryTotal, MonthlyTrendPoint, ReportSummary, TransactionType};

/// First day of the month containing `date`
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the given month
pub(crate) fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
        .and_then(|d| d.pred_opt())
}

impl Database {
    /// Income, expense and balance over an optional date range
    pub fn get_report_summary(
        &self,
        user_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<ReportSummary> {
        let conn = self.conn()?;
        let (total_income, total_expense, transaction_count): (f64, f64, i64) = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0),
                COUNT(*)
            FROM transactions
            WHERE user_id = ?1
              AND (?2 IS NULL OR date >= ?2)
              AND (?3 IS NULL OR date <= ?3)
            "#,
            params![
                user_id,
                from.map(|d| d.to_string()),
                to.map(|d| d.to_string())
            ],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(ReportSummary {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            transaction_count,
        })
    }

    /// Totals per category for one transaction type, largest first
    pub fn get_totals_by_category(
        &self,
        user_id: &str,
        transaction_type: TransactionType,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, c.name, c.icon, c.color, SUM(t.amount), COUNT(t.id)
            FROM transactions t
            JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ?1
              AND t.type = ?2
              AND (?3 IS NULL OR t.date >= ?3)
              AND (?4 IS NULL OR t.date <= ?4)
            GROUP BY c.id
            ORDER BY SUM(t.amount) DESC
            "#,
        )?;

        let totals = stmt
            .query_map(
                params![
                    user_id,
                    transaction_type.as_str(),
                    from.map(|d| d.to_string()),
                    to.map(|d| d.to_string())
                ],
                |row| {
                    Ok(CategoryTotal {
                        category_id: row.get(0)?,
                        name: row.get(1)?,
                        icon: row.get(2)?,
                        color: row.get(3)?,
                        total: row.get(4)?,
                        count: row.get(5)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(totals)
    }

    /// Monthly income/expense for the `months` calendar months ending with `as_of`'s month
    ///
    /// Months without transactions are included with zero totals so charts
    /// keep an even x-axis.
    pub fn get_monthly_trend(
        &self,
        user_id: &str,
        months: u32,
        as_of: NaiveDate,
    ) -> Result<Vec<MonthlyTrendPoint>> {
        let months = months.clamp(1, 60);
        let start = month_start(as_of)
            .checked_sub_months(Months::new(months - 1))
            .ok_or_else(|| Error::InvalidData("Trend window out of range".into()))?;
        let end = month_end(as_of.year(), as_of.month()).unwrap_or(as_of);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT strftime('%Y-%m', date) AS month,
                   COALESCE(SUM(CASE WHEN type = 'income' THEN amount ELSE 0 END), 0),
                   COALESCE(SUM(CASE WHEN type = 'expense' THEN amount ELSE 0 END), 0)
            FROM transactions
            WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
            GROUP BY month
            "#,
        )?;

        let mut by_month: HashMap<String, (f64, f64)> = stmt
            .query_map(
                params![user_id, start.to_string(), end.to_string()],
                |row| Ok((row.get::<_, String>(0)?, (row.get(1)?, row.get(2)?))),
            )?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;

        let mut points = Vec::with_capacity(months as usize);
        let mut cursor = start;
        for _ in 0..months {
            let key = cursor.format("%Y-%m").to_string();
            let (income, expense) = by_month.remove(&key).unwrap_or((0.0, 0.0));
            points.push(MonthlyTrendPoint {
                month: key,
                income,
                expense,
            });
            cursor = match cursor.checked_add_months(Months::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(points)
    }

    /// Budgets for a month with how much of each has been spent
    pub fn get_budget_status(&self, user_id: &str, month: u32, year: i32) -> Result<Vec<BudgetStatus>> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidData(format!("Invalid month {}-{}", year, month)))?;
        let end = month_end(year, month).unwrap_or(start);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE b.user_id = ? AND b.month = ? AND b.year = ? ORDER BY c.name",
            BUDGET_SELECT
        ))?;
        let budgets = stmt
            .query_map(params![user_id, month, year], row_to_budget)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut spent_stmt = conn.prepare(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = ? AND category_id = ? AND type = 'expense' AND date >= ? AND date <= ?
            "#,
        )?;

        let mut statuses = Vec::with_capacity(budgets.len());
        for budget in budgets {
            let spent: f64 = spent_stmt.query_row(
                params![user_id, budget.category_id, start.to_string(), end.to_string()],
                |row| row.get(0),
            )?;
            let percentage = if budget.amount > 0.0 {
                (spent / budget.amount * 100.0).round()
            } else {
                0.0
            };
            statuses.push(BudgetStatus {
                spent,
                remaining: budget.amount - spent,
                percentage,
                budget,
            });
        }

        Ok(statuses)
    }
}
