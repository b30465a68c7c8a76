//! Grouping helpers shared by the engines

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::Transaction;

/// Income and expense totals for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate {
    /// "YYYY-MM"
    pub month: String,
    pub income: f64,
    pub expense: f64,
    pub savings: f64,
}

/// Month key used for bucketing ("YYYY-MM")
pub fn month_key(tx: &Transaction) -> String {
    tx.date.format("%Y-%m").to_string()
}

/// Bucket transactions by calendar month, oldest first
///
/// Only months that contain at least one transaction appear; gaps are not
/// filled, so index positions run over months with data.
pub fn monthly_aggregates(transactions: &[Transaction]) -> Vec<MonthlyAggregate> {
    let mut by_month: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for tx in transactions {
        let entry = by_month.entry(month_key(tx)).or_default();
        if tx.is_income() {
            entry.0 += tx.amount;
        } else {
            entry.1 += tx.amount;
        }
    }

    by_month
        .into_iter()
        .map(|(month, (income, expense))| MonthlyAggregate {
            month,
            income,
            expense,
            savings: income - expense,
        })
        .collect()
}

/// Expense totals per month, oldest first
pub fn monthly_expense_totals(transactions: &[Transaction]) -> Vec<(String, f64)> {
    let mut by_month: BTreeMap<String, f64> = BTreeMap::new();
    for tx in transactions.iter().filter(|t| t.is_expense()) {
        *by_month.entry(month_key(tx)).or_default() += tx.amount;
    }
    by_month.into_iter().collect()
}

/// Running totals for one category
#[derive(Debug, Clone)]
pub struct CategoryBucket<'a> {
    pub category_id: i64,
    pub transactions: Vec<&'a Transaction>,
    pub total: f64,
}

impl<'a> CategoryBucket<'a> {
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    pub fn name(&self) -> &str {
        self.transactions
            .first()
            .map(|t| t.category_name())
            .unwrap_or("Uncategorized")
    }
}

/// Group expense transactions by category, in first-seen order
pub fn expenses_by_category(transactions: &[Transaction]) -> Vec<CategoryBucket<'_>> {
    let mut buckets: Vec<CategoryBucket<'_>> = Vec::new();
    for tx in transactions.iter().filter(|t| t.is_expense()) {
        match buckets.iter_mut().find(|b| b.category_id == tx.category_id) {
            Some(bucket) => {
                bucket.total += tx.amount;
                bucket.transactions.push(tx);
            }
            None => buckets.push(CategoryBucket {
                category_id: tx.category_id,
                transactions: vec![tx],
                total: tx.amount,
            }),
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{expense, income};

    #[test]
    fn test_monthly_aggregates_sorted_and_sparse() {
        let txs = vec![
            expense(1, 50.0, "2024-03-10"),
            income(2, 1000.0, "2024-01-01"),
            expense(1, 30.0, "2024-01-15"),
        ];

        let months = monthly_aggregates(&txs);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2024-01");
        assert_eq!(months[0].income, 1000.0);
        assert_eq!(months[0].savings, 970.0);
        assert_eq!(months[1].month, "2024-03");
    }

    #[test]
    fn test_monthly_expense_totals_ignores_income() {
        let txs = vec![
            expense(1, 50.0, "2024-03-10"),
            expense(1, 25.0, "2024-03-11"),
            income(2, 1000.0, "2024-03-01"),
        ];
        assert_eq!(
            monthly_expense_totals(&txs),
            vec![("2024-03".to_string(), 75.0)]
        );
    }

    #[test]
    fn test_expenses_by_category() {
        let txs = vec![
            expense(1, 50.0, "2024-03-10"),
            expense(2, 20.0, "2024-03-10"),
            expense(1, 25.0, "2024-03-11"),
            income(9, 500.0, "2024-03-01"),
        ];
        let buckets = expenses_by_category(&txs);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].category_id, 1);
        assert_eq!(buckets[0].total, 75.0);
        assert_eq!(buckets[0].count(), 2);
    }
}
