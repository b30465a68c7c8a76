//! Income/expense summary over a recent period

use std::collections::HashMap;

use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

use super::outcome::Outcome;
use super::stats::round_to;

const MIN_TRANSACTIONS: usize = 3;
const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
        }
    }

    /// First day covered when the period ends at `as_of`
    pub fn start(&self, as_of: NaiveDate) -> NaiveDate {
        let start = match self {
            Period::Week => as_of.checked_sub_signed(Duration::days(7)),
            Period::Month => as_of.checked_sub_months(Months::new(1)),
            Period::Quarter => as_of.checked_sub_months(Months::new(3)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            _ => Err(format!("Unknown period: {} (expected week, month or quarter)", s)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAmount {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    pub period: Period,
    pub total_income: f64,
    pub total_expense: f64,
    pub savings: f64,
    /// Percent, one decimal; 0 without income
    pub savings_rate: f64,
    pub transaction_count: usize,
    pub top_expense_categories: Vec<CategoryAmount>,
}

/// Summarize transactions already filtered to `period`
pub fn summarize(transactions: &[Transaction], period: Period) -> Outcome<SpendingSummary> {
    if transactions.len() < MIN_TRANSACTIONS {
        return Outcome::insufficient("More transactions are needed for an analysis");
    }

    let mut income = 0.0;
    let mut expense = 0.0;
    let mut by_category: HashMap<&str, f64> = HashMap::new();
    for tx in transactions {
        if tx.is_income() {
            income += tx.amount;
        } else {
            expense += tx.amount;
            *by_category.entry(tx.category_name()).or_default() += tx.amount;
        }
    }

    let mut top: Vec<CategoryAmount> = by_category
        .into_iter()
        .map(|(name, amount)| CategoryAmount {
            name: name.to_string(),
            amount,
        })
        .collect();
    // Name as tie-breaker since HashMap order is unspecified
    top.sort_by(|a, b| b.amount.total_cmp(&a.amount).then_with(|| a.name.cmp(&b.name)));
    top.truncate(TOP_CATEGORIES);

    let savings_rate = if income > 0.0 {
        round_to((income - expense) / income * 100.0, 1)
    } else {
        0.0
    };

    Outcome::Ready(SpendingSummary {
        period,
        total_income: income,
        total_expense: expense,
        savings: income - expense,
        savings_rate,
        transaction_count: transactions.len(),
        top_expense_categories: top,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{expense, income};

    #[test]
    fn test_requires_three_transactions() {
        let txs = vec![expense(1, 10.0, "2024-01-10"), income(9, 100.0, "2024-01-01")];
        assert!(summarize(&txs, Period::Month).message().is_some());
    }

    #[test]
    fn test_totals_and_rate() {
        let txs = vec![
            income(9, 1000.0, "2024-01-01"),
            expense(1, 300.0, "2024-01-05"),
            expense(2, 150.0, "2024-01-06"),
            expense(1, 50.0, "2024-01-07"),
        ];
        let summary = summarize(&txs, Period::Month).ready().unwrap();
        assert_eq!(summary.total_income, 1000.0);
        assert_eq!(summary.total_expense, 500.0);
        assert_eq!(summary.savings_rate, 50.0);
        assert_eq!(summary.transaction_count, 4);
        assert_eq!(summary.top_expense_categories[0].name, "Food");
        assert_eq!(summary.top_expense_categories[0].amount, 350.0);
    }

    #[test]
    fn test_no_income_rate_is_zero() {
        let txs: Vec<Transaction> = (1..=3).map(|c| expense(c, 10.0, "2024-01-10")).collect();
        let summary = summarize(&txs, Period::Week).ready().unwrap();
        assert_eq!(summary.savings_rate, 0.0);
        assert_eq!(summary.savings, -30.0);
    }

    #[test]
    fn test_period_start() {
        let as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(Period::Week.start(as_of), NaiveDate::from_ymd_opt(2024, 3, 24).unwrap());
        assert_eq!(Period::Month.start(as_of), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(Period::Quarter.start(as_of), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!("Quarter".parse::<Period>().unwrap(), Period::Quarter);
        assert!("year".parse::<Period>().is_err());
    }
}
