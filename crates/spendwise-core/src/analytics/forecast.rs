//! Spending forecasts
//!
//! Two models over monthly aggregates:
//! - least-squares regression for next month's expense (total or per category),
//!   with R² reported as a 0-100 confidence
//! - average-plus-trend projection of income, expense and savings for the next
//!   N months

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::config::ForecastConfig;
use crate::models::Transaction;

use super::aggregate::{month_key, monthly_aggregates, monthly_expense_totals, MonthlyAggregate};
use super::outcome::Outcome;
use super::stats::{linear_regression, linear_trend, mean};

/// Direction of a monthly series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    /// Classify a slope; anything within `deadband` of zero is stable
    pub fn from_slope(slope: f64, deadband: f64) -> Self {
        if slope > deadband {
            Trend::Increasing
        } else if slope < -deadband {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAmount {
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextMonthPrediction {
    pub prediction: f64,
    pub month: u32,
    pub year: i32,
    /// R² as a whole percentage
    pub confidence: u32,
    pub historical_data: Vec<MonthlyAmount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPrediction {
    pub category_id: i64,
    pub name: String,
    pub prediction: f64,
    pub confidence: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub month: String,
    pub predicted_income: f64,
    pub predicted_expense: f64,
    pub predicted_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub income: Trend,
    pub expense: Trend,
    pub income_change: f64,
    pub expense_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendForecast {
    pub historical: Vec<MonthlyAggregate>,
    pub forecast: Vec<ForecastPoint>,
    pub trends: Trends,
}

pub struct ForecastEngine {
    config: ForecastConfig,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastEngine {
    pub fn new() -> Self {
        Self {
            config: ForecastConfig::default(),
        }
    }

    pub fn with_config(config: ForecastConfig) -> Self {
        Self { config }
    }

    fn insufficient<T>(&self) -> Outcome<T> {
        Outcome::insufficient(format!(
            "Need at least {} months of data for prediction",
            self.config.min_months
        ))
    }

    /// Clamp a requested horizon into 1..=max_horizon
    pub fn horizon(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.config.default_horizon)
            .clamp(1, self.config.max_horizon)
    }

    /// Regress total monthly expense and predict the month after `as_of`
    pub fn predict_next_month(
        &self,
        transactions: &[Transaction],
        as_of: NaiveDate,
    ) -> Outcome<NextMonthPrediction> {
        let monthly = monthly_expense_totals(transactions);
        if monthly.len() < self.config.min_months {
            return self.insufficient();
        }

        let amounts: Vec<f64> = monthly.iter().map(|(_, total)| *total).collect();
        let fit = linear_regression(&amounts);
        let prediction = fit.predict(amounts.len() as f64).max(0.0).round();
        let confidence = (fit.r_squared * 100.0).round() as u32;

        let next = first_of_month(as_of)
            .checked_add_months(Months::new(1))
            .unwrap_or(as_of);

        tracing::debug!(
            months = amounts.len(),
            prediction,
            confidence,
            "Next-month expense prediction"
        );

        Outcome::Ready(NextMonthPrediction {
            prediction,
            month: next.month(),
            year: next.year(),
            confidence,
            historical_data: monthly
                .into_iter()
                .map(|(month, amount)| MonthlyAmount { month, amount })
                .collect(),
        })
    }

    /// Per-category regression; categories with too few months are omitted
    pub fn predict_by_category(&self, transactions: &[Transaction]) -> Outcome<Vec<CategoryPrediction>> {
        // category id -> (name, month -> total)
        let mut by_category: BTreeMap<i64, (String, BTreeMap<String, f64>)> = BTreeMap::new();
        for tx in transactions.iter().filter(|t| t.is_expense()) {
            let entry = by_category
                .entry(tx.category_id)
                .or_insert_with(|| (tx.category_name().to_string(), BTreeMap::new()));
            *entry.1.entry(month_key(tx)).or_default() += tx.amount;
        }

        let predictions: Vec<CategoryPrediction> = by_category
            .into_iter()
            .filter(|(_, (_, months))| months.len() >= self.config.min_months)
            .map(|(category_id, (name, months))| {
                let amounts: Vec<f64> = months.into_values().collect();
                let fit = linear_regression(&amounts);
                CategoryPrediction {
                    category_id,
                    name,
                    prediction: fit.predict(amounts.len() as f64).max(0.0).round(),
                    confidence: (fit.r_squared * 100.0).round() as u32,
                }
            })
            .collect();

        tracing::debug!(categories = predictions.len(), "Per-category predictions");
        Outcome::Ready(predictions)
    }

    /// Project income, expense and savings for `horizon` months after `as_of`
    pub fn forecast(
        &self,
        transactions: &[Transaction],
        as_of: NaiveDate,
        horizon: Option<u32>,
    ) -> Outcome<TrendForecast> {
        let historical = monthly_aggregates(transactions);
        if historical.len() < self.config.min_months {
            return self.insufficient();
        }

        let incomes: Vec<f64> = historical.iter().map(|m| m.income).collect();
        let expenses: Vec<f64> = historical.iter().map(|m| m.expense).collect();
        let avg_income = mean(&incomes);
        let avg_expense = mean(&expenses);
        let income_slope = linear_trend(&incomes);
        let expense_slope = linear_trend(&expenses);

        let start = first_of_month(as_of);
        let forecast: Vec<ForecastPoint> = (1..=self.horizon(horizon))
            .filter_map(|i| {
                let month = start.checked_add_months(Months::new(i))?;
                let income = avg_income + income_slope * i as f64;
                let expense = avg_expense + expense_slope * i as f64;
                Some(ForecastPoint {
                    month: month.format("%Y-%m").to_string(),
                    predicted_income: income.round(),
                    predicted_expense: expense.round(),
                    predicted_savings: (income - expense).round(),
                })
            })
            .collect();

        let deadband = self.config.trend_deadband;
        let trends = Trends {
            income: Trend::from_slope(income_slope, deadband),
            expense: Trend::from_slope(expense_slope, deadband),
            income_change: income_slope.round(),
            expense_change: expense_slope.round(),
        };

        tracing::debug!(
            months = historical.len(),
            horizon = forecast.len(),
            "Trend forecast"
        );

        Outcome::Ready(TrendForecast {
            historical: historical
                .into_iter()
                .map(|m| MonthlyAggregate {
                    month: m.month,
                    income: m.income.round(),
                    expense: m.expense.round(),
                    savings: m.savings.round(),
                })
                .collect(),
            forecast,
            trends,
        })
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
