//! Spending pattern detection
//!
//! Buckets expenses by day of week, week of month and category name to find
//! when and where money goes.

use chrono::Datelike;
use serde::Serialize;

use crate::config::PatternConfig;
use crate::models::Transaction;

use super::outcome::Outcome;

/// Day names indexed by `num_days_from_sunday`
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const WEEKS_PER_MONTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthPosition {
    Early,
    Mid,
    Late,
}

impl MonthPosition {
    /// Position of a zero-based week-of-month index
    pub fn from_week(week_index: usize) -> Self {
        match week_index {
            0 => MonthPosition::Early,
            1 | 2 => MonthPosition::Mid,
            _ => MonthPosition::Late,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakDay {
    pub day: &'static str,
    pub day_index: usize,
    pub avg_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakWeek {
    /// 1-based week of month
    pub week: usize,
    pub position: MonthPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotal {
    pub day: &'static str,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPattern {
    pub name: String,
    pub total: f64,
    pub count: usize,
    pub avg_per_transaction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPatterns {
    pub peak_spending_day: PeakDay,
    pub peak_spending_week: PeakWeek,
    pub by_day_of_week: Vec<DayTotal>,
    pub by_week_of_month: Vec<f64>,
    pub top_categories: Vec<CategoryPattern>,
    pub insights: Vec<String>,
}

pub struct PatternDetector {
    config: PatternConfig,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternDetector {
    pub fn new() -> Self {
        Self {
            config: PatternConfig::default(),
        }
    }

    pub fn with_config(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Detect patterns over expense transactions (income is ignored)
    pub fn detect(&self, transactions: &[Transaction]) -> Outcome<SpendingPatterns> {
        let expenses: Vec<&Transaction> = transactions.iter().filter(|t| t.is_expense()).collect();
        if expenses.len() < self.config.min_transactions {
            return Outcome::insufficient(format!(
                "At least {} expenses are needed to find spending patterns",
                self.config.min_transactions
            ));
        }

        let mut by_day = [(0.0f64, 0usize); 7];
        let mut by_week = [0.0f64; WEEKS_PER_MONTH];
        let mut by_category: Vec<(String, f64, usize)> = Vec::new();

        for tx in &expenses {
            let day = tx.date.weekday().num_days_from_sunday() as usize;
            by_day[day].0 += tx.amount;
            by_day[day].1 += 1;

            let week = ((tx.date.day0() / 7) as usize).min(WEEKS_PER_MONTH - 1);
            by_week[week] += tx.amount;

            let name = tx.category_name();
            match by_category.iter_mut().find(|(n, _, _)| n == name) {
                Some(entry) => {
                    entry.1 += tx.amount;
                    entry.2 += 1;
                }
                None => by_category.push((name.to_string(), tx.amount, 1)),
            }
        }

        let peak_day = argmax(by_day.iter().map(|(total, _)| *total));
        let peak_week = argmax(by_week.iter().copied());

        let (peak_total, peak_count) = by_day[peak_day];
        let avg_amount = if peak_count > 0 {
            (peak_total / peak_count as f64).round()
        } else {
            0.0
        };

        // Stable sort keeps first-seen order for equal totals
        by_category.sort_by(|a, b| b.1.total_cmp(&a.1));
        let top_categories: Vec<CategoryPattern> = by_category
            .into_iter()
            .take(self.config.top_categories)
            .map(|(name, total, count)| CategoryPattern {
                name,
                total,
                count,
                avg_per_transaction: (total / count as f64).round(),
            })
            .collect();

        let position = MonthPosition::from_week(peak_week);
        let insights = build_insights(peak_day, position, &top_categories);

        tracing::debug!(
            expenses = expenses.len(),
            peak_day = DAY_NAMES[peak_day],
            peak_week = peak_week + 1,
            "Spending patterns detected"
        );

        Outcome::Ready(SpendingPatterns {
            peak_spending_day: PeakDay {
                day: DAY_NAMES[peak_day],
                day_index: peak_day,
                avg_amount,
            },
            peak_spending_week: PeakWeek {
                week: peak_week + 1,
                position,
            },
            by_day_of_week: DAY_NAMES
                .iter()
                .zip(by_day.iter())
                .map(|(day, (total, count))| DayTotal {
                    day: *day,
                    total: total.round(),
                    count: *count,
                })
                .collect(),
            by_week_of_month: by_week.iter().map(|t| t.round()).collect(),
            top_categories,
            insights,
        })
    }
}

/// Index of the largest value; ties go to the lowest index
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (idx, value) in values.enumerate() {
        if value > best.1 {
            best = (idx, value);
        }
    }
    best.0
}

fn build_insights(
    peak_day: usize,
    position: MonthPosition,
    top_categories: &[CategoryPattern],
) -> Vec<String> {
    let mut insights = vec![format!("📅 You spend the most on {}", DAY_NAMES[peak_day])];

    match position {
        MonthPosition::Early => insights
            .push("💡 Spending is concentrated early in the month, likely around payday".into()),
        MonthPosition::Late => {
            insights.push("⚠️ Spending runs high late in the month; keep a closer eye on it".into())
        }
        MonthPosition::Mid => {}
    }

    if let Some(top) = top_categories.first() {
        insights.push(format!("🏆 {} takes the largest share of your spending", top.name));
    }

    insights
}
