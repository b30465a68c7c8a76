//! Savings recommendations
//!
//! Categories that take a large share of total spending get a suggested
//! percentage cut and the savings that cut would produce.

use serde::Serialize;

use crate::config::SavingsConfig;
use crate::models::{CategoryKind, CategoryRef, Transaction};

use super::aggregate::expenses_by_category;
use super::outcome::Outcome;
use super::stats::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsRecommendation {
    pub category_id: i64,
    pub category: Option<CategoryRef>,
    pub current_monthly_spending: f64,
    pub percent_of_total: f64,
    /// Suggested cut, percent
    pub suggested_reduction: u32,
    pub potential_monthly_savings: f64,
    pub potential_yearly_savings: f64,
    pub priority: u8,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsSummary {
    pub total_monthly_expense: f64,
    pub total_potential_yearly_savings: f64,
    pub recommendation_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsPlan {
    pub recommendations: Vec<SavingsRecommendation>,
    pub summary: SavingsSummary,
}

/// (share threshold, reduction percent, priority), checked in order
const REDUCTION_TIERS: [(f64, u32, u8); 3] = [(30.0, 20, 1), (20.0, 15, 2), (15.0, 10, 3)];

/// Practical tip for cutting spending of a given kind
pub fn saving_tip(kind: CategoryKind, reduction: u32) -> String {
    match kind {
        CategoryKind::Food => "Cook at home more often and bring lunch to work".to_string(),
        CategoryKind::Transport => "Use public transport or share rides".to_string(),
        CategoryKind::Entertainment => "Look for free or discounted activities".to_string(),
        CategoryKind::Shopping => "Write a list before shopping and skip impulse buys".to_string(),
        _ => format!("Try to cut spending in this category by {}%", reduction),
    }
}

pub struct SavingsRecommender {
    config: SavingsConfig,
}

impl Default for SavingsRecommender {
    fn default() -> Self {
        Self::new()
    }
}

impl SavingsRecommender {
    pub fn new() -> Self {
        Self {
            config: SavingsConfig::default(),
        }
    }

    pub fn with_config(config: SavingsConfig) -> Self {
        Self { config }
    }

    pub fn recommend(&self, transactions: &[Transaction]) -> Outcome<SavingsPlan> {
        let expense_count = transactions.iter().filter(|t| t.is_expense()).count();
        if expense_count < self.config.min_transactions {
            return Outcome::insufficient("More expense data is needed for savings suggestions");
        }

        let months = self.config.window_months.max(1) as f64;
        let buckets = expenses_by_category(transactions);
        let total: f64 = buckets.iter().map(|b| b.total).sum();

        let mut recommendations: Vec<SavingsRecommendation> = buckets
            .iter()
            .filter_map(|bucket| {
                let share = if total > 0.0 {
                    bucket.total / total * 100.0
                } else {
                    0.0
                };
                let (_, reduction, priority) = REDUCTION_TIERS
                    .iter()
                    .copied()
                    .find(|(threshold, _, _)| share > *threshold)?;

                let category = bucket.transactions.first().and_then(|t| t.category.clone());
                let kind = category.as_ref().map(|c| c.kind).unwrap_or_default();
                let monthly = bucket.total / months;
                let monthly_savings = monthly * reduction as f64 / 100.0;

                Some(SavingsRecommendation {
                    category_id: bucket.category_id,
                    category,
                    current_monthly_spending: round_to(monthly, 2),
                    percent_of_total: round_to(share, 1),
                    suggested_reduction: reduction,
                    potential_monthly_savings: round_to(monthly_savings, 2),
                    potential_yearly_savings: round_to(monthly_savings * 12.0, 2),
                    priority,
                    tip: saving_tip(kind, reduction),
                })
            })
            .collect();

        recommendations.sort_by_key(|r| r.priority);

        let summary = SavingsSummary {
            total_monthly_expense: round_to(total / months, 2),
            total_potential_yearly_savings: round_to(
                recommendations.iter().map(|r| r.potential_yearly_savings).sum(),
                2,
            ),
            recommendation_count: recommendations.len(),
        };

        tracing::debug!(
            expenses = expense_count,
            recommendations = recommendations.len(),
            "Savings recommendations computed"
        );

        Outcome::Ready(SavingsPlan {
            recommendations,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::expense;

    #[test]
    fn test_requires_five_expenses() {
        let txs: Vec<Transaction> = (0..4).map(|_| expense(1, 10.0, "2024-01-10")).collect();
        assert!(!SavingsRecommender::new().recommend(&txs).is_ready());
    }

    #[test]
    fn test_reduction_tiers() {
        // Shares: food 40%, transport 25%, shopping 18%, health 17%
        let txs = vec![
            expense(7, 180.0, "2024-01-10"),
            expense(1, 400.0, "2024-01-10"),
            expense(2, 250.0, "2024-01-10"),
            expense(5, 100.0, "2024-01-10"),
            expense(5, 70.0, "2024-01-11"),
        ];
        let plan = SavingsRecommender::new().recommend(&txs).ready().unwrap();
        let tiers: Vec<(i64, u32, u8)> = plan
            .recommendations
            .iter()
            .map(|r| (r.category_id, r.suggested_reduction, r.priority))
            .collect();
        assert_eq!(tiers, vec![(1, 20, 1), (2, 15, 2), (7, 10, 3), (5, 10, 3)]);

        let food = &plan.recommendations[0];
        // 400 / 3 months * 20%
        assert_eq!(food.potential_monthly_savings, 26.67);
        assert_eq!(food.potential_yearly_savings, 320.0);
        assert!(food.tip.contains("Cook at home"));
    }

    #[test]
    fn test_small_shares_are_omitted() {
        let mut txs: Vec<Transaction> = (1..=8).map(|c| expense(c, 100.0, "2024-01-10")).collect();
        txs.push(expense(1, 0.0, "2024-01-11"));
        // Every category is 12.5% of the total
        let plan = SavingsRecommender::new().recommend(&txs).ready().unwrap();
        assert!(plan.recommendations.is_empty());
        assert_eq!(plan.summary.recommendation_count, 0);
        assert_eq!(plan.summary.total_monthly_expense, 266.67);
    }

    #[test]
    fn test_fallback_tip_mentions_reduction() {
        assert_eq!(
            saving_tip(CategoryKind::Housing, 15),
            "Try to cut spending in this category by 15%"
        );
    }
}
