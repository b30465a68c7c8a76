//! Smart budget suggestions
//!
//! Compares each category's average monthly spend, as a share of monthly
//! income, against a benchmark table keyed by [`CategoryKind`]. Categories
//! above their ceiling get a "reduce" suggestion, clearly under-funded
//! essentials get "increase", everything else is "maintain".

use serde::Serialize;

use crate::config::AdvisorConfig;
use crate::models::{CategoryKind, Transaction};

use super::aggregate::expenses_by_category;
use super::outcome::Outcome;
use super::stats::round_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpendingClass {
    Essential,
    Want,
}

/// Recommended share of monthly income for one kind of spending
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Benchmark {
    /// Ceiling, percent of income
    pub max: f64,
    /// Target, percent of income
    pub ideal: f64,
    pub class: SpendingClass,
}

impl Benchmark {
    const fn new(max: f64, ideal: f64, class: SpendingClass) -> Self {
        Self { max, ideal, class }
    }

    /// Benchmark for a category kind; kinds without an entry use `Other`'s
    pub fn for_kind(kind: CategoryKind) -> Self {
        use SpendingClass::*;
        match kind {
            CategoryKind::Housing => Self::new(35.0, 30.0, Essential),
            CategoryKind::Food => Self::new(20.0, 15.0, Essential),
            CategoryKind::Transport => Self::new(15.0, 10.0, Essential),
            CategoryKind::Utilities => Self::new(10.0, 7.0, Essential),
            CategoryKind::Health => Self::new(10.0, 5.0, Essential),
            CategoryKind::Education => Self::new(10.0, 5.0, Essential),
            CategoryKind::Shopping => Self::new(10.0, 5.0, Want),
            CategoryKind::Entertainment => Self::new(8.0, 5.0, Want),
            _ => Self::new(10.0, 5.0, Want),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Reduce,
    Increase,
    Maintain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSuggestion {
    pub category_id: i64,
    pub category_name: String,
    pub kind: CategoryKind,
    pub class: SpendingClass,
    pub current_monthly_avg: f64,
    pub suggested_budget: f64,
    pub percent_of_income: f64,
    pub ideal_percent: f64,
    pub max_percent: f64,
    pub recommendation: Recommendation,
    /// 1 is most urgent
    pub priority: u8,
    pub potential_monthly_savings: f64,
    pub transaction_count: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub monthly_income: f64,
    pub total_suggested_budget: f64,
    pub total_potential_savings: f64,
    pub budget_rule: &'static str,
    pub essentials: f64,
    pub wants: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetAdvice {
    pub suggestions: Vec<BudgetSuggestion>,
    pub summary: BudgetSummary,
}

pub struct BudgetAdvisor {
    config: AdvisorConfig,
}

impl Default for BudgetAdvisor {
    fn default() -> Self {
        Self::new()
    }
}

impl BudgetAdvisor {
    pub fn new() -> Self {
        Self {
            config: AdvisorConfig::default(),
        }
    }

    pub fn with_config(config: AdvisorConfig) -> Self {
        Self { config }
    }

    /// Suggest budgets from a trailing window of transactions
    ///
    /// Monthly income is the window's income divided by the window length
    /// unless `monthly_income` is given.
    pub fn advise(
        &self,
        transactions: &[Transaction],
        monthly_income: Option<f64>,
    ) -> Outcome<BudgetAdvice> {
        let months = self.config.window_months.max(1) as f64;
        let income = monthly_income.unwrap_or_else(|| {
            transactions
                .iter()
                .filter(|t| t.is_income())
                .map(|t| t.amount)
                .sum::<f64>()
                / months
        });

        if income <= 0.0 {
            return Outcome::insufficient("Income data is needed to suggest budgets");
        }

        let buckets = expenses_by_category(transactions);
        if buckets.is_empty() {
            return Outcome::insufficient("No expenses found to base budgets on");
        }

        // Raw share of income kept alongside for ordering; the output field is rounded
        let mut ranked: Vec<(f64, BudgetSuggestion)> = buckets
            .iter()
            .filter_map(|bucket| {
                let kind = bucket
                    .transactions
                    .first()
                    .map(|t| t.category_kind())
                    .unwrap_or_default();
                let monthly_avg = bucket.total / months;
                let pct = monthly_avg / income * 100.0;
                let benchmark = Benchmark::for_kind(kind);
                let ideal_amount = income * benchmark.ideal / 100.0;

                let (recommendation, priority, suggested, reason) = if pct > benchmark.max {
                    (
                        Recommendation::Reduce,
                        1,
                        ideal_amount,
                        format!(
                            "{:.1}% of income is above the {}% ceiling",
                            pct, benchmark.max
                        ),
                    )
                } else if pct > benchmark.ideal {
                    (
                        Recommendation::Reduce,
                        2,
                        ideal_amount,
                        format!(
                            "{:.1}% of income is above the {}% target",
                            pct, benchmark.ideal
                        ),
                    )
                } else if pct < self.config.increase_below_percent
                    && bucket.count() < self.config.increase_max_count
                    && benchmark.class == SpendingClass::Essential
                {
                    (
                        Recommendation::Increase,
                        2,
                        ideal_amount,
                        format!(
                            "Only {:.1}% of income; essentials usually need about {}%",
                            pct, benchmark.ideal
                        ),
                    )
                } else if pct > self.config.maintain_min_percent {
                    (
                        Recommendation::Maintain,
                        3,
                        monthly_avg,
                        "Spending is within the recommended range".to_string(),
                    )
                } else {
                    return None;
                };

                Some((pct, BudgetSuggestion {
                    category_id: bucket.category_id,
                    category_name: bucket.name().to_string(),
                    kind,
                    class: benchmark.class,
                    current_monthly_avg: monthly_avg.round(),
                    suggested_budget: suggested.round(),
                    percent_of_income: round_to(pct, 1),
                    ideal_percent: benchmark.ideal,
                    max_percent: benchmark.max,
                    recommendation,
                    priority,
                    potential_monthly_savings: (monthly_avg - suggested).max(0.0).round(),
                    transaction_count: bucket.count(),
                    reason,
                }))
            })
            .collect();

        ranked.sort_by(|(pct_a, a), (pct_b, b)| {
            a.priority.cmp(&b.priority).then(pct_b.total_cmp(pct_a))
        });
        let suggestions: Vec<BudgetSuggestion> = ranked
            .into_iter()
            .take(self.config.max_suggestions)
            .map(|(_, suggestion)| suggestion)
            .collect();

        let summary = BudgetSummary {
            monthly_income: income.round(),
            total_suggested_budget: suggestions.iter().map(|s| s.suggested_budget).sum(),
            total_potential_savings: suggestions.iter().map(|s| s.potential_monthly_savings).sum(),
            budget_rule: "50/30/20",
            essentials: (income * 0.5).round(),
            wants: (income * 0.3).round(),
            savings: (income * 0.2).round(),
        };

        tracing::debug!(
            categories = buckets.len(),
            suggestions = suggestions.len(),
            "Budget suggestions computed"
        );

        Outcome::Ready(BudgetAdvice {
            suggestions,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{expense, income};

    /// Three months at 1000/month income
    fn with_income(mut txs: Vec<Transaction>) -> Vec<Transaction> {
        for date in ["2024-01-01", "2024-02-01", "2024-03-01"] {
            txs.push(income(9, 1000.0, date));
        }
        txs
    }

    fn advise(txs: &[Transaction]) -> BudgetAdvice {
        BudgetAdvisor::new().advise(txs, None).ready().unwrap()
    }

    #[test]
    fn test_requires_income() {
        let txs = vec![expense(1, 100.0, "2024-01-05")];
        let outcome = BudgetAdvisor::new().advise(&txs, None);
        assert!(!outcome.is_ready());
        assert!(outcome.message().unwrap().contains("Income"));
    }

    #[test]
    fn test_ties_after_rounding_keep_raw_order() {
        // Food 22.26% and shopping 22.34% both print as 22.3%
        let txs = with_income(vec![
            expense(1, 667.8, "2024-02-10"),
            expense(7, 670.2, "2024-02-11"),
        ]);
        let advice = advise(&txs);
        assert_eq!(advice.suggestions.len(), 2);
        assert_eq!(advice.suggestions[0].percent_of_income, 22.3);
        assert_eq!(advice.suggestions[1].percent_of_income, 22.3);
        assert_eq!(advice.suggestions[0].kind, CategoryKind::Shopping);
        assert_eq!(advice.suggestions[1].kind, CategoryKind::Food);
    }

    #[test]
    fn test_requires_expenses() {
        let outcome = BudgetAdvisor::new().advise(&with_income(vec![]), None);
        assert!(outcome.message().is_some());
    }

    #[test]
    fn test_above_ceiling_is_priority_one() {
        // Food: 900 over 3 months = 300/month = 30% > 20%
        let txs = with_income(vec![expense(1, 900.0, "2024-02-10")]);
        let advice = advise(&txs);
        let food = &advice.suggestions[0];
        assert_eq!(food.recommendation, Recommendation::Reduce);
        assert_eq!(food.priority, 1);
        assert_eq!(food.suggested_budget, 150.0);
        assert_eq!(food.potential_monthly_savings, 150.0);
    }

    #[test]
    fn test_exactly_at_ceiling_is_priority_two() {
        // Food: 600 / 3 = 200/month = exactly 20%
        let txs = with_income(vec![expense(1, 600.0, "2024-02-10")]);
        let food = &advise(&txs).suggestions[0];
        assert_eq!(food.percent_of_income, 20.0);
        assert_eq!(food.recommendation, Recommendation::Reduce);
        assert_eq!(food.priority, 2);
    }

    #[test]
    fn test_underfunded_essential_gets_increase() {
        // Health: 30 / 3 = 10/month = 1%, single transaction
        let txs = with_income(vec![expense(5, 30.0, "2024-02-10")]);
        let health = &advise(&txs).suggestions[0];
        assert_eq!(health.recommendation, Recommendation::Increase);
        assert_eq!(health.priority, 2);
        assert_eq!(health.suggested_budget, 50.0);
        assert_eq!(health.potential_monthly_savings, 0.0);
    }

    #[test]
    fn test_small_wants_are_dropped() {
        // Entertainment: 1% of income, a want, not worth a "maintain"
        let txs = with_income(vec![expense(8, 30.0, "2024-02-10")]);
        assert!(advise(&txs).suggestions.is_empty());
    }

    #[test]
    fn test_maintain_kept_above_five_percent() {
        // Housing: 750 / 3 = 250 = 25%, under ideal 30%
        let txs = with_income(vec![expense(3, 750.0, "2024-02-10")]);
        let housing = &advise(&txs).suggestions[0];
        assert_eq!(housing.recommendation, Recommendation::Maintain);
        assert_eq!(housing.priority, 3);
        assert_eq!(housing.suggested_budget, 250.0);
    }

    #[test]
    fn test_unknown_kind_uses_other_benchmark() {
        assert_eq!(
            Benchmark::for_kind(CategoryKind::Salary),
            Benchmark::for_kind(CategoryKind::Other)
        );
        // Misc category: 360 / 3 = 120 = 12% > 10%
        let txs = with_income(vec![expense(42, 360.0, "2024-02-10")]);
        let misc = &advise(&txs).suggestions[0];
        assert_eq!(misc.kind, CategoryKind::Other);
        assert_eq!(misc.priority, 1);
    }

    #[test]
    fn test_sorting_and_truncation() {
        let txs = with_income(vec![
            expense(3, 750.0, "2024-01-10"), // housing 25% maintain p3
            expense(2, 360.0, "2024-01-10"), // transport 12% reduce p2
            expense(1, 900.0, "2024-01-10"), // food 30% reduce p1
            expense(7, 450.0, "2024-01-10"), // shopping 15% reduce p1
        ]);
        let advice = advise(&txs);
        let order: Vec<i64> = advice.suggestions.iter().map(|s| s.category_id).collect();
        assert_eq!(order, vec![1, 7, 2, 3]);

        let limited = BudgetAdvisor::with_config(AdvisorConfig {
            max_suggestions: 2,
            ..AdvisorConfig::default()
        })
        .advise(&txs, None)
        .ready()
        .unwrap();
        assert_eq!(limited.suggestions.len(), 2);
    }

    #[test]
    fn test_summary_uses_fifty_thirty_twenty() {
        let txs = with_income(vec![expense(1, 900.0, "2024-02-10")]);
        let summary = advise(&txs).summary;
        assert_eq!(summary.monthly_income, 1000.0);
        assert_eq!(summary.budget_rule, "50/30/20");
        assert_eq!(summary.essentials, 500.0);
        assert_eq!(summary.wants, 300.0);
        assert_eq!(summary.savings, 200.0);
        assert_eq!(summary.total_potential_savings, 150.0);
    }

    #[test]
    fn test_income_override() {
        let txs = vec![expense(1, 900.0, "2024-02-10")];
        let advice = BudgetAdvisor::new().advise(&txs, Some(3000.0)).ready().unwrap();
        // 300 / 3000 = 10%, under the 15% ideal
        assert_eq!(advice.suggestions[0].recommendation, Recommendation::Maintain);
    }
}
