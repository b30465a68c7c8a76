//! Financial health score
//!
//! Four sub-scores, each normalized to 0..=25, summed into a 0..=100 score:
//! - savings rate: 25 points at the target rate (20% by default)
//! - budget compliance: share of budgets not exceeded this month
//! - spending stability: penalizes month-to-month variation (CV) above a baseline
//! - diversification: number of distinct expense categories

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::HealthConfig;
use crate::models::{Budget, Transaction};

use super::aggregate::monthly_expense_totals;
use super::outcome::Outcome;
use super::stats::{coefficient_of_variation, round_to};

/// Maximum points for each sub-score
pub const SUB_SCORE_MAX: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(total: u32) -> Self {
        match total {
            80.. => Grade::A,
            60..=79 => Grade::B,
            40..=59 => Grade::C,
            _ => Grade::D,
        }
    }

    pub fn feedback(&self) -> &'static str {
        match self {
            Grade::A => "Excellent! You are managing your finances very well.",
            Grade::B => "Good. There are still a few things you could improve.",
            Grade::C => "Average. Pay closer attention to how you manage spending.",
            Grade::D => "Needs improvement. Take another look at your spending habits.",
        }
    }
}

/// Unit of a breakdown value, so clients can format it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueUnit {
    Percent,
    Categories,
    /// No meaningful value (e.g. no budgets set)
    None,
}

/// One sub-score with the figure it was derived from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub score: f64,
    pub max_score: f64,
    pub label: &'static str,
    pub value: Option<f64>,
    pub unit: ValueUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBreakdown {
    pub savings_rate: ScoreComponent,
    pub budget_compliance: ScoreComponent,
    pub spending_stability: ScoreComponent,
    pub diversification: ScoreComponent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub income: f64,
    pub expense: f64,
    pub savings: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub total_score: u32,
    pub grade: Grade,
    pub feedback: &'static str,
    pub improvements: Vec<&'static str>,
    pub breakdown: HealthBreakdown,
    pub summary: HealthSummary,
}

/// Data the health score is computed from
pub struct HealthInput<'a> {
    /// All transactions in the current month
    pub current_month: &'a [Transaction],
    /// Budgets set for the current month
    pub budgets: &'a [Budget],
    /// Expenses over the trailing stability window
    pub trailing_expenses: &'a [Transaction],
    /// Monthly income to use instead of the current month's income
    pub income_override: Option<f64>,
}

pub struct HealthScoreEngine {
    config: HealthConfig,
}

impl Default for HealthScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthScoreEngine {
    pub fn new() -> Self {
        Self {
            config: HealthConfig::default(),
        }
    }

    pub fn with_config(config: HealthConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, input: &HealthInput<'_>) -> Outcome<HealthScore> {
        let month_income: f64 = input
            .current_month
            .iter()
            .filter(|t| t.is_income())
            .map(|t| t.amount)
            .sum();
        let income = input.income_override.unwrap_or(month_income);
        let expense: f64 = input
            .current_month
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum();

        let savings_rate = self.savings_rate_score(income, expense);
        let budget_compliance = self.budget_compliance_score(input.current_month, input.budgets);
        let spending_stability = self.stability_score(input.trailing_expenses);
        let diversification = self.diversification_score(input.current_month);

        let raw_total = savings_rate.0 + budget_compliance.0 + spending_stability.0 + diversification.0;
        let total_score = raw_total.round().clamp(0.0, 100.0) as u32;
        let grade = Grade::from_score(total_score);

        let threshold = self.config.improvement_threshold;
        let mut improvements = Vec::new();
        if savings_rate.0 < threshold {
            improvements.push("Try to save at least 20% of your income");
        }
        if budget_compliance.0 < threshold {
            improvements.push("Stick to the budgets you have set");
        }
        if spending_stability.0 < threshold {
            improvements.push("Keep monthly spending steady");
        }
        if diversification.0 < threshold {
            improvements.push("Spread spending more evenly across categories");
        }

        tracing::debug!(total = total_score, grade = ?grade, "Health score computed");

        Outcome::Ready(HealthScore {
            total_score,
            grade,
            feedback: grade.feedback(),
            improvements,
            breakdown: HealthBreakdown {
                savings_rate: savings_rate.1,
                budget_compliance: budget_compliance.1,
                spending_stability: spending_stability.1,
                diversification: diversification.1,
            },
            summary: HealthSummary {
                income,
                expense,
                savings: income - expense,
                transaction_count: input.current_month.len(),
            },
        })
    }

    /// Returns (raw score, display component)
    fn savings_rate_score(&self, income: f64, expense: f64) -> (f64, ScoreComponent) {
        let rate = if income > 0.0 {
            (income - expense) / income * 100.0
        } else {
            0.0
        };
        let raw = (rate / self.config.target_savings_rate * SUB_SCORE_MAX).clamp(0.0, SUB_SCORE_MAX);
        (
            raw,
            component(raw, "Savings rate", Some(round_to(rate, 1)), ValueUnit::Percent),
        )
    }

    fn budget_compliance_score(
        &self,
        current_month: &[Transaction],
        budgets: &[Budget],
    ) -> (f64, ScoreComponent) {
        if budgets.is_empty() {
            return (
                SUB_SCORE_MAX,
                component(SUB_SCORE_MAX, "Budget compliance", None, ValueUnit::None),
            );
        }

        let mut spent: HashMap<i64, f64> = HashMap::new();
        for tx in current_month.iter().filter(|t| t.is_expense()) {
            *spent.entry(tx.category_id).or_default() += tx.amount;
        }

        let compliant = budgets
            .iter()
            .filter(|b| spent.get(&b.category_id).copied().unwrap_or(0.0) <= b.amount)
            .count();
        let ratio = compliant as f64 / budgets.len() as f64;
        let raw = SUB_SCORE_MAX * ratio;
        (
            raw,
            component(
                raw,
                "Budget compliance",
                Some(round_to(ratio * 100.0, 1)),
                ValueUnit::Percent,
            ),
        )
    }

    fn stability_score(&self, trailing_expenses: &[Transaction]) -> (f64, ScoreComponent) {
        let monthly: Vec<f64> = monthly_expense_totals(trailing_expenses)
            .into_iter()
            .map(|(_, total)| total)
            .collect();

        if monthly.len() < 2 {
            return (
                SUB_SCORE_MAX,
                component(SUB_SCORE_MAX, "Spending stability", None, ValueUnit::None),
            );
        }

        let cv = coefficient_of_variation(&monthly);
        let raw = (SUB_SCORE_MAX - (cv - self.config.cv_baseline) * self.config.cv_penalty)
            .clamp(0.0, SUB_SCORE_MAX);
        (
            raw,
            component(raw, "Spending stability", Some(round_to(cv, 1)), ValueUnit::Percent),
        )
    }

    fn diversification_score(&self, current_month: &[Transaction]) -> (f64, ScoreComponent) {
        let distinct: HashSet<i64> = current_month
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.category_id)
            .collect();
        let count = distinct.len();
        let raw = (count as f64 / self.config.diversification_target as f64 * SUB_SCORE_MAX)
            .min(SUB_SCORE_MAX);
        (
            raw,
            component(raw, "Diversification", Some(count as f64), ValueUnit::Categories),
        )
    }
}

fn component(raw: f64, label: &'static str, value: Option<f64>, unit: ValueUnit) -> ScoreComponent {
    ScoreComponent {
        score: raw.round(),
        max_score: SUB_SCORE_MAX,
        label,
        value,
        unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{expense, income};

    fn budget(category_id: i64, amount: f64) -> Budget {
        Budget {
            id: category_id,
            user_id: "test-user".into(),
            category_id,
            amount,
            month: 3,
            year: 2024,
            category: None,
        }
    }

    fn score(current: &[Transaction], budgets: &[Budget], trailing: &[Transaction]) -> HealthScore {
        HealthScoreEngine::new()
            .score(&HealthInput {
                current_month: current,
                budgets,
                trailing_expenses: trailing,
                income_override: None,
            })
            .ready()
            .unwrap()
    }

    #[test]
    fn test_twenty_percent_savings_is_full_score() {
        let current = vec![income(9, 1000.0, "2024-03-01"), expense(1, 800.0, "2024-03-02")];
        let result = score(&current, &[], &[]);
        assert_eq!(result.breakdown.savings_rate.score, 25.0);
        assert_eq!(result.breakdown.savings_rate.value, Some(20.0));
    }

    #[test]
    fn test_no_income_scores_zero_savings() {
        let current = vec![expense(1, 100.0, "2024-03-02")];
        let result = score(&current, &[], &[]);
        assert_eq!(result.breakdown.savings_rate.score, 0.0);
        assert_eq!(result.summary.income, 0.0);
    }

    #[test]
    fn test_overspending_clamps_to_zero() {
        let current = vec![income(9, 100.0, "2024-03-01"), expense(1, 500.0, "2024-03-02")];
        let result = score(&current, &[], &[]);
        assert_eq!(result.breakdown.savings_rate.score, 0.0);
        assert_eq!(result.summary.savings, -400.0);
    }

    #[test]
    fn test_no_budgets_is_full_compliance() {
        let result = score(&[], &[], &[]);
        assert_eq!(result.breakdown.budget_compliance.score, 25.0);
        assert_eq!(result.breakdown.budget_compliance.unit, ValueUnit::None);
        assert!(result.breakdown.budget_compliance.value.is_none());
    }

    #[test]
    fn test_budget_compliance_ratio() {
        let current = vec![expense(1, 150.0, "2024-03-02"), expense(2, 50.0, "2024-03-03")];
        // Food over (150 > 100), transport within (50 <= 50)
        let budgets = vec![budget(1, 100.0), budget(2, 50.0)];
        let result = score(&current, &budgets, &[]);
        assert_eq!(result.breakdown.budget_compliance.score, 13.0);
        assert_eq!(result.breakdown.budget_compliance.value, Some(50.0));
    }

    #[test]
    fn test_single_month_history_is_stable() {
        let trailing = vec![expense(1, 100.0, "2024-03-02"), expense(1, 900.0, "2024-03-20")];
        let result = score(&[], &[], &trailing);
        assert_eq!(result.breakdown.spending_stability.score, 25.0);
    }

    #[test]
    fn test_identical_months_clamp_stability_to_max() {
        let trailing = vec![
            expense(1, 500.0, "2024-01-10"),
            expense(1, 500.0, "2024-02-10"),
            expense(1, 500.0, "2024-03-10"),
        ];
        let result = score(&[], &[], &trailing);
        // CV 0 would give 35 unclamped
        assert_eq!(result.breakdown.spending_stability.score, 25.0);
    }

    #[test]
    fn test_volatile_months_lose_stability() {
        // mean 200, stdDev 100 -> CV 50 -> 25 - 30*0.5 = 10
        let trailing = vec![expense(1, 100.0, "2024-01-10"), expense(1, 300.0, "2024-02-10")];
        let result = score(&[], &[], &trailing);
        assert_eq!(result.breakdown.spending_stability.score, 10.0);
        assert_eq!(result.breakdown.spending_stability.value, Some(50.0));
    }

    #[test]
    fn test_diversification_caps_at_five() {
        let five: Vec<Transaction> = (1..=5).map(|c| expense(c, 10.0, "2024-03-01")).collect();
        let ten: Vec<Transaction> = (1..=10).map(|c| expense(c, 10.0, "2024-03-01")).collect();
        assert_eq!(score(&five, &[], &[]).breakdown.diversification.score, 25.0);
        assert_eq!(score(&ten, &[], &[]).breakdown.diversification.score, 25.0);
        assert_eq!(score(&ten, &[], &[]).breakdown.diversification.value, Some(10.0));
    }

    #[test]
    fn test_total_grade_and_improvements() {
        // Savings 0, compliance 25, stability 25, diversification 5
        let current = vec![expense(1, 100.0, "2024-03-01")];
        let result = score(&current, &[], &[]);
        assert_eq!(result.total_score, 55);
        assert_eq!(result.grade, Grade::C);
        assert_eq!(result.improvements.len(), 2);
        assert!(result.total_score <= 100);
    }

    #[test]
    fn test_income_override() {
        let current = vec![expense(1, 800.0, "2024-03-02")];
        let result = HealthScoreEngine::new()
            .score(&HealthInput {
                current_month: &current,
                budgets: &[],
                trailing_expenses: &[],
                income_override: Some(1000.0),
            })
            .ready()
            .unwrap();
        assert_eq!(result.breakdown.savings_rate.score, 25.0);
    }

    fn assert_in_range(result: &HealthScore) {
        let b = &result.breakdown;
        let components = [
            &b.savings_rate,
            &b.budget_compliance,
            &b.spending_stability,
            &b.diversification,
        ];
        for c in components {
            assert!(c.score.is_finite(), "{} is not finite", c.label);
            assert!((0.0..=25.0).contains(&c.score), "{} = {}", c.label, c.score);
        }
        assert!(result.total_score <= 100);
    }

    #[test]
    fn test_same_input_gives_same_score() {
        let current = vec![
            income(9, 2500.0, "2024-03-01"),
            expense(1, 420.0, "2024-03-03"),
            expense(2, 75.0, "2024-03-08"),
            expense(3, 900.0, "2024-03-10"),
        ];
        let budgets = vec![budget(1, 400.0), budget(2, 100.0)];
        let trailing = vec![
            expense(1, 380.0, "2024-01-05"),
            expense(3, 900.0, "2024-01-10"),
            expense(1, 510.0, "2024-02-05"),
            expense(3, 900.0, "2024-02-10"),
            expense(1, 420.0, "2024-03-03"),
        ];

        let first = score(&current, &budgets, &trailing);
        let second = score(&current, &budgets, &trailing);
        assert_eq!(first, second);
    }

    #[test]
    fn test_extreme_inputs_stay_in_range() {
        // Huge spending on a tiny income, every budget blown, wildly uneven months
        let mut current = vec![income(9, 0.01, "2024-03-01")];
        current.extend((1..=8).map(|c| expense(c, 1e12, "2024-03-02")));
        let budgets: Vec<Budget> = (1..=8).map(|c| budget(c, 0.0)).collect();
        let trailing = vec![
            expense(1, 1.0, "2023-10-10"),
            expense(1, 1e12, "2023-11-10"),
            expense(1, 0.5, "2023-12-10"),
            expense(1, 3e11, "2024-01-10"),
            expense(1, 2.0, "2024-02-10"),
            expense(1, 1e12, "2024-03-10"),
        ];

        let result = score(&current, &budgets, &trailing);
        assert_in_range(&result);
        assert_eq!(result.breakdown.savings_rate.score, 0.0);
        assert_eq!(result.breakdown.budget_compliance.score, 0.0);
        assert!(result.breakdown.spending_stability.value.unwrap() > 70.0);
        assert_eq!(result.breakdown.spending_stability.score, 0.0);
        assert_eq!(result.grade, Grade::D);
    }

    #[test]
    fn test_income_without_spending_stays_in_range() {
        let current = vec![income(9, 1e15, "2024-03-01")];
        let result = score(&current, &[budget(1, 10.0)], &[]);
        assert_in_range(&result);
        assert_eq!(result.breakdown.savings_rate.score, 25.0);

        let zero_override = HealthScoreEngine::new()
            .score(&HealthInput {
                current_month: &[expense(1, 50.0, "2024-03-01")],
                budgets: &[],
                trailing_expenses: &[],
                income_override: Some(0.0),
            })
            .ready()
            .unwrap();
        assert_in_range(&zero_override);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_score(80), Grade::A);
        assert_eq!(Grade::from_score(79), Grade::B);
        assert_eq!(Grade::from_score(60), Grade::B);
        assert_eq!(Grade::from_score(40), Grade::C);
        assert_eq!(Grade::from_score(39), Grade::D);
    }
}
