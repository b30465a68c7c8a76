//! Storage-backed entry points for the analytics engines

use chrono::{Datelike, Months, NaiveDate};

use crate::config::AnalyticsConfig;
use crate::db::{month_start, Database};
use crate::error::Result;
use crate::models::{Transaction, TransactionQuery, TransactionType};

use super::anomaly::{AnomalyDetector, AnomalyReport};
use super::budget_advisor::{BudgetAdvice, BudgetAdvisor};
use super::forecast::{CategoryPrediction, ForecastEngine, NextMonthPrediction, TrendForecast};
use super::goals::{goal_progress, GoalProgress};
use super::health::{HealthInput, HealthScore, HealthScoreEngine};
use super::outcome::Outcome;
use super::patterns::{PatternDetector, SpendingPatterns};
use super::savings::{SavingsPlan, SavingsRecommender};
use super::summary::{summarize, Period, SpendingSummary};

/// Runs engines over one user's data as of a given date
///
/// Storage errors become `Outcome::Failure`; the cause is logged here and
/// callers should not show it to end users.
pub struct AnalyticsService<'a> {
    db: &'a Database,
    config: &'a AnalyticsConfig,
}

impl<'a> AnalyticsService<'a> {
    pub fn new(db: &'a Database, config: &'a AnalyticsConfig) -> Self {
        Self { db, config }
    }

    /// Transactions dated from `months` before `as_of` through `as_of`
    fn trailing(
        &self,
        user_id: &str,
        as_of: NaiveDate,
        months: u32,
        transaction_type: Option<TransactionType>,
    ) -> Result<Vec<Transaction>> {
        let from = as_of
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        let mut query = TransactionQuery::between(from, as_of);
        query.transaction_type = transaction_type;
        self.db.list_transactions(user_id, &query)
    }

    fn run<T>(&self, operation: &'static str, f: impl FnOnce() -> Result<Outcome<T>>) -> Outcome<T> {
        match f() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(operation, error = %e, "Failed to load analytics data");
                Outcome::from(e)
            }
        }
    }

    pub fn anomalies(&self, user_id: &str, as_of: NaiveDate) -> Outcome<AnomalyReport> {
        self.run("anomalies", || {
            let config = &self.config.anomaly;
            let txs = self.trailing(user_id, as_of, config.window_months, None)?;
            Ok(AnomalyDetector::with_config(config.clone()).detect(&txs))
        })
    }

    pub fn health_score(
        &self,
        user_id: &str,
        as_of: NaiveDate,
        income_override: Option<f64>,
    ) -> Outcome<HealthScore> {
        self.run("health_score", || {
            let config = &self.config.health;
            let current = self
                .db
                .list_transactions(user_id, &TransactionQuery::between(month_start(as_of), as_of))?;
            let budgets = self.db.list_budgets(user_id, as_of.month(), as_of.year())?;
            let trailing = self.trailing(
                user_id,
                as_of,
                config.stability_window_months,
                Some(TransactionType::Expense),
            )?;

            Ok(HealthScoreEngine::with_config(config.clone()).score(&HealthInput {
                current_month: &current,
                budgets: &budgets,
                trailing_expenses: &trailing,
                income_override,
            }))
        })
    }

    pub fn forecast(
        &self,
        user_id: &str,
        as_of: NaiveDate,
        horizon: Option<u32>,
    ) -> Outcome<TrendForecast> {
        self.run("forecast", || {
            let config = &self.config.forecast;
            let txs = self.trailing(user_id, as_of, config.window_months, None)?;
            Ok(ForecastEngine::with_config(config.clone()).forecast(&txs, as_of, horizon))
        })
    }

    pub fn predict_next_month(&self, user_id: &str, as_of: NaiveDate) -> Outcome<NextMonthPrediction> {
        self.run("predict_next_month", || {
            let config = &self.config.forecast;
            let txs = self.trailing(
                user_id,
                as_of,
                config.window_months,
                Some(TransactionType::Expense),
            )?;
            Ok(ForecastEngine::with_config(config.clone()).predict_next_month(&txs, as_of))
        })
    }

    pub fn predict_by_category(
        &self,
        user_id: &str,
        as_of: NaiveDate,
    ) -> Outcome<Vec<CategoryPrediction>> {
        self.run("predict_by_category", || {
            let config = &self.config.forecast;
            let txs = self.trailing(
                user_id,
                as_of,
                config.window_months,
                Some(TransactionType::Expense),
            )?;
            Ok(ForecastEngine::with_config(config.clone()).predict_by_category(&txs))
        })
    }

    pub fn budget_suggestions(
        &self,
        user_id: &str,
        as_of: NaiveDate,
        monthly_income: Option<f64>,
    ) -> Outcome<BudgetAdvice> {
        self.run("budget_suggestions", || {
            let config = &self.config.advisor;
            let txs = self.trailing(user_id, as_of, config.window_months, None)?;
            Ok(BudgetAdvisor::with_config(config.clone()).advise(&txs, monthly_income))
        })
    }

    pub fn patterns(&self, user_id: &str, as_of: NaiveDate) -> Outcome<SpendingPatterns> {
        self.run("patterns", || {
            let config = &self.config.patterns;
            let txs = self.trailing(
                user_id,
                as_of,
                config.window_months,
                Some(TransactionType::Expense),
            )?;
            Ok(PatternDetector::with_config(config.clone()).detect(&txs))
        })
    }

    pub fn savings(&self, user_id: &str, as_of: NaiveDate) -> Outcome<SavingsPlan> {
        self.run("savings", || {
            let config = &self.config.savings;
            let txs = self.trailing(
                user_id,
                as_of,
                config.window_months,
                Some(TransactionType::Expense),
            )?;
            Ok(SavingsRecommender::with_config(config.clone()).recommend(&txs))
        })
    }

    pub fn summary(&self, user_id: &str, as_of: NaiveDate, period: Period) -> Outcome<SpendingSummary> {
        self.run("summary", || {
            let txs = self
                .db
                .list_transactions(user_id, &TransactionQuery::between(period.start(as_of), as_of))?;
            Ok(summarize(&txs, period))
        })
    }

    /// Every goal with its progress; an empty list when none are set
    pub fn goals(&self, user_id: &str, as_of: NaiveDate) -> Outcome<Vec<GoalProgress>> {
        self.run("goals", || {
            let goals = self.db.list_goals(user_id)?;
            Ok(Outcome::Ready(
                goals.iter().map(|g| goal_progress(g, as_of)).collect(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBudget, NewGoal, NewTransaction};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().unwrap();
        db.seed_default_categories("alice").unwrap();
        let food = db
            .find_category_by_name("alice", "Food & Dining", TransactionType::Expense)
            .unwrap()
            .unwrap()
            .id;
        let salary = db
            .find_category_by_name("alice", "Salary", TransactionType::Income)
            .unwrap()
            .unwrap()
            .id;
        (db, food, salary)
    }

    fn add(db: &Database, category_id: i64, amount: f64, t: TransactionType, d: &str) {
        db.insert_transaction(
            "alice",
            &NewTransaction {
                category_id,
                amount,
                transaction_type: t,
                date: date(d),
                description: None,
                import_hash: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_forecast_reads_trailing_window() {
        let (db, food, _) = setup();
        add(&db, food, 100.0, TransactionType::Expense, "2024-01-10");
        add(&db, food, 200.0, TransactionType::Expense, "2024-02-10");
        add(&db, food, 300.0, TransactionType::Expense, "2024-03-10");
        // Outside the 6-month window
        add(&db, food, 9999.0, TransactionType::Expense, "2023-01-10");

        let config = AnalyticsConfig::default();
        let service = AnalyticsService::new(&db, &config);
        let prediction = service
            .predict_next_month("alice", date("2024-03-31"))
            .ready()
            .unwrap();
        assert_eq!(prediction.prediction, 400.0);
        assert_eq!(prediction.confidence, 100);
    }

    #[test]
    fn test_forecast_sees_whole_window_with_many_rows() {
        let (db, food, _) = setup();
        add(&db, food, 100.0, TransactionType::Expense, "2024-01-10");
        add(&db, food, 200.0, TransactionType::Expense, "2024-02-10");
        // More March rows than a single page holds
        db.conn()
            .unwrap()
            .execute(
                "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 10000)
                 INSERT INTO transactions (user_id, category_id, amount, type, date)
                 SELECT 'alice', ?1, 0.03, 'expense', '2024-03-15' FROM n",
                rusqlite::params![food],
            )
            .unwrap();

        let config = AnalyticsConfig::default();
        let service = AnalyticsService::new(&db, &config);
        let prediction = service
            .predict_next_month("alice", date("2024-03-31"))
            .ready()
            .unwrap();
        assert_eq!(prediction.historical_data.len(), 3);
        assert_eq!(prediction.historical_data[0].month, "2024-01");
    }

    #[test]
    fn test_goals_report_progress_in_priority_order() {
        let (db, _, _) = setup();
        let config = AnalyticsConfig::default();
        let service = AnalyticsService::new(&db, &config);
        assert!(service.goals("alice", date("2024-01-01")).ready().unwrap().is_empty());

        let trip = db
            .create_goal(
                "alice",
                &NewGoal {
                    name: "Trip".into(),
                    target_amount: 1200.0,
                    deadline: Some(date("2024-03-31")),
                    category: None,
                    priority: Some(2),
                    icon: None,
                    color: None,
                },
            )
            .unwrap();
        db.create_goal(
            "alice",
            &NewGoal {
                name: "Emergency fund".into(),
                target_amount: 5000.0,
                deadline: None,
                category: None,
                priority: Some(1),
                icon: None,
                color: None,
            },
        )
        .unwrap();
        db.contribute_to_goal("alice", trip, 300.0, None).unwrap();

        let goals = service.goals("alice", date("2024-01-01")).ready().unwrap();
        assert_eq!(goals.len(), 2);
        assert_eq!(goals[0].goal.name, "Emergency fund");
        assert_eq!(goals[1].progress, 25.0);
        assert_eq!(goals[1].days_remaining, Some(90));
        assert!(!goals[1].is_on_track);
        assert!(service.goals("bob", date("2024-01-01")).ready().unwrap().is_empty());
    }

    #[test]
    fn test_data_is_scoped_to_user() {
        let (db, food, _) = setup();
        add(&db, food, 100.0, TransactionType::Expense, "2024-03-10");

        let config = AnalyticsConfig::default();
        let service = AnalyticsService::new(&db, &config);
        let outcome = service.summary("bob", date("2024-03-31"), Period::Month);
        assert!(outcome.message().is_some());
    }

    #[test]
    fn test_health_uses_current_month_budgets() {
        let (db, food, salary) = setup();
        add(&db, salary, 1000.0, TransactionType::Income, "2024-03-01");
        add(&db, food, 300.0, TransactionType::Expense, "2024-03-05");
        db.upsert_budget(
            "alice",
            &NewBudget {
                category_id: food,
                amount: 200.0,
                month: 3,
                year: 2024,
            },
        )
        .unwrap();

        let config = AnalyticsConfig::default();
        let score = AnalyticsService::new(&db, &config)
            .health_score("alice", date("2024-03-20"), None)
            .ready()
            .unwrap();
        assert_eq!(score.breakdown.budget_compliance.score, 0.0);
        assert_eq!(score.summary.income, 1000.0);
        assert_eq!(score.summary.expense, 300.0);
    }

    #[test]
    fn test_insufficient_data_passes_through() {
        let (db, food, _) = setup();
        add(&db, food, 100.0, TransactionType::Expense, "2024-03-10");

        let config = AnalyticsConfig::default();
        let service = AnalyticsService::new(&db, &config);
        let as_of = date("2024-03-31");
        assert!(service.anomalies("alice", as_of).message().is_some());
        assert!(service.patterns("alice", as_of).message().is_some());
        assert!(service.savings("alice", as_of).message().is_some());
        assert!(service.forecast("alice", as_of, None).message().is_some());
    }
}
