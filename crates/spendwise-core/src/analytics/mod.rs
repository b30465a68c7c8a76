//! Rule-based financial analytics
//!
//! Each engine is a plain struct over in-memory transactions:
//! - `anomaly` - z-score outliers per income/expense cohort
//! - `health` - 0-100 financial health score with grade
//! - `forecast` - regression and trend forecasts of monthly totals
//! - `budget_advisor` - benchmark-driven budget suggestions
//! - `patterns` - day-of-week / week-of-month / category patterns
//! - `savings` - reduction targets for the largest categories
//! - `summary` - period totals and top categories
//! - `goals` - savings goal progress and pace
//!
//! Engines never touch storage. [`AnalyticsService`] fetches the right window
//! for a user and runs them.

mod aggregate;
pub mod anomaly;
pub mod budget_advisor;
pub mod forecast;
pub mod goals;
pub mod health;
mod outcome;
pub mod patterns;
pub mod savings;
mod service;
pub mod stats;
pub mod summary;

pub use aggregate::{monthly_aggregates, MonthlyAggregate};
pub use anomaly::{AnomalyDetector, AnomalyFinding, AnomalyReport, AnomalyType, Severity};
pub use budget_advisor::{BudgetAdvice, BudgetAdvisor, BudgetSuggestion, Recommendation};
pub use forecast::{ForecastEngine, NextMonthPrediction, Trend, TrendForecast};
pub use goals::{goal_progress, GoalProgress};
pub use health::{Grade, HealthInput, HealthScore, HealthScoreEngine};
pub use outcome::Outcome;
pub use patterns::{PatternDetector, SpendingPatterns};
pub use savings::{SavingsPlan, SavingsRecommender};
pub use service::AnalyticsService;
pub use summary::{Period, SpendingSummary};
