//! Integration tests for spendwise-core
//!
//! These tests exercise the full import → store → analyze workflow.

use chrono::NaiveDate;
use spendwise_core::{
    analytics::{budget_advisor::Recommendation, Grade, Severity, Trend},
    config::AnalyticsConfig,
    db::Database,
    import::import_csv,
    models::TransactionQuery,
    AnalyticsService, Period,
};

/// Six months (Oct 2023 - Mar 2024) of a steady routine plus one big
/// electronics purchase in March:
/// - salary 3000 on the 1st
/// - rent 900 on the 5th
/// - food 20 on the 3rd, 10th, 17th, 24th
/// - transport 15 on the 8th and 22nd
fn six_month_csv() -> String {
    let months = [
        (2023, 10),
        (2023, 11),
        (2023, 12),
        (2024, 1),
        (2024, 2),
        (2024, 3),
    ];
    let mut csv = String::from("date,type,amount,category,description\n");
    for (year, month) in months {
        let d = |day: u32| format!("{:04}-{:02}-{:02}", year, month, day);
        csv.push_str(&format!("{},income,3000,Salary,Monthly salary\n", d(1)));
        csv.push_str(&format!("{},expense,900,Housing,Rent\n", d(5)));
        for day in [3, 10, 17, 24] {
            csv.push_str(&format!("{},expense,20,Food & Dining,Groceries\n", d(day)));
        }
        for day in [8, 22] {
            csv.push_str(&format!("{},expense,15,Transport,Bus pass top-up\n", d(day)));
        }
    }
    csv.push_str("2024-03-15,expense,2500,Shopping,New laptop\n");
    csv
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
}

fn imported_db() -> Database {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let stats = import_csv(&db, "alice", six_month_csv().as_bytes()).expect("Failed to import CSV");
    assert_eq!(stats.imported, 49);
    db
}

// =============================================================================
// Import
// =============================================================================

#[test]
fn test_full_import_workflow() {
    let db = Database::in_memory().unwrap();

    let first = import_csv(&db, "alice", six_month_csv().as_bytes()).unwrap();
    assert_eq!(first.imported, 49);
    // All names match the seeded defaults
    assert_eq!(first.categories_created, 0);

    let stored = db
        .list_transactions("alice", &TransactionQuery::default())
        .unwrap();
    assert_eq!(stored.len(), 49);

    // Deduplication - importing again should skip all
    let second = import_csv(&db, "alice", six_month_csv().as_bytes()).unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 49);
}

// =============================================================================
// Analytics over imported data
// =============================================================================

#[test]
fn test_anomaly_flags_large_purchase() {
    let db = imported_db();
    let config = AnalyticsConfig::default();
    let service = AnalyticsService::new(&db, &config);

    let report = service.anomalies("alice", as_of()).ready().unwrap();
    let top = &report.anomalies[0];
    assert_eq!(top.transaction.amount, 2500.0);
    assert_eq!(top.severity, Severity::High);
    assert!(report.statistics.high_severity >= 1);
}

#[test]
fn test_forecasts_over_six_months() {
    let db = imported_db();
    let config = AnalyticsConfig::default();
    let service = AnalyticsService::new(&db, &config);

    let next = service.predict_next_month("alice", as_of()).ready().unwrap();
    assert_eq!(next.historical_data.len(), 6);
    assert_eq!((next.month, next.year), (4, 2024));
    assert!(next.confidence <= 100);

    let by_category = service.predict_by_category("alice", as_of()).ready().unwrap();
    let rent = by_category.iter().find(|p| p.name == "Housing").unwrap();
    assert_eq!(rent.prediction, 900.0);
    assert_eq!(rent.confidence, 100);
    // Shopping only has one month of data
    assert!(by_category.iter().all(|p| p.name != "Shopping"));

    let trend = service.forecast("alice", as_of(), Some(2)).ready().unwrap();
    assert_eq!(trend.forecast.len(), 2);
    assert_eq!(trend.forecast[0].month, "2024-04");
    assert_eq!(trend.trends.income, Trend::Stable);
    assert_eq!(trend.trends.expense, Trend::Increasing);
}

#[test]
fn test_budget_advice_targets_shopping() {
    let db = imported_db();
    let config = AnalyticsConfig::default();
    let service = AnalyticsService::new(&db, &config);

    let advice = service.budget_suggestions("alice", as_of(), None).ready().unwrap();
    assert_eq!(advice.summary.monthly_income, 3000.0);

    let first = &advice.suggestions[0];
    assert_eq!(first.category_name, "Shopping");
    assert_eq!(first.recommendation, Recommendation::Reduce);
    assert_eq!(first.priority, 1);
}

#[test]
fn test_health_patterns_and_summary() {
    let db = imported_db();
    let config = AnalyticsConfig::default();
    let service = AnalyticsService::new(&db, &config);

    let health = service.health_score("alice", as_of(), None).ready().unwrap();
    assert!(health.total_score <= 100);
    // March spending exceeds income
    assert_eq!(health.breakdown.savings_rate.score, 0.0);
    assert_ne!(health.grade, Grade::A);

    let patterns = service.patterns("alice", as_of()).ready().unwrap();
    assert_eq!(patterns.top_categories[0].name, "Housing");
    assert_eq!(patterns.insights.len(), 3);

    let summary = service.summary("alice", as_of(), Period::Month).ready().unwrap();
    assert_eq!(summary.total_income, 3000.0);
    assert_eq!(summary.top_expense_categories[0].name, "Shopping");

    let savings = service.savings("alice", as_of()).ready().unwrap();
    assert!(savings.summary.recommendation_count >= 1);
}

#[test]
fn test_users_do_not_see_each_other() {
    let db = imported_db();
    let config = AnalyticsConfig::default();
    let service = AnalyticsService::new(&db, &config);

    assert!(service.anomalies("bob", as_of()).message().is_some());
    assert!(service.predict_next_month("bob", as_of()).message().is_some());
}
