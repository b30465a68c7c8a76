//! Analysis commands
//!
//! Runs one analytics engine through `AnalyticsService` and renders the
//! result for the terminal, or as the same JSON the web API returns.

use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use spendwise_core::analytics::forecast::CategoryPrediction;
use spendwise_core::analytics::health::ScoreComponent;
use spendwise_core::analytics::{
    AnomalyReport, BudgetAdvice, Grade, HealthScore, NextMonthPrediction, Recommendation,
    SavingsPlan, Severity, SpendingPatterns, SpendingSummary, Trend, TrendForecast,
};
use spendwise_core::{db::Database, AnalyticsConfig, AnalyticsService, Outcome, Period};
use tracing::debug;

use super::{parse_date_arg, truncate};
use crate::cli::AnalyzeKind;

pub fn cmd_analyze(
    db: &Database,
    config: &AnalyticsConfig,
    user: &str,
    kind: &AnalyzeKind,
    as_of: Option<&str>,
    json: bool,
) -> Result<()> {
    let as_of = parse_date_arg(as_of)?;
    let service = AnalyticsService::new(db, config);
    debug!(kind = kind.name(), %as_of, user, "Running analysis");

    match kind {
        AnalyzeKind::Anomalies => report(service.anomalies(user, as_of), json, print_anomalies),
        AnalyzeKind::Health { income } => {
            check_income(*income)?;
            report(service.health_score(user, as_of, *income), json, print_health)
        }
        AnalyzeKind::Forecast { months } => {
            report(service.forecast(user, as_of, *months), json, print_forecast)
        }
        AnalyzeKind::Predict { by_category: false } => {
            report(service.predict_next_month(user, as_of), json, print_prediction)
        }
        AnalyzeKind::Predict { by_category: true } => report(
            service.predict_by_category(user, as_of),
            json,
            |predictions| print_category_predictions(predictions),
        ),
        AnalyzeKind::Budget { income } => {
            check_income(*income)?;
            report(
                service.budget_suggestions(user, as_of, *income),
                json,
                print_budget_advice,
            )
        }
        AnalyzeKind::Patterns => report(service.patterns(user, as_of), json, print_patterns),
        AnalyzeKind::Savings => report(service.savings(user, as_of), json, print_savings),
        AnalyzeKind::Summary { period } => {
            let period: Period = period.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            report(service.summary(user, as_of, period), json, print_summary)
        }
    }
}

fn check_income(income: Option<f64>) -> Result<()> {
    match income {
        Some(v) if !v.is_finite() || v < 0.0 => {
            anyhow::bail!("Income must be a non-negative number, got {}", v)
        }
        _ => Ok(()),
    }
}

/// Print a ready result (or the reason there is none); failures become errors
fn report<T: Serialize>(outcome: Outcome<T>, json: bool, render: impl FnOnce(&T)) -> Result<()> {
    match outcome {
        Outcome::Ready(value) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                render(&value);
            }
            Ok(())
        }
        Outcome::InsufficientData { message } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&json!({ "message": message }))?);
            } else {
                println!("ℹ️  {}", message);
            }
            Ok(())
        }
        Outcome::Failure { cause } => anyhow::bail!("Analysis failed: {}", cause),
    }
}

fn severity_badge(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "\x1b[31mHIGH\x1b[0m",
        Severity::Medium => "\x1b[33mMED \x1b[0m",
        Severity::Low => "LOW ",
    }
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Increasing => "📈 increasing",
        Trend::Decreasing => "📉 decreasing",
        Trend::Stable => "➡️  stable",
    }
}

fn print_anomalies(report: &AnomalyReport) {
    let stats = &report.statistics;

    println!();
    println!("🔍 Anomaly Detection");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Checked {} transactions, {} unusual ({} high, {} medium, {} low)",
        stats.total_transactions,
        stats.anomaly_count,
        stats.high_severity,
        stats.medium_severity,
        stats.low_severity
    );

    if report.anomalies.is_empty() {
        println!();
        println!("✅ Nothing unusual. Your spending looks consistent!");
        return;
    }

    println!();
    for finding in &report.anomalies {
        let tx = &finding.transaction;
        println!(
            "   {} │ {} │ {:>10.2} │ z={:>5.2} │ {}",
            severity_badge(finding.severity),
            tx.date,
            tx.amount,
            finding.z_score,
            truncate(&finding.description, 50)
        );
    }
}

fn print_component(component: &ScoreComponent) {
    let value = component
        .value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "   {:<22} {:>5.1} / {:.0}   ({})",
        component.label, component.score, component.max_score, value
    );
}

fn print_health(score: &HealthScore) {
    let grade = match score.grade {
        Grade::A => "\x1b[32mA\x1b[0m",
        Grade::B => "\x1b[32mB\x1b[0m",
        Grade::C => "\x1b[33mC\x1b[0m",
        Grade::D => "\x1b[31mD\x1b[0m",
    };

    println!();
    println!("❤️  Financial Health: {}/100 (grade {})", score.total_score, grade);
    println!("   {}", score.feedback);
    println!("   ─────────────────────────────────────────────");
    print_component(&score.breakdown.savings_rate);
    print_component(&score.breakdown.budget_compliance);
    print_component(&score.breakdown.spending_stability);
    print_component(&score.breakdown.diversification);

    println!();
    println!(
        "   Income {:.2} │ Expense {:.2} │ Savings {:.2} │ {} transactions",
        score.summary.income,
        score.summary.expense,
        score.summary.savings,
        score.summary.transaction_count
    );

    if !score.improvements.is_empty() {
        println!();
        println!("💡 Ways to improve:");
        for tip in &score.improvements {
            println!("   • {}", tip);
        }
    }
}

fn print_forecast(forecast: &TrendForecast) {
    println!();
    println!("🔮 Forecast");
    println!("   ─────────────────────────────────────────────");
    println!(
        "   Income:  {} ({:+.2}/month)",
        trend_label(forecast.trends.income),
        forecast.trends.income_change
    );
    println!(
        "   Expense: {} ({:+.2}/month)",
        trend_label(forecast.trends.expense),
        forecast.trends.expense_change
    );
    println!();
    println!("   {:<8} {:>12} {:>12} {:>12}", "Month", "Income", "Expense", "Savings");
    for point in &forecast.forecast {
        println!(
            "   {:<8} {:>12.2} {:>12.2} {:>12.2}",
            point.month, point.predicted_income, point.predicted_expense, point.predicted_savings
        );
    }
}

fn print_prediction(prediction: &NextMonthPrediction) {
    println!();
    println!(
        "🔮 Predicted spending for {}-{:02}: {:.2} ({}% confidence)",
        prediction.year, prediction.month, prediction.prediction, prediction.confidence
    );
    println!("   ─────────────────────────────────────────────");
    for point in &prediction.historical_data {
        println!("   {:<8} {:>12.2}", point.month, point.amount);
    }
}

fn print_category_predictions(predictions: &[CategoryPrediction]) {
    if predictions.is_empty() {
        println!("ℹ️  No category has enough history for a prediction yet");
        return;
    }

    println!();
    println!("🔮 Next Month by Category");
    println!("   ─────────────────────────────────────────────");
    for p in predictions {
        println!(
            "   {:<20} {:>10.2}  ({}% confidence)",
            truncate(&p.name, 20),
            p.prediction,
            p.confidence
        );
    }
}

fn print_budget_advice(advice: &BudgetAdvice) {
    let summary = &advice.summary;

    println!();
    println!(
        "📋 Budget Suggestions ({} rule, income {:.2})",
        summary.budget_rule, summary.monthly_income
    );
    println!(
        "   Essentials {:.2} │ Wants {:.2} │ Savings {:.2}",
        summary.essentials, summary.wants, summary.savings
    );
    println!("   ─────────────────────────────────────────────────────────────");

    for s in &advice.suggestions {
        let action = match s.recommendation {
            Recommendation::Reduce => "\x1b[31mreduce\x1b[0m  ",
            Recommendation::Increase => "\x1b[33mincrease\x1b[0m",
            Recommendation::Maintain => "\x1b[32mmaintain\x1b[0m",
        };
        println!(
            "   {:<18} {:>10.2} → {:>10.2}  {}",
            truncate(&s.category_name, 18),
            s.current_monthly_avg,
            s.suggested_budget,
            action
        );
    }

    if summary.total_potential_savings > 0.0 {
        println!();
        println!(
            "💡 Following these budgets could save {:.2} per month",
            summary.total_potential_savings
        );
    }
}

fn print_patterns(patterns: &SpendingPatterns) {
    println!();
    println!("📅 Spending Patterns");
    println!("   ─────────────────────────────────────────────");
    for day in &patterns.by_day_of_week {
        println!("   {:<10} {:>10.2}  ({} transactions)", day.day, day.total, day.count);
    }

    println!();
    for (i, total) in patterns.by_week_of_month.iter().enumerate() {
        println!("   Week {}     {:>10.2}", i + 1, total);
    }

    if !patterns.top_categories.is_empty() {
        println!();
        println!("   Top categories:");
        for cat in &patterns.top_categories {
            println!(
                "   {:<18} {:>10.2}  (avg {:.2})",
                truncate(&cat.name, 18),
                cat.total,
                cat.avg_per_transaction
            );
        }
    }

    for insight in &patterns.insights {
        println!("💡 {}", insight);
    }
}

fn print_savings(plan: &SavingsPlan) {
    if plan.recommendations.is_empty() {
        println!("✅ No category stands out. Your spending is well spread.");
        return;
    }

    println!();
    println!("💰 Savings Opportunities");
    println!("   ─────────────────────────────────────────────────────────────");
    for rec in &plan.recommendations {
        let name = rec
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Unknown");
        println!(
            "   [{}] {:<18} {:>5.1}% of spending, cut {}% → {:.2}/year",
            rec.priority,
            truncate(name, 18),
            rec.percent_of_total,
            rec.suggested_reduction,
            rec.potential_yearly_savings
        );
        println!("       {}", rec.tip);
    }

    println!();
    println!(
        "   Total potential savings: {:.2} per year",
        plan.summary.total_potential_yearly_savings
    );
}

fn print_summary(summary: &SpendingSummary) {
    println!();
    println!("📊 Summary for the last {}", summary.period);
    println!("   ─────────────────────────────────────────────");
    println!("   Income:       {:>12.2}", summary.total_income);
    println!("   Expense:      {:>12.2}", summary.total_expense);
    println!("   Savings:      {:>12.2}", summary.savings);
    println!("   Savings rate: {:>11.1}%", summary.savings_rate);
    println!("   Transactions: {:>12}", summary.transaction_count);

    if !summary.top_expense_categories.is_empty() {
        println!();
        println!("   Top expenses:");
        for cat in &summary.top_expense_categories {
            println!("   {:<18} {:>10.2}", truncate(&cat.name, 18), cat.amount);
        }
    }
}
