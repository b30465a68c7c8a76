//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::{AppError, AppState, CurrentUser, Envelope};
use spendwise_core::models::{
    BudgetStatus, CategoryTotal, MonthlyTrendPoint, ReportSummary, TransactionType,
};

/// Parse an optional YYYY-MM-DD query parameter
pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    value
        .filter(|s| !s.is_empty())
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AppError::bad_request(&format!("Invalid {} date format (use YYYY-MM-DD)", field)))
}

/// Reference date for an analysis: `asOf` when given, otherwise today
pub fn resolve_as_of(as_of: Option<&str>) -> Result<NaiveDate, AppError> {
    Ok(parse_date(as_of, "asOf")?.unwrap_or_else(|| Utc::now().date_naive()))
}

/// Month and year from query params, defaulting to the current month
pub fn resolve_month(month: Option<u32>, year: Option<i32>) -> Result<(u32, i32), AppError> {
    let today = Utc::now().date_naive();
    let month = month.unwrap_or(today.month());
    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request("Month must be between 1 and 12"));
    }
    Ok((month, year.unwrap_or(today.year())))
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// GET /api/reports/summary - Income, expense and balance
pub async fn report_summary(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<DateRangeQuery>,
) -> Result<Json<Envelope<ReportSummary>>, AppError> {
    let from = parse_date(params.from.as_deref(), "from")?;
    let to = parse_date(params.to.as_deref(), "to")?;

    let summary = state.db.get_report_summary(&user, from, to)?;
    Ok(Envelope::ok(summary))
}

#[derive(Debug, Deserialize)]
pub struct ByCategoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    /// income or expense (default expense)
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
}

/// GET /api/reports/by-category - Totals per category
pub async fn report_by_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ByCategoryQuery>,
) -> Result<Json<Envelope<Vec<CategoryTotal>>>, AppError> {
    let from = parse_date(params.from.as_deref(), "from")?;
    let to = parse_date(params.to.as_deref(), "to")?;
    let transaction_type: TransactionType = params
        .transaction_type
        .as_deref()
        .unwrap_or("expense")
        .parse()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let totals = state
        .db
        .get_totals_by_category(&user, transaction_type, from, to)?;
    Ok(Envelope::ok(totals))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendQuery {
    /// Number of months (default 6)
    pub months: Option<u32>,
    pub as_of: Option<String>,
}

/// GET /api/reports/monthly-trend - Income/expense per month
pub async fn report_monthly_trend(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<MonthlyTrendQuery>,
) -> Result<Json<Envelope<Vec<MonthlyTrendPoint>>>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let trend = state
        .db
        .get_monthly_trend(&user, params.months.unwrap_or(6), as_of)?;
    Ok(Envelope::ok(trend))
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// GET /api/reports/budget-status - Budgets with spending progress
pub async fn report_budget_status(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Envelope<Vec<BudgetStatus>>>, AppError> {
    let (month, year) = resolve_month(params.month, params.year)?;
    let status = state.db.get_budget_status(&user, month, year)?;
    Ok(Envelope::ok(status))
}
