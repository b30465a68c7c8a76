//! Smart analysis handlers: period analysis, patterns, budget advice, forecast

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::analytics::AnalyticsQuery;
use super::reports::resolve_as_of;
use crate::{outcome_response, AppError, AppState, CurrentUser};
use spendwise_core::analytics::SpendingSummary;
use spendwise_core::{AnalyticsService, Outcome, Period};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAnalysisQuery {
    /// week, month (default) or quarter
    pub period: Option<String>,
    pub as_of: Option<String>,
}

/// Period summary plus optional LLM commentary
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartAnalysis {
    #[serde(flatten)]
    pub summary: SpendingSummary,
    pub ai_analysis: Option<String>,
}

/// GET /api/smart/analysis - Income/expense summary for a recent period
pub async fn smart_analysis(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<SmartAnalysisQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let period: Period = params
        .period
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: String| AppError::bad_request(&e))?
        .unwrap_or_default();

    let summary = AnalyticsService::new(&state.db, &state.analytics).summary(&user, as_of, period);
    let outcome = match summary {
        Outcome::Ready(summary) => {
            let ai_analysis = match &state.assistant {
                Some(assistant) => assistant.commentary(&summary).await,
                None => None,
            };
            Outcome::Ready(SmartAnalysis {
                summary,
                ai_analysis,
            })
        }
        Outcome::InsufficientData { message } => Outcome::InsufficientData { message },
        Outcome::Failure { cause } => Outcome::Failure { cause },
    };
    outcome_response(outcome, json!({ "topExpenseCategories": [] }))
}

/// GET /api/smart/patterns - Day-of-week and week-of-month spending patterns
pub async fn spending_patterns(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let outcome = AnalyticsService::new(&state.db, &state.analytics).patterns(&user, as_of);
    outcome_response(
        outcome,
        json!({
            "byDayOfWeek": [],
            "byWeekOfMonth": [],
            "topCategories": [],
            "insights": []
        }),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSuggestionsQuery {
    pub as_of: Option<String>,
    /// Income to plan against instead of the recorded average
    pub monthly_income: Option<f64>,
}

/// GET /api/smart/budget-suggestions - Benchmark-based budget advice
pub async fn budget_suggestions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<BudgetSuggestionsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    if params
        .monthly_income
        .is_some_and(|i| !i.is_finite() || i < 0.0)
    {
        return Err(AppError::bad_request(
            "Monthly income must be a non-negative number",
        ));
    }

    let outcome = AnalyticsService::new(&state.db, &state.analytics).budget_suggestions(
        &user,
        as_of,
        params.monthly_income,
    );
    outcome_response(outcome, json!({ "suggestions": [] }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastQuery {
    /// Months to project (clamped to the configured maximum)
    pub months: Option<u32>,
    pub as_of: Option<String>,
}

/// GET /api/smart/forecast - Income/expense trend projection
pub async fn financial_forecast(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let outcome =
        AnalyticsService::new(&state.db, &state.analytics).forecast(&user, as_of, params.months);
    outcome_response(outcome, json!({ "historical": [], "forecast": [] }))
}
