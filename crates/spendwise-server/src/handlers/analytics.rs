//! Analytics handlers: anomalies, health score, savings and LLM insights

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::reports::resolve_as_of;
use crate::{outcome_response, AppError, AppState, CurrentUser};
use spendwise_core::{AnalyticsService, Outcome, Period};

/// Reference date shared by the analytics endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// Analyze as if today were this date (YYYY-MM-DD)
    pub as_of: Option<String>,
}

/// GET /api/analytics/anomalies - Z-score outliers over the trailing window
pub async fn detect_anomalies(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let outcome = AnalyticsService::new(&state.db, &state.analytics).anomalies(&user, as_of);
    outcome_response(outcome, json!({ "anomalies": [] }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreQuery {
    pub as_of: Option<String>,
    /// Monthly income to score against instead of recorded income
    pub income: Option<f64>,
}

/// GET /api/analytics/health-score - 0-100 composite score
pub async fn health_score(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<HealthScoreQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    if params.income.is_some_and(|i| !i.is_finite() || i < 0.0) {
        return Err(AppError::bad_request("Income must be a non-negative number"));
    }

    let outcome = AnalyticsService::new(&state.db, &state.analytics).health_score(
        &user,
        as_of,
        params.income,
    );
    outcome_response(outcome, json!({ "improvements": [] }))
}

/// GET /api/analytics/savings - Per-category reduction targets
pub async fn savings_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let outcome = AnalyticsService::new(&state.db, &state.analytics).savings(&user, as_of);
    outcome_response(outcome, json!({ "recommendations": [] }))
}

/// GET /api/analytics/insights - LLM narrative over last month's summary
pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let assistant = state
        .assistant
        .as_ref()
        .ok_or_else(|| AppError::unavailable("AI assistant is not configured"))?;

    let summary = AnalyticsService::new(&state.db, &state.analytics).summary(
        &user,
        as_of,
        Period::Month,
    );
    let outcome = match summary {
        Outcome::Ready(summary) => {
            Outcome::Ready(assistant.insights(&summary).await.map_err(AppError::from_ai)?)
        }
        Outcome::InsufficientData { message } => Outcome::InsufficientData { message },
        Outcome::Failure { cause } => Outcome::Failure { cause },
    };
    outcome_response(outcome, json!({ "insights": [] }))
}
