//! Regression-based spending predictions

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::analytics::AnalyticsQuery;
use super::reports::resolve_as_of;
use crate::{outcome_response, AppError, AppState, CurrentUser};
use spendwise_core::analytics::forecast::CategoryPrediction;
use spendwise_core::AnalyticsService;

#[derive(Serialize)]
pub struct CategoryPredictions {
    pub predictions: Vec<CategoryPrediction>,
}

/// GET /api/predictions/next-month - Next month's total spending
pub async fn predict_next_month(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let outcome =
        AnalyticsService::new(&state.db, &state.analytics).predict_next_month(&user, as_of);
    outcome_response(outcome, json!({ "historicalData": [] }))
}

/// GET /api/predictions/by-category - Next month's spending per category
pub async fn predict_by_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let outcome = AnalyticsService::new(&state.db, &state.analytics)
        .predict_by_category(&user, as_of)
        .map(|predictions| CategoryPredictions { predictions });
    outcome_response(outcome, json!({ "predictions": [] }))
}
