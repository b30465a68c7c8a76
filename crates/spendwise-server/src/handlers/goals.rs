//! Savings goal handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::analytics::AnalyticsQuery;
use super::reports::resolve_as_of;
use super::transactions::DeleteResult;
use crate::{outcome_response, AppError, AppState, CurrentUser, Envelope};
use spendwise_core::models::{Goal, GoalContribution, GoalUpdate, NewGoal};
use spendwise_core::AnalyticsService;

/// GET /api/goals - Goals with progress, days remaining and pace
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    let as_of = resolve_as_of(params.as_of.as_deref())?;
    let outcome = AnalyticsService::new(&state.db, &state.analytics).goals(&user, as_of);
    outcome_response(outcome, json!({ "goals": [] }))
}

/// POST /api/goals - Create a goal
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<NewGoal>,
) -> Result<Json<Envelope<Goal>>, AppError> {
    let id = state
        .db
        .create_goal(&user, &body)
        .map_err(AppError::from_core)?;
    info!(user = %user, id, target = body.target_amount, "Goal created");

    let goal = state
        .db
        .get_goal(&user, id)?
        .ok_or_else(|| AppError::internal("Goal vanished after insert"))?;
    Ok(Envelope::ok(goal))
}

/// PUT /api/goals/:id - Edit a goal
pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<GoalUpdate>,
) -> Result<Json<Envelope<Goal>>, AppError> {
    let goal = state
        .db
        .update_goal(&user, id, &body)
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::not_found("Goal not found"))?;
    Ok(Envelope::ok(goal))
}

/// DELETE /api/goals/:id - Delete a goal and its contributions
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<DeleteResult>>, AppError> {
    if !state.db.delete_goal(&user, id)? {
        return Err(AppError::not_found("Goal not found"));
    }
    info!(user = %user, id, "Goal deleted");
    Ok(Envelope::ok(DeleteResult { deleted: true }))
}

#[derive(Debug, Deserialize)]
pub struct ContributeRequest {
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
}

/// POST /api/goals/:id/contribute - Put money towards a goal
pub async fn contribute_to_goal(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<ContributeRequest>,
) -> Result<Json<Envelope<GoalContribution>>, AppError> {
    let contribution = state
        .db
        .contribute_to_goal(&user, id, body.amount, body.note.as_deref())
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::not_found("Goal not found"))?;
    Ok(Envelope::ok(contribution))
}

/// GET /api/goals/:id/contributions - Contribution history, newest first
pub async fn list_goal_contributions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<Vec<GoalContribution>>>, AppError> {
    if state.db.get_goal(&user, id)?.is_none() {
        return Err(AppError::not_found("Goal not found"));
    }
    Ok(Envelope::ok(state.db.list_goal_contributions(&user, id)?))
}
