//! Budget handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::info;

use super::reports::{resolve_month, MonthQuery};
use super::transactions::DeleteResult;
use crate::{AppError, AppState, CurrentUser, Envelope};
use spendwise_core::models::{Budget, NewBudget};

/// GET /api/budgets - Budgets for a month (default: current)
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Envelope<Vec<Budget>>>, AppError> {
    let (month, year) = resolve_month(params.month, params.year)?;
    let budgets = state.db.list_budgets(&user, month, year)?;
    Ok(Envelope::ok(budgets))
}

/// POST /api/budgets - Create or replace a category's budget for a month
pub async fn upsert_budget(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<NewBudget>,
) -> Result<Json<Envelope<Budget>>, AppError> {
    let id = state
        .db
        .upsert_budget(&user, &body)
        .map_err(AppError::from_core)?;

    info!(
        user = %user,
        category_id = body.category_id,
        month = body.month,
        year = body.year,
        "Budget saved"
    );

    let budget = state
        .db
        .list_budgets(&user, body.month, body.year)?
        .into_iter()
        .find(|b| b.id == id)
        .ok_or_else(|| AppError::internal("Budget vanished after upsert"))?;
    Ok(Envelope::ok(budget))
}

/// DELETE /api/budgets/:id - Delete a budget
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<DeleteResult>>, AppError> {
    if !state.db.delete_budget(&user, id)? {
        return Err(AppError::not_found("Budget not found"));
    }
    Ok(Envelope::ok(DeleteResult { deleted: true }))
}
