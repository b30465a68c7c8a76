//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::reports::parse_date;
use crate::{AppError, AppState, CurrentUser, Envelope, MAX_PAGE_LIMIT};
use spendwise_core::models::{NewTransaction, Transaction, TransactionQuery, TransactionType};
use spendwise_core::TransactionInsertResult;

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Custom start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// Custom end date (YYYY-MM-DD)
    pub to: Option<String>,
    /// income or expense
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category_id: Option<i64>,
}

fn default_limit() -> i64 {
    50
}

#[derive(Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/transactions - List transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListTransactionsQuery>,
) -> Result<Json<Envelope<TransactionPage>>, AppError> {
    // Input validation: clamp pagination parameters
    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.max(0);

    let transaction_type = params
        .transaction_type
        .as_deref()
        .map(str::parse::<TransactionType>)
        .transpose()
        .map_err(|e| AppError::bad_request(&e))?;

    let query = TransactionQuery {
        from: parse_date(params.from.as_deref(), "from")?,
        to: parse_date(params.to.as_deref(), "to")?,
        transaction_type,
        category_id: params.category_id,
        limit: Some(limit),
        offset: Some(offset),
    };
    let transactions = state.db.list_transactions(&user, &query)?;

    Ok(Envelope::ok(TransactionPage {
        transactions,
        limit,
        offset,
    }))
}

/// GET /api/transactions/:id - Get a single transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<Transaction>>, AppError> {
    let tx = state
        .db
        .get_transaction(&user, id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Envelope::ok(tx))
}

/// POST /api/transactions - Record a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<NewTransaction>,
) -> Result<Json<Envelope<Transaction>>, AppError> {
    let id = match state
        .db
        .insert_transaction(&user, &body)
        .map_err(AppError::from_core)?
    {
        TransactionInsertResult::Inserted(id) | TransactionInsertResult::Duplicate(id) => id,
    };

    info!(user = %user, id, amount = body.amount, "Transaction created");

    let tx = state
        .db
        .get_transaction(&user, id)?
        .ok_or_else(|| AppError::internal("Transaction vanished after insert"))?;
    Ok(Envelope::ok(tx))
}

/// PUT /api/transactions/:id - Replace a transaction's fields
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<NewTransaction>,
) -> Result<Json<Envelope<Transaction>>, AppError> {
    if !state
        .db
        .update_transaction(&user, id, &body)
        .map_err(AppError::from_core)?
    {
        return Err(AppError::not_found("Transaction not found"));
    }

    info!(user = %user, id, amount = body.amount, "Transaction updated");

    let tx = state
        .db
        .get_transaction(&user, id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Envelope::ok(tx))
}

#[derive(Serialize)]
pub struct DeleteResult {
    pub deleted: bool,
}

/// DELETE /api/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<DeleteResult>>, AppError> {
    if !state.db.delete_transaction(&user, id)? {
        return Err(AppError::not_found("Transaction not found"));
    }
    info!(user = %user, id, "Transaction deleted");
    Ok(Envelope::ok(DeleteResult { deleted: true }))
}
