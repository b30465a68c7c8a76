//! Category handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::transactions::DeleteResult;
use crate::{AppError, AppState, CurrentUser, Envelope};
use spendwise_core::models::{Category, CategoryUpdate, NewCategory, TransactionType};

#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// income or expense
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

/// GET /api/categories - List categories, seeding the defaults for new users
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ListCategoriesQuery>,
) -> Result<Json<Envelope<Vec<Category>>>, AppError> {
    let category_type = params
        .category_type
        .as_deref()
        .map(str::parse::<TransactionType>)
        .transpose()
        .map_err(|e| AppError::bad_request(&e))?;

    let mut categories = state.db.list_categories(&user, category_type)?;
    if categories.is_empty() && state.db.seed_default_categories(&user)? > 0 {
        categories = state.db.list_categories(&user, category_type)?;
    }
    Ok(Envelope::ok(categories))
}

/// POST /api/categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<NewCategory>,
) -> Result<Json<Envelope<Category>>, AppError> {
    let id = state
        .db
        .create_category(&user, &body)
        .map_err(AppError::from_core)?;
    let category = state
        .db
        .get_category(&user, id)?
        .ok_or_else(|| AppError::internal("Category vanished after insert"))?;
    Ok(Envelope::ok(category))
}

/// PUT /api/categories/:id - Rename or restyle a category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryUpdate>,
) -> Result<Json<Envelope<Category>>, AppError> {
    let category = state
        .db
        .update_category(&user, id, &body)
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::not_found("Category not found"))?;
    Ok(Envelope::ok(category))
}

/// DELETE /api/categories/:id - Delete an unused category
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<DeleteResult>>, AppError> {
    if !state
        .db
        .delete_category(&user, id)
        .map_err(AppError::from_core)?
    {
        return Err(AppError::not_found("Category not found"));
    }
    info!(user = %user, id, "Category deleted");
    Ok(Envelope::ok(DeleteResult { deleted: true }))
}

#[derive(Serialize)]
pub struct SeedResult {
    pub created: usize,
}

/// POST /api/categories/init-defaults - Create any missing default categories
pub async fn init_default_categories(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Envelope<SeedResult>>, AppError> {
    let created = state.db.seed_default_categories(&user)?;
    Ok(Envelope::ok(SeedResult { created }))
}
