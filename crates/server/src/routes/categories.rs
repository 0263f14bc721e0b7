//! Public taxonomy route handlers.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::response::ApiResponse;
use crate::state::AppState;

/// All categories with their subcategories and product counts.
#[instrument(skip_all)]
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_subcategories()
        .await?;

    Ok(ApiResponse::data(categories))
}

/// One category (by slug) with subcategories and per-subcategory counts.
#[instrument(skip_all, fields(slug = %slug))]
pub async fn subcategories(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let detail = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_owned()))?;

    Ok(ApiResponse::data(detail))
}
