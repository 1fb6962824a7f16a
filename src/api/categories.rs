use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::services::catalog_service::CategoryNode;

use super::{ApiError, AppState};

/// GET /categories
pub async fn category_tree(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryNode>>, ApiError> {
    let tree = state.catalog_service().category_tree().await?;
    Ok(Json(tree))
}

/// GET /categories/{slug}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryNode>, ApiError> {
    let category = state.catalog_service().category_by_slug(&slug).await?;
    Ok(Json(category))
}
