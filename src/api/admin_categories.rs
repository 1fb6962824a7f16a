use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::services::catalog_service::{CategoryNode, CreateCategory, UpdateCategory};

use super::{ApiError, AppState};

/// GET /admin/categories
pub async fn category_tree(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryNode>>, ApiError> {
    let tree = state.catalog_service().category_tree().await?;
    Ok(Json(tree))
}

/// GET /admin/categories/by-slug/{slug}
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryNode>, ApiError> {
    let category = state.catalog_service().category_by_slug(&slug).await?;
    Ok(Json(category))
}

/// POST /admin/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCategory>,
) -> Result<(StatusCode, Json<CategoryNode>), ApiError> {
    let category = state.catalog_service().create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /admin/categories/{id}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategory>,
) -> Result<Json<CategoryNode>, ApiError> {
    let category = state.catalog_service().update_category(id, payload).await?;
    Ok(Json(category))
}

/// DELETE /admin/categories/{id} (soft delete)
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.catalog_service().delete_category(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
