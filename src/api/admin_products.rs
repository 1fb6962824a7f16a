use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::services::catalog_service::{
    CreateProduct, Page, ProductDto, ProductQuery, UpdateProduct,
};

use super::{ApiError, AppState};

/// GET /admin/products. Includes inactive rows, still excludes soft-deleted.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<ProductDto>>, ApiError> {
    let page = state.catalog_service().list_products(query, true).await?;
    Ok(Json(page))
}

/// GET /admin/products/{id}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state.catalog_service().product_by_id(id).await?;
    Ok(Json(product))
}

/// GET /admin/products/by-slug/{slug}
pub async fn get_product_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state
        .catalog_service()
        .product_by_slug(&slug, false)
        .await?;
    Ok(Json(product))
}

/// POST /admin/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProduct>,
) -> Result<(StatusCode, Json<ProductDto>), ApiError> {
    let product = state.catalog_service().create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /admin/products/{id}
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProduct>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state.catalog_service().update_product(id, payload).await?;
    Ok(Json(product))
}

/// DELETE /admin/products/{id} (soft delete)
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.catalog_service().delete_product(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
