use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::services::CatalogError;
use crate::services::catalog_service::{Page, ProductDto, ProductQuery};

use super::{ApiError, AppState};

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ProductNotFound => Self::not_found("Product"),
            CatalogError::CategoryNotFound => Self::not_found("Category"),
            CatalogError::Validation(msg) => Self::ValidationError(vec![msg]),
            CatalogError::Conflict(msg) => Self::Conflict(msg),
            CatalogError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    #[serde(default)]
    pub limit: Option<u64>,
}

const DEFAULT_RELATED_LIMIT: u64 = 4;

/// GET /products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<ProductDto>>, ApiError> {
    let page = state.catalog_service().list_products(query, false).await?;
    Ok(Json(page))
}

/// GET /products/{slug}
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDto>, ApiError> {
    let product = state.catalog_service().product_by_slug(&slug, true).await?;
    Ok(Json(product))
}

/// GET /products/{slug}/related
pub async fn related_products(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> Result<Json<Vec<ProductDto>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_RELATED_LIMIT);
    let related = state.catalog_service().related_products(&slug, limit).await?;
    Ok(Json(related))
}
