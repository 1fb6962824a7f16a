use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::services::OrderStatus;
use crate::services::catalog_service::Page;
use crate::services::order_service::OrderDto;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OrderListQuery {
    pub page: u64,
    pub limit: u64,
    pub status: Option<OrderStatus>,
}

impl Default for OrderListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            status: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// GET /admin/orders
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Page<OrderDto>>, ApiError> {
    let page = state
        .order_service()
        .list(query.page, query.limit, query.status)
        .await?;
    Ok(Json(page))
}

/// GET /admin/orders/{id}
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDto>, ApiError> {
    let order = state.order_service().get(id).await?;
    Ok(Json(order))
}

/// PATCH /admin/orders/{id}/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<OrderDto>, ApiError> {
    let order = state
        .order_service()
        .update_status(id, payload.status)
        .await?;
    Ok(Json(order))
}
