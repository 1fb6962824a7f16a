use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use crate::services::OrderError;
use crate::services::order_service::{CreateOrder, OrderDto};

use super::{ApiError, AppState};

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound => Self::not_found("Order"),
            // The service joins its findings into one comma-separated
            // message; split back so the body carries one entry per problem.
            OrderError::Validation(msg) => {
                Self::ValidationError(msg.split(", ").map(ToString::to_string).collect())
            }
            OrderError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

/// POST /orders
///
/// Public order intake: no account required, the optional user binding only
/// happens on authenticated storefront sessions (not wired here).
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrder>,
) -> Result<(StatusCode, Json<OrderDto>), ApiError> {
    let order = state.order_service().create(payload, None).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
