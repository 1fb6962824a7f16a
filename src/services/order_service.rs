//! Domain service for order intake and admin order management.
//!
//! The one operation with real transactional weight lives here: order
//! creation snapshots every line's unit price from the current catalog and
//! writes the order plus its items atomically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog_service::Page;

/// Errors specific to order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for OrderError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Order lifecycle states. New orders always start as `Pending`; admins move
/// them along (no transition guard, any state can be set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(format!("Unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: i32,
    pub quantity: i32,
    #[serde(default)]
    pub specs: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrder {
    pub customer_email: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemProduct {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    /// Frozen price snapshot, serialized as an exact decimal string.
    pub unit_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<String>,
    pub product: Option<OrderItemProduct>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    pub customer_email: String,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub items: Vec<OrderItemDto>,
    pub created_at: String,
    pub updated_at: String,
}

/// Domain service trait for orders.
#[async_trait::async_trait]
pub trait OrderService: Send + Sync {
    /// Validates the request against the current catalog, snapshots unit
    /// prices and persists the order with its items in one transaction.
    ///
    /// # Errors
    ///
    /// [`OrderError::Validation`] when the item list is empty or any
    /// referenced product does not resolve to a non-deleted row.
    async fn create(
        &self,
        input: CreateOrder,
        user_id: Option<i32>,
    ) -> Result<OrderDto, OrderError>;

    /// Admin listing: newest first, optionally filtered by status.
    async fn list(
        &self,
        page: u64,
        limit: u64,
        status: Option<OrderStatus>,
    ) -> Result<Page<OrderDto>, OrderError>;

    async fn get(&self, id: i32) -> Result<OrderDto, OrderError>;

    /// Overwrites the status unconditionally (no transition guard).
    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<OrderDto, OrderError>;
}
