//! Domain service for the admin dashboard aggregation.
//!
//! Everything is computed in memory from a handful of bulk reads; money
//! arithmetic runs on `Decimal` at full precision and is rounded to two
//! decimals only when the payload is assembled.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors specific to dashboard aggregation.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for StatsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub total_revenue: Decimal,
    pub total_orders: u64,
    pub active_products: u64,
    pub new_customers: u64,
    pub conversion_rate: Decimal,
    pub average_order_value: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SalesPoint {
    pub date: String,
    pub total: Decimal,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: i32,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct LowStockProduct {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id: i32,
    pub status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: String,
    pub item_count: usize,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAlerts {
    pub pending_orders: u64,
    pub low_stock_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub kpis: DashboardKpis,
    pub sales_evolution: Vec<SalesPoint>,
    pub top_products: Vec<TopProduct>,
    pub low_stock_products: Vec<LowStockProduct>,
    pub recent_orders: Vec<RecentOrder>,
    pub alerts: DashboardAlerts,
}

/// Domain service trait for admin statistics.
#[async_trait::async_trait]
pub trait StatsService: Send + Sync {
    /// Computes the dashboard over a trailing window of `days` calendar
    /// days. Callers pass a value already clamped to the supported range.
    async fn dashboard(&self, days: i64) -> Result<Dashboard, StatsError>;
}
