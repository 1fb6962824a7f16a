//! Domain service for the product catalog and the category tree.
//!
//! Covers public listings (active, non-deleted rows only), the admin
//! variants that also see inactive rows, related-product lookups, and the
//! admin CRUD surface. Soft-deleted rows never leave the repository layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Sort keys accepted by the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    Name,
    Price,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Query parameters for product listings. Defaults match the public API:
/// page 1, 12 items, sorted by name ascending.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub page: u64,
    pub limit: u64,
    pub sort: Option<ProductSort>,
    pub order: Option<SortDirection>,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 12,
            sort: None,
            order: None,
            search: None,
            category: None,
        }
    }
}

/// Pagination envelope shared by product and order listings.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PageMeta {
    #[must_use]
    pub const fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageDto {
    pub id: i32,
    pub url: String,
    pub alt: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specs: Option<serde_json::Value>,
    /// Exact decimal string, never a float.
    pub price: String,
    pub stock: i32,
    pub is_active: bool,
    pub is_quote_only: bool,
    pub category: Option<CategorySummary>,
    pub images: Vec<ProductImageDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<CategorySummary>,
    pub children: Vec<CategoryNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImageInput {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub specs: Option<serde_json::Value>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_quote_only: Option<bool>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ProductImageInput>>,
}

/// Partial update; `images`, when present, replaces the whole image set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specs: Option<serde_json::Value>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_quote_only: Option<bool>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ProductImageInput>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

/// Domain service trait for the catalog.
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Paginated, filtered, sorted listing. Public mode only sees active
    /// rows; admin mode also sees inactive ones.
    async fn list_products(
        &self,
        query: ProductQuery,
        for_admin: bool,
    ) -> Result<Page<ProductDto>, CatalogError>;

    /// Admin lookup by id.
    async fn product_by_id(&self, id: i32) -> Result<ProductDto, CatalogError>;

    /// Slug lookup. The public path additionally requires `is_active`.
    async fn product_by_slug(&self, slug: &str, public: bool) -> Result<ProductDto, CatalogError>;

    /// Up to `limit` other active products, same category preferred,
    /// newest-first fallback when the product has no category.
    async fn related_products(
        &self,
        slug: &str,
        limit: u64,
    ) -> Result<Vec<ProductDto>, CatalogError>;

    async fn create_product(&self, input: CreateProduct) -> Result<ProductDto, CatalogError>;

    async fn update_product(
        &self,
        id: i32,
        input: UpdateProduct,
    ) -> Result<ProductDto, CatalogError>;

    /// Soft delete: sets `deleted_at`, the row stays in the table.
    async fn delete_product(&self, id: i32) -> Result<(), CatalogError>;

    /// Non-deleted roots with two levels of children, ordered by sort_order.
    async fn category_tree(&self) -> Result<Vec<CategoryNode>, CatalogError>;

    async fn category_by_slug(&self, slug: &str) -> Result<CategoryNode, CatalogError>;

    async fn create_category(&self, input: CreateCategory) -> Result<CategoryNode, CatalogError>;

    async fn update_category(
        &self,
        id: i32,
        input: UpdateCategory,
    ) -> Result<CategoryNode, CatalogError>;

    async fn delete_category(&self, id: i32) -> Result<(), CatalogError>;
}
