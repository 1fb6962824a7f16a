use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{categories, order_items, orders, product_images, products, refresh_tokens, users};
use crate::services::catalog_service::ProductImageInput;

pub mod migrator;
pub mod repositories;

pub use repositories::category::{CategoryPatch, NewCategory};
pub use repositories::order::{NewOrder, NewOrderItem};
pub use repositories::product::{NewProduct, ProductListFilter, ProductPatch};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.contains("memory") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn product_repo(&self) -> repositories::product::ProductRepository {
        repositories::product::ProductRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn order_repo(&self) -> repositories::order::OrderRepository {
        repositories::order::OrderRepository::new(self.conn.clone())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn refresh_token_repo(&self) -> repositories::refresh_token::RefreshTokenRepository {
        repositories::refresh_token::RefreshTokenRepository::new(self.conn.clone())
    }

    // ========== Products ==========

    pub async fn list_products(
        &self,
        filter: &ProductListFilter,
    ) -> Result<(Vec<products::Model>, u64)> {
        self.product_repo().list(filter).await
    }

    pub async fn product_by_id(&self, id: i32) -> Result<Option<products::Model>> {
        self.product_repo().by_id(id).await
    }

    pub async fn product_by_slug(
        &self,
        slug: &str,
        require_active: bool,
    ) -> Result<Option<products::Model>> {
        self.product_repo().by_slug(slug, require_active).await
    }

    pub async fn products_by_ids(&self, ids: &[i32]) -> Result<Vec<products::Model>> {
        self.product_repo().by_ids(ids).await
    }

    pub async fn related_products(
        &self,
        product_id: i32,
        category_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<products::Model>> {
        self.product_repo().related(product_id, category_id, limit).await
    }

    pub async fn categories_by_ids(&self, ids: &[i32]) -> Result<Vec<categories::Model>> {
        self.product_repo().categories_by_ids(ids).await
    }

    pub async fn product_images(&self, product_ids: &[i32]) -> Result<Vec<product_images::Model>> {
        self.product_repo().images_for(product_ids).await
    }

    pub async fn create_product(
        &self,
        new: NewProduct,
        images: Vec<ProductImageInput>,
    ) -> Result<i32> {
        self.product_repo().create(new, images).await
    }

    pub async fn update_product(&self, id: i32, patch: ProductPatch) -> Result<Option<i32>> {
        self.product_repo().update(id, patch).await
    }

    pub async fn soft_delete_product(&self, id: i32) -> Result<bool> {
        self.product_repo().soft_delete(id).await
    }

    pub async fn count_active_products(&self) -> Result<u64> {
        self.product_repo().count_active().await
    }

    pub async fn low_stock_products(
        &self,
        threshold: i32,
        limit: u64,
    ) -> Result<Vec<products::Model>> {
        self.product_repo().low_stock(threshold, limit).await
    }

    // ========== Categories ==========

    pub async fn all_categories(&self) -> Result<Vec<categories::Model>> {
        self.category_repo().all().await
    }

    pub async fn category_by_id(&self, id: i32) -> Result<Option<categories::Model>> {
        self.category_repo().by_id(id).await
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<categories::Model>> {
        self.category_repo().by_slug(slug).await
    }

    pub async fn create_category(&self, new: NewCategory) -> Result<categories::Model> {
        self.category_repo().create(new).await
    }

    pub async fn update_category(
        &self,
        id: i32,
        patch: CategoryPatch,
    ) -> Result<Option<categories::Model>> {
        self.category_repo().update(id, patch).await
    }

    pub async fn soft_delete_category(&self, id: i32) -> Result<bool> {
        self.category_repo().soft_delete(id).await
    }

    // ========== Orders ==========

    pub async fn create_order(&self, new: NewOrder, items: Vec<NewOrderItem>) -> Result<i32> {
        self.order_repo().create_with_items(new, items).await
    }

    pub async fn order_by_id(&self, id: i32) -> Result<Option<orders::Model>> {
        self.order_repo().by_id(id).await
    }

    pub async fn order_page(
        &self,
        page: u64,
        limit: u64,
        status: Option<&str>,
    ) -> Result<(Vec<orders::Model>, u64)> {
        self.order_repo().page(page, limit, status).await
    }

    pub async fn set_order_status(&self, id: i32, status: &str) -> Result<Option<orders::Model>> {
        self.order_repo().set_status(id, status).await
    }

    pub async fn order_items_with_products(
        &self,
        order_ids: &[i32],
    ) -> Result<Vec<(order_items::Model, Option<products::Model>)>> {
        self.order_repo().items_with_products(order_ids).await
    }

    pub async fn order_count(&self) -> Result<u64> {
        self.order_repo().count().await
    }

    pub async fn order_count_with_status(&self, status: &str) -> Result<u64> {
        self.order_repo().count_with_status(status).await
    }

    pub async fn orders_since(&self, since: &str) -> Result<Vec<orders::Model>> {
        self.order_repo().since(since).await
    }

    pub async fn recent_orders(&self, limit: u64) -> Result<Vec<orders::Model>> {
        self.order_repo().recent(limit).await
    }

    pub async fn completed_order_items(&self) -> Result<Vec<order_items::Model>> {
        self.order_repo().completed_items().await
    }

    pub async fn order_emails_since(&self, since: &str) -> Result<Vec<String>> {
        self.order_repo().window_emails(since).await
    }

    // ========== Users & refresh tokens ==========

    pub async fn user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().by_email(email).await
    }

    pub async fn user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().by_id(id).await
    }

    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<users::Model> {
        self.user_repo().create(email, password_hash, role).await
    }

    pub async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: i32,
        expires_at: &str,
    ) -> Result<()> {
        self.refresh_token_repo().insert(token, user_id, expires_at).await
    }

    pub async fn refresh_token(&self, token: &str) -> Result<Option<refresh_tokens::Model>> {
        self.refresh_token_repo().by_token(token).await
    }

    pub async fn delete_refresh_token(&self, id: i32) -> Result<()> {
        self.refresh_token_repo().delete(id).await
    }
}
