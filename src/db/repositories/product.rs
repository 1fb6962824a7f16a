use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entities::{categories, product_images, products};
use crate::services::catalog_service::{ProductImageInput, ProductSort, SortDirection};

/// Filter for the product listing query. `page` is 1-based; callers clamp
/// `limit` before it gets here.
#[derive(Debug, Clone)]
pub struct ProductListFilter {
    pub page: u64,
    pub limit: u64,
    pub sort: ProductSort,
    pub direction: SortDirection,
    /// Already trimmed and non-empty.
    pub search: Option<String>,
    pub category_slug: Option<String>,
    pub include_inactive: bool,
}

/// Column values for a new product row; timestamps are filled in here.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub specs: Option<String>,
    pub price: String,
    pub stock: i32,
    pub is_active: bool,
    pub is_quote_only: bool,
    pub category_id: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Partial update; `None` leaves the column untouched. `images` as
/// `Some(vec)` replaces the whole image set.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub specs: Option<String>,
    pub price: Option<String>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_quote_only: Option<bool>,
    pub category_id: Option<i32>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub images: Option<Vec<ProductImageInput>>,
}

pub struct ProductRepository {
    conn: DatabaseConnection,
}

impl ProductRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Paginated listing. Every branch filters soft-deleted rows; public
    /// callers additionally require `is_active`.
    pub async fn list(&self, filter: &ProductListFilter) -> Result<(Vec<products::Model>, u64)> {
        let mut query = products::Entity::find().filter(products::Column::DeletedAt.is_null());

        if !filter.include_inactive {
            query = query.filter(products::Column::IsActive.eq(true));
        }

        if let Some(slug) = &filter.category_slug {
            query = query
                .join(JoinType::InnerJoin, products::Relation::Categories.def())
                .filter(categories::Column::Slug.eq(slug.clone()))
                .filter(categories::Column::DeletedAt.is_null());
        }

        if let Some(term) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(products::Column::Name.contains(term.as_str()))
                    .add(products::Column::Description.contains(term.as_str())),
            );
        }

        let direction = match filter.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        query = match filter.sort {
            ProductSort::Name => query.order_by(products::Column::Name, direction),
            // Prices live in a TEXT column; cast so "9.50" sorts below "10".
            ProductSort::Price => query.order_by(Expr::cust("CAST(price AS REAL)"), direction),
            ProductSort::CreatedAt => query.order_by(products::Column::CreatedAt, direction),
        };

        let paginator = query.paginate(&self.conn, filter.limit);
        let total = paginator
            .num_items()
            .await
            .context("Failed to count products")?;
        let items = paginator
            .fetch_page(filter.page.saturating_sub(1))
            .await
            .context("Failed to fetch product page")?;

        Ok((items, total))
    }

    pub async fn by_id(&self, id: i32) -> Result<Option<products::Model>> {
        products::Entity::find_by_id(id)
            .filter(products::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query product by id")
    }

    pub async fn by_slug(&self, slug: &str, require_active: bool) -> Result<Option<products::Model>> {
        let mut query = products::Entity::find()
            .filter(products::Column::Slug.eq(slug))
            .filter(products::Column::DeletedAt.is_null());
        if require_active {
            query = query.filter(products::Column::IsActive.eq(true));
        }
        query.one(&self.conn).await.context("Failed to query product by slug")
    }

    /// Batch resolution used by order creation: only non-deleted rows count.
    pub async fn by_ids(&self, ids: &[i32]) -> Result<Vec<products::Model>> {
        products::Entity::find()
            .filter(products::Column::Id.is_in(ids.iter().copied()))
            .filter(products::Column::DeletedAt.is_null())
            .all(&self.conn)
            .await
            .context("Failed to query products by ids")
    }

    /// Same-category picks when `category_id` is set, newest actives
    /// otherwise; the source product is always excluded.
    pub async fn related(
        &self,
        product_id: i32,
        category_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<products::Model>> {
        let mut query = products::Entity::find()
            .filter(products::Column::DeletedAt.is_null())
            .filter(products::Column::IsActive.eq(true))
            .filter(products::Column::Id.ne(product_id));

        query = match category_id {
            Some(cat) => query.filter(products::Column::CategoryId.eq(cat)),
            None => query.order_by_desc(products::Column::CreatedAt),
        };

        query
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query related products")
    }

    pub async fn categories_by_ids(&self, ids: &[i32]) -> Result<Vec<categories::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        categories::Entity::find()
            .filter(categories::Column::Id.is_in(ids.iter().copied()))
            .filter(categories::Column::DeletedAt.is_null())
            .all(&self.conn)
            .await
            .context("Failed to query categories by ids")
    }

    /// All images for the given products, ordered by sort_order; callers
    /// keep either the full set or just the first per product.
    pub async fn images_for(&self, product_ids: &[i32]) -> Result<Vec<product_images::Model>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        product_images::Entity::find()
            .filter(product_images::Column::ProductId.is_in(product_ids.iter().copied()))
            .order_by_asc(product_images::Column::SortOrder)
            .all(&self.conn)
            .await
            .context("Failed to query product images")
    }

    pub async fn create(&self, new: NewProduct, images: Vec<ProductImageInput>) -> Result<i32> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let product = products::ActiveModel {
            name: Set(new.name),
            slug: Set(new.slug),
            description: Set(new.description),
            specs: Set(new.specs),
            price: Set(new.price),
            stock: Set(new.stock),
            is_active: Set(new.is_active),
            is_quote_only: Set(new.is_quote_only),
            category_id: Set(new.category_id),
            meta_title: Set(new.meta_title),
            meta_description: Set(new.meta_description),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert product")?;

        for (i, image) in images.into_iter().enumerate() {
            product_images::ActiveModel {
                product_id: Set(product.id),
                url: Set(image.url),
                alt: Set(image.alt.unwrap_or_default()),
                sort_order: Set(image.sort_order.unwrap_or(i32::try_from(i).unwrap_or(0))),
                created_at: Set(now.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert product image")?;
        }

        txn.commit().await.context("Failed to commit product")?;
        Ok(product.id)
    }

    pub async fn update(&self, id: i32, patch: ProductPatch) -> Result<Option<i32>> {
        let Some(existing) = self.by_id(id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        if let Some(images) = patch.images {
            product_images::Entity::delete_many()
                .filter(product_images::Column::ProductId.eq(id))
                .exec(&txn)
                .await
                .context("Failed to clear product images")?;
            for (i, image) in images.into_iter().enumerate() {
                product_images::ActiveModel {
                    product_id: Set(id),
                    url: Set(image.url),
                    alt: Set(image.alt.unwrap_or_default()),
                    sort_order: Set(image.sort_order.unwrap_or(i32::try_from(i).unwrap_or(0))),
                    created_at: Set(now.clone()),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .context("Failed to insert product image")?;
            }
        }

        let mut active: products::ActiveModel = existing.into();
        if let Some(v) = patch.name {
            active.name = Set(v);
        }
        if let Some(v) = patch.slug {
            active.slug = Set(v);
        }
        if let Some(v) = patch.description {
            active.description = Set(v);
        }
        if let Some(v) = patch.specs {
            active.specs = Set(Some(v));
        }
        if let Some(v) = patch.price {
            active.price = Set(v);
        }
        if let Some(v) = patch.stock {
            active.stock = Set(v);
        }
        if let Some(v) = patch.is_active {
            active.is_active = Set(v);
        }
        if let Some(v) = patch.is_quote_only {
            active.is_quote_only = Set(v);
        }
        if let Some(v) = patch.category_id {
            active.category_id = Set(Some(v));
        }
        if let Some(v) = patch.meta_title {
            active.meta_title = Set(Some(v));
        }
        if let Some(v) = patch.meta_description {
            active.meta_description = Set(Some(v));
        }
        active.updated_at = Set(now);
        active.update(&txn).await.context("Failed to update product")?;

        txn.commit().await.context("Failed to commit product update")?;
        Ok(Some(id))
    }

    /// Soft delete; returns false when no live row matched.
    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let Some(existing) = self.by_id(id).await? else {
            return Ok(false);
        };

        let now = chrono::Utc::now().to_rfc3339();
        let mut active: products::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now.clone()));
        active.updated_at = Set(now);
        active
            .update(&self.conn)
            .await
            .context("Failed to soft-delete product")?;
        Ok(true)
    }

    pub async fn count_active(&self) -> Result<u64> {
        products::Entity::find()
            .filter(products::Column::DeletedAt.is_null())
            .filter(products::Column::IsActive.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count active products")
    }

    /// Active products at or below the stock threshold, lowest first.
    pub async fn low_stock(&self, threshold: i32, limit: u64) -> Result<Vec<products::Model>> {
        products::Entity::find()
            .filter(products::Column::DeletedAt.is_null())
            .filter(products::Column::IsActive.eq(true))
            .filter(products::Column::Stock.lte(threshold))
            .order_by_asc(products::Column::Stock)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query low-stock products")
    }
}
