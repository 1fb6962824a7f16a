use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entities::{order_items, orders, products};

/// Column values for a new order. Status is set by the repository, not the
/// caller: every order starts PENDING.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<i32>,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

/// One order line with the unit price already snapshotted by the service.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: String,
    pub specs: Option<String>,
}

pub struct OrderRepository {
    conn: DatabaseConnection,
}

impl OrderRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Writes the order and all of its items as one transaction; a reader
    /// can never observe the order without its items.
    pub async fn create_with_items(&self, new: NewOrder, items: Vec<NewOrderItem>) -> Result<i32> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let order = orders::ActiveModel {
            user_id: Set(new.user_id),
            customer_email: Set(new.customer_email),
            customer_name: Set(new.customer_name),
            customer_phone: Set(new.customer_phone),
            notes: Set(new.notes),
            status: Set("PENDING".to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert order")?;

        for item in items {
            order_items::ActiveModel {
                order_id: Set(order.id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                specs: Set(item.specs),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to insert order item")?;
        }

        txn.commit().await.context("Failed to commit order")?;
        Ok(order.id)
    }

    pub async fn by_id(&self, id: i32) -> Result<Option<orders::Model>> {
        orders::Entity::find_by_id(id)
            .filter(orders::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .context("Failed to query order by id")
    }

    /// Admin listing: non-deleted, newest first, optional status filter.
    pub async fn page(
        &self,
        page: u64,
        limit: u64,
        status: Option<&str>,
    ) -> Result<(Vec<orders::Model>, u64)> {
        let mut query = orders::Entity::find()
            .filter(orders::Column::DeletedAt.is_null())
            .order_by_desc(orders::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(orders::Column::Status.eq(status));
        }

        let paginator = query.paginate(&self.conn, limit);
        let total = paginator.num_items().await.context("Failed to count orders")?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch order page")?;
        Ok((items, total))
    }

    pub async fn set_status(&self, id: i32, status: &str) -> Result<Option<orders::Model>> {
        let Some(existing) = self.by_id(id).await? else {
            return Ok(None);
        };

        let mut active: orders::ActiveModel = existing.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update order status")?;
        Ok(Some(model))
    }

    /// Items for a batch of orders, each joined with its product row (the
    /// product may be soft-deleted by now; the snapshot price still stands).
    pub async fn items_with_products(
        &self,
        order_ids: &[i32],
    ) -> Result<Vec<(order_items::Model, Option<products::Model>)>> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        order_items::Entity::find()
            .filter(order_items::Column::OrderId.is_in(order_ids.iter().copied()))
            .find_also_related(products::Entity)
            .all(&self.conn)
            .await
            .context("Failed to query order items")
    }

    pub async fn count(&self) -> Result<u64> {
        orders::Entity::find()
            .filter(orders::Column::DeletedAt.is_null())
            .count(&self.conn)
            .await
            .context("Failed to count orders")
    }

    pub async fn count_with_status(&self, status: &str) -> Result<u64> {
        orders::Entity::find()
            .filter(orders::Column::DeletedAt.is_null())
            .filter(orders::Column::Status.eq(status))
            .count(&self.conn)
            .await
            .context("Failed to count orders by status")
    }

    /// Non-deleted orders created on or after `since` (RFC3339), newest
    /// first. RFC3339 strings from a single writer compare correctly.
    pub async fn since(&self, since: &str) -> Result<Vec<orders::Model>> {
        orders::Entity::find()
            .filter(orders::Column::DeletedAt.is_null())
            .filter(orders::Column::CreatedAt.gte(since))
            .order_by_desc(orders::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query orders in window")
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<orders::Model>> {
        orders::Entity::find()
            .filter(orders::Column::DeletedAt.is_null())
            .order_by_desc(orders::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query recent orders")
    }

    /// Every item of every COMPLETED non-deleted order, for the revenue
    /// total. Unbounded by design: the KPI covers all time.
    pub async fn completed_items(&self) -> Result<Vec<order_items::Model>> {
        order_items::Entity::find()
            .join(JoinType::InnerJoin, order_items::Relation::Orders.def())
            .filter(orders::Column::Status.eq("COMPLETED"))
            .filter(orders::Column::DeletedAt.is_null())
            .all(&self.conn)
            .await
            .context("Failed to query completed order items")
    }

    /// Customer emails of non-deleted orders in the window, duplicates
    /// included; the caller counts distinct values.
    pub async fn window_emails(&self, since: &str) -> Result<Vec<String>> {
        orders::Entity::find()
            .select_only()
            .column(orders::Column::CustomerEmail)
            .filter(orders::Column::DeletedAt.is_null())
            .filter(orders::Column::CreatedAt.gte(since))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query window emails")
    }
}
