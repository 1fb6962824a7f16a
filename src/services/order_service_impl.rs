//! SeaORM-backed implementation of [`OrderService`].

use std::collections::HashMap;

use crate::db::{NewOrder, NewOrderItem, Store};
use crate::entities::{order_items, orders, products};

use super::catalog_service::{Page, PageMeta};
use super::order_service::{
    CreateOrder, OrderDto, OrderError, OrderItemDto, OrderItemProduct, OrderService, OrderStatus,
};

const MAX_PAGE_SIZE: u64 = 100;

pub struct SeaOrmOrderService {
    store: Store,
}

impl SeaOrmOrderService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn load_order(&self, id: i32) -> Result<OrderDto, OrderError> {
        let order = self
            .store
            .order_by_id(id)
            .await?
            .ok_or(OrderError::NotFound)?;
        let items = self.store.order_items_with_products(&[id]).await?;
        order_dto(order, items)
    }

    async fn load_page(
        &self,
        models: Vec<orders::Model>,
        total: u64,
        page: u64,
        limit: u64,
    ) -> Result<Page<OrderDto>, OrderError> {
        let ids: Vec<i32> = models.iter().map(|o| o.id).collect();
        let mut grouped: HashMap<i32, Vec<(order_items::Model, Option<products::Model>)>> =
            HashMap::new();
        for row in self.store.order_items_with_products(&ids).await? {
            grouped.entry(row.0.order_id).or_default().push(row);
        }

        let data = models
            .into_iter()
            .map(|o| {
                let items = grouped.remove(&o.id).unwrap_or_default();
                order_dto(o, items)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            data,
            meta: PageMeta::new(total, page, limit),
        })
    }
}

fn order_dto(
    order: orders::Model,
    items: Vec<(order_items::Model, Option<products::Model>)>,
) -> Result<OrderDto, OrderError> {
    let status: OrderStatus = order.status.parse().map_err(OrderError::Database)?;

    let items = items
        .into_iter()
        .map(|(item, product)| OrderItemDto {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            specs: item.specs,
            product: product.map(|p| OrderItemProduct {
                id: p.id,
                name: p.name,
                slug: p.slug,
            }),
        })
        .collect();

    Ok(OrderDto {
        id: order.id,
        user_id: order.user_id,
        customer_email: order.customer_email,
        customer_name: order.customer_name,
        customer_phone: order.customer_phone,
        notes: order.notes,
        status,
        items,
        created_at: order.created_at,
        updated_at: order.updated_at,
    })
}

/// Field checks applied before any database work; collected so the caller
/// can surface them all at once.
fn validate_input(input: &CreateOrder) -> Result<(), OrderError> {
    let mut problems = Vec::new();
    if input.items.is_empty() {
        problems.push("At least one item is required".to_string());
    }
    if input.customer_name.trim().is_empty() {
        problems.push("customerName must not be empty".to_string());
    }
    if !input.customer_email.contains('@') {
        problems.push("customerEmail must be a valid email address".to_string());
    }
    for item in &input.items {
        if item.quantity < 1 {
            problems.push(format!(
                "quantity for product {} must be at least 1",
                item.product_id
            ));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(OrderError::Validation(problems.join(", ")))
    }
}

#[async_trait::async_trait]
impl OrderService for SeaOrmOrderService {
    async fn create(
        &self,
        input: CreateOrder,
        user_id: Option<i32>,
    ) -> Result<OrderDto, OrderError> {
        validate_input(&input)?;

        // Resolve every referenced product in one batch; a count mismatch
        // means at least one id was unknown or soft-deleted.
        let product_ids: Vec<i32> = input.items.iter().map(|i| i.product_id).collect();
        let resolved = self.store.products_by_ids(&product_ids).await?;
        if resolved.len() != product_ids.len() {
            return Err(OrderError::Validation(
                "One or more products not found".to_string(),
            ));
        }
        let price_map: HashMap<i32, String> =
            resolved.into_iter().map(|p| (p.id, p.price)).collect();

        // The snapshot: unit_price is copied from the catalog now and never
        // recomputed, whatever happens to the product price later.
        let items = input
            .items
            .iter()
            .map(|item| {
                let unit_price = price_map
                    .get(&item.product_id)
                    .cloned()
                    .ok_or_else(|| OrderError::Validation(
                        "One or more products not found".to_string(),
                    ))?;
                Ok(NewOrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price,
                    specs: item.specs.clone(),
                })
            })
            .collect::<Result<Vec<_>, OrderError>>()?;

        let id = self
            .store
            .create_order(
                NewOrder {
                    user_id,
                    customer_email: input.customer_email,
                    customer_name: input.customer_name,
                    customer_phone: input.customer_phone,
                    notes: input.notes,
                },
                items,
            )
            .await?;

        self.load_order(id).await
    }

    async fn list(
        &self,
        page: u64,
        limit: u64,
        status: Option<OrderStatus>,
    ) -> Result<Page<OrderDto>, OrderError> {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let (models, total) = self
            .store
            .order_page(page, limit, status.map(OrderStatus::as_str))
            .await?;
        self.load_page(models, total, page, limit).await
    }

    async fn get(&self, id: i32) -> Result<OrderDto, OrderError> {
        self.load_order(id).await
    }

    async fn update_status(&self, id: i32, status: OrderStatus) -> Result<OrderDto, OrderError> {
        let updated = self.store.set_order_status(id, status.as_str()).await?;
        match updated {
            Some(order) => {
                let items = self.store.order_items_with_products(&[order.id]).await?;
                order_dto(order, items)
            }
            None => Err(OrderError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> CreateOrder {
        CreateOrder {
            customer_email: "client@example.com".to_string(),
            customer_name: "Client".to_string(),
            customer_phone: None,
            notes: None,
            items: vec![super::super::order_service::OrderItemInput {
                product_id: 1,
                quantity: 2,
                specs: None,
            }],
        }
    }

    #[test]
    fn empty_items_are_rejected() {
        let mut input = base_input();
        input.items.clear();
        let err = validate_input(&input).unwrap_err();
        assert!(matches!(err, OrderError::Validation(msg) if msg.contains("At least one item")));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut input = base_input();
        input.items[0].quantity = 0;
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn bad_email_is_rejected() {
        let mut input = base_input();
        input.customer_email = "not-an-email".to_string();
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn valid_input_passes() {
        assert!(validate_input(&base_input()).is_ok());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }
}
