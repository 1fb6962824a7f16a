//! SeaORM-backed implementation of [`StatsService`].
//!
//! One round of bulk reads, then pure in-memory reduction. Two revenue
//! definitions coexist on purpose: the KPI total only counts COMPLETED
//! orders (all time), while the daily series accumulates every in-window
//! order regardless of status. Do not unify them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::db::Store;
use crate::entities::{order_items, products};

use super::stats_service::{
    Dashboard, DashboardAlerts, DashboardKpis, LowStockProduct, RecentOrder, SalesPoint,
    StatsError, StatsService, TopProduct,
};

const LOW_STOCK_THRESHOLD: i32 = 5;
const LOW_STOCK_LIMIT: u64 = 20;
const TOP_PRODUCTS_LIMIT: usize = 10;
const RECENT_ORDERS_LIMIT: u64 = 10;

pub struct SeaOrmStatsService {
    store: Store,
}

type ItemRow = (order_items::Model, Option<products::Model>);

impl SeaOrmStatsService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn parse_money(raw: &str) -> Result<Decimal, StatsError> {
    Decimal::from_str(raw)
        .map_err(|e| StatsError::Database(format!("Corrupt money value '{raw}': {e}")))
}

/// Round half-up to two decimals. Only applied when a figure leaves the
/// aggregation; all intermediate sums keep full precision. The rescale pins
/// the serialized form to exactly two decimal places ("40.00", not "40").
fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// UTC calendar-day key of an RFC3339 timestamp; `None` for anything
/// unparseable (skipped defensively by the series).
fn order_day_key(created_at: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(created_at)
        .ok()
        .map(|t| day_key(t.with_timezone(&Utc).date_naive()))
}

/// One zeroed bucket per calendar day in `[since, since + days)`, so the
/// series always has exactly `days` entries.
fn empty_buckets(since: NaiveDate, days: i64) -> BTreeMap<String, (u64, Decimal)> {
    (0..days)
        .map(|d| (day_key(since + Duration::days(d)), (0, Decimal::ZERO)))
        .collect()
}

/// Sort by cumulative revenue descending (stable on ties) and truncate.
fn rank_top_products(mut entries: Vec<TopProduct>) -> Vec<TopProduct> {
    entries.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    entries.truncate(TOP_PRODUCTS_LIMIT);
    entries
}

#[async_trait::async_trait]
impl StatsService for SeaOrmStatsService {
    async fn dashboard(&self, days: i64) -> Result<Dashboard, StatsError> {
        let since_date = Utc::now().date_naive() - Duration::days(days);
        let since = since_date.and_time(NaiveTime::MIN).and_utc().to_rfc3339();

        let (
            total_orders,
            completed_orders,
            active_products,
            window_orders,
            low_stock,
            recent,
            completed_items,
            window_emails,
            pending_orders,
        ) = tokio::try_join!(
            self.store.order_count(),
            self.store.order_count_with_status("COMPLETED"),
            self.store.count_active_products(),
            self.store.orders_since(&since),
            self.store.low_stock_products(LOW_STOCK_THRESHOLD, LOW_STOCK_LIMIT),
            self.store.recent_orders(RECENT_ORDERS_LIMIT),
            self.store.completed_order_items(),
            self.store.order_emails_since(&since),
            self.store.order_count_with_status("PENDING"),
        )?;

        // One batched item load covers both the window orders and the
        // recent-orders panel.
        let mut wanted_ids: Vec<i32> = window_orders
            .iter()
            .chain(recent.iter())
            .map(|o| o.id)
            .collect();
        wanted_ids.sort_unstable();
        wanted_ids.dedup();
        let mut items_by_order: HashMap<i32, Vec<ItemRow>> = HashMap::new();
        for row in self.store.order_items_with_products(&wanted_ids).await? {
            items_by_order.entry(row.0.order_id).or_default().push(row);
        }

        let mut total_revenue = Decimal::ZERO;
        for item in &completed_items {
            total_revenue += Decimal::from(item.quantity) * parse_money(&item.unit_price)?;
        }

        let new_customers = window_emails.iter().collect::<HashSet<_>>().len() as u64;

        let average_order_value = if completed_orders > 0 {
            total_revenue / Decimal::from(completed_orders)
        } else {
            Decimal::ZERO
        };
        let conversion_rate = if total_orders > 0 {
            Decimal::from(completed_orders) / Decimal::from(total_orders) * Decimal::from(100)
        } else {
            Decimal::ZERO
        };

        let mut buckets = empty_buckets(since_date, days);
        let mut top_acc: HashMap<i32, TopProduct> = HashMap::new();
        for order in &window_orders {
            let mut order_total = Decimal::ZERO;
            let items = items_by_order.get(&order.id).map_or(&[][..], Vec::as_slice);
            for (item, product) in items {
                let line = Decimal::from(item.quantity) * parse_money(&item.unit_price)?;
                order_total += line;

                if order.status == "COMPLETED" {
                    let entry = top_acc.entry(item.product_id).or_insert_with(|| TopProduct {
                        product_id: item.product_id,
                        name: product.as_ref().map_or_else(
                            || format!("Product {}", item.product_id),
                            |p| p.name.clone(),
                        ),
                        quantity: 0,
                        revenue: Decimal::ZERO,
                    });
                    entry.quantity += i64::from(item.quantity);
                    entry.revenue += line;
                }
            }

            // A key outside the pre-populated range (an order created after
            // the buckets were laid out) is skipped, not invented.
            let Some(key) = order_day_key(&order.created_at) else {
                continue;
            };
            if let Some(bucket) = buckets.get_mut(&key) {
                bucket.0 += 1;
                bucket.1 += order_total;
            }
        }

        let sales_evolution = buckets
            .into_iter()
            .map(|(date, (count, total))| SalesPoint {
                date,
                total: round2(total),
                count,
            })
            .collect();

        let mut top_products = rank_top_products(top_acc.into_values().collect());
        for entry in &mut top_products {
            entry.revenue = round2(entry.revenue);
        }

        let recent_orders = recent
            .iter()
            .map(|order| {
                let items = items_by_order.get(&order.id).map_or(&[][..], Vec::as_slice);
                let mut total = Decimal::ZERO;
                for (item, _) in items {
                    total += Decimal::from(item.quantity) * parse_money(&item.unit_price)?;
                }
                Ok(RecentOrder {
                    id: order.id,
                    status: order.status.clone(),
                    customer_name: order.customer_name.clone(),
                    customer_email: order.customer_email.clone(),
                    created_at: order.created_at.clone(),
                    item_count: items.len(),
                    total: round2(total),
                })
            })
            .collect::<Result<Vec<_>, StatsError>>()?;

        let low_stock_count = low_stock.len();
        let low_stock_products = low_stock
            .into_iter()
            .map(|p| LowStockProduct {
                id: p.id,
                name: p.name,
                slug: p.slug,
                stock: p.stock,
            })
            .collect();

        Ok(Dashboard {
            kpis: DashboardKpis {
                total_revenue: round2(total_revenue),
                total_orders,
                active_products,
                new_customers,
                conversion_rate: round2(conversion_rate),
                average_order_value: round2(average_order_value),
            },
            sales_evolution,
            top_products,
            low_stock_products,
            recent_orders,
            alerts: DashboardAlerts {
                pending_orders,
                low_stock_count,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn revenue_rounds_once_at_the_end() {
        // Per-line rounding would give 35.00; full-precision summation
        // followed by a single half-up rounding must give 35.01.
        let total = dec("10.00") + dec("20.005") + dec("5.00");
        assert_eq!(total, dec("35.005"));
        assert_eq!(round2(total), dec("35.01"));
    }

    #[test]
    fn round2_is_half_up() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("1.004")), dec("1.00"));
        assert_eq!(round2(dec("0")), dec("0"));
    }

    #[test]
    fn buckets_cover_every_day_in_the_window() {
        let since = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let buckets = empty_buckets(since, 7);
        assert_eq!(buckets.len(), 7);
        let keys: Vec<_> = buckets.keys().cloned().collect();
        assert_eq!(keys.first().unwrap(), "2026-03-01");
        assert_eq!(keys.last().unwrap(), "2026-03-07");
        // BTreeMap keys are already in lexicographic = chronological order.
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn buckets_span_a_full_year() {
        let since = NaiveDate::from_ymd_opt(2025, 8, 6).unwrap();
        assert_eq!(empty_buckets(since, 365).len(), 365);
    }

    #[test]
    fn day_key_slices_utc_dates() {
        assert_eq!(
            order_day_key("2026-08-06T12:34:56+00:00").as_deref(),
            Some("2026-08-06")
        );
        // Offset timestamps bucket by their UTC date.
        assert_eq!(
            order_day_key("2026-08-07T01:00:00+02:00").as_deref(),
            Some("2026-08-06")
        );
        assert_eq!(order_day_key("not a timestamp"), None);
    }

    #[test]
    fn top_products_sort_by_revenue_and_cap_at_ten() {
        let entries: Vec<TopProduct> = (0..15)
            .map(|i| TopProduct {
                product_id: i,
                name: format!("p{i}"),
                quantity: 1,
                revenue: Decimal::from(i),
            })
            .collect();
        let ranked = rank_top_products(entries);
        assert_eq!(ranked.len(), TOP_PRODUCTS_LIMIT);
        assert_eq!(ranked[0].revenue, Decimal::from(14));
        assert!(ranked.windows(2).all(|w| w[0].revenue >= w[1].revenue));
    }

    #[test]
    fn money_parsing_rejects_garbage() {
        assert!(parse_money("12.50").is_ok());
        assert!(parse_money("twelve").is_err());
    }
}
