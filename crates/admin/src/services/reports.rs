//! Sales report over placed orders.
//!
//! Cancelled orders count towards the per-status breakdown but are left out
//! of revenue, average order value and product rankings.

use std::collections::HashMap;

use rust_decimal::Decimal;

use meridian_core::order::Order;
use meridian_core::{OrderStatus, Price, ProductId};

/// How many products the top-sellers table shows.
pub const TOP_PRODUCTS: usize = 5;

/// Order count and revenue for one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBreakdown {
    pub status: OrderStatus,
    pub orders: usize,
    pub revenue: Price,
}

/// Units and revenue for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub units: u32,
    pub revenue: Price,
}

/// Sales summary.
#[derive(Debug, Clone)]
pub struct SalesReport {
    /// Orders that were not cancelled.
    pub order_count: usize,
    pub revenue: Price,
    pub average_order_value: Price,
    pub units_sold: u32,
    pub tax_collected: Price,
    pub discounts_given: Price,
    /// One row per status, in lifecycle order, including empty ones.
    pub by_status: Vec<StatusBreakdown>,
    /// Best sellers by revenue, ties broken by units.
    pub top_products: Vec<ProductSales>,
}

impl SalesReport {
    /// Build the report from `orders`.
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let counted: Vec<&Order> = orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .collect();

        let revenue: Price = counted.iter().map(|o| o.totals.total).sum();
        let average_order_value = u32::try_from(counted.len())
            .ok()
            .filter(|n| *n > 0)
            .map_or(Price::ZERO, |n| {
                Price::new(revenue.amount() / Decimal::from(n)).round_to_cents()
            });

        let by_status = OrderStatus::ALL
            .iter()
            .map(|status| {
                let matching: Vec<&Order> =
                    orders.iter().filter(|o| o.status == *status).collect();
                StatusBreakdown {
                    status: *status,
                    orders: matching.len(),
                    revenue: matching.iter().map(|o| o.totals.total).sum(),
                }
            })
            .collect();

        Self {
            order_count: counted.len(),
            revenue,
            average_order_value,
            units_sold: counted.iter().map(|o| o.item_count()).sum(),
            tax_collected: counted.iter().map(|o| o.totals.tax).sum(),
            discounts_given: counted.iter().map(|o| o.totals.discount).sum(),
            by_status,
            top_products: top_products(&counted),
        }
    }
}

fn top_products(orders: &[&Order]) -> Vec<ProductSales> {
    let mut sales: HashMap<ProductId, ProductSales> = HashMap::new();
    for item in orders.iter().flat_map(|o| &o.items) {
        let entry = sales.entry(item.product_id).or_insert_with(|| ProductSales {
            product_id: item.product_id,
            name: item.name.clone(),
            units: 0,
            revenue: Price::ZERO,
        });
        entry.units += item.quantity;
        entry.revenue = entry.revenue + item.line_total();
    }

    let mut ranked: Vec<ProductSales> = sales.into_values().collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then(b.units.cmp(&a.units))
            .then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(TOP_PRODUCTS);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use meridian_core::seed::SeedData;

    use super::*;

    #[test]
    fn test_revenue_excludes_cancelled_orders() {
        let seed = SeedData::load().unwrap();
        let report = SalesReport::from_orders(&seed.orders);

        assert_eq!(report.order_count, 5);
        assert_eq!(report.revenue, Price::parse("625.79").unwrap());
        assert_eq!(report.average_order_value, Price::parse("125.16").unwrap());

        let cancelled = report
            .by_status
            .iter()
            .find(|row| row.status == OrderStatus::Cancelled)
            .unwrap();
        assert_eq!(cancelled.orders, 1);
        assert_eq!(report.by_status.len(), OrderStatus::ALL.len());
    }

    #[test]
    fn test_top_products_are_ranked_and_capped() {
        let seed = SeedData::load().unwrap();
        let report = SalesReport::from_orders(&seed.orders);
        assert!(report.top_products.len() <= TOP_PRODUCTS);
        assert!(
            report
                .top_products
                .windows(2)
                .all(|w| w[0].revenue >= w[1].revenue)
        );
    }

    #[test]
    fn test_empty_report() {
        let report = SalesReport::from_orders(&[]);
        assert_eq!(report.order_count, 0);
        assert_eq!(report.average_order_value, Price::ZERO);
        assert!(report.top_products.is_empty());
    }
}
