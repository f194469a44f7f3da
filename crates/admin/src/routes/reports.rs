//! Sales report page.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::{
    error::AppError,
    filters,
    services::{SalesReport, reports::StatusBreakdown},
    state::AppState,
};

use super::render;

/// Status row with its share of all orders, for the bar chart.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub status: &'static str,
    pub label: &'static str,
    pub orders: usize,
    pub revenue: String,
    /// Whole percent, `0..=100`.
    pub share: usize,
}

impl StatusRow {
    fn new(row: &StatusBreakdown, total_orders: usize) -> Self {
        Self {
            status: row.status.as_str(),
            label: row.status.label(),
            orders: row.orders,
            revenue: row.revenue.to_string(),
            share: (row.orders * 100).checked_div(total_orders).unwrap_or(0),
        }
    }
}

/// Top seller row.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub rank: usize,
    pub name: String,
    pub units: u32,
    pub revenue: String,
}

/// Reports template.
#[derive(Template)]
#[template(path = "reports/index.html")]
pub struct ReportsTemplate {
    pub current_path: String,
    pub order_count: usize,
    pub revenue: String,
    pub average_order_value: String,
    pub units_sold: u32,
    pub tax_collected: String,
    pub discounts_given: String,
    pub by_status: Vec<StatusRow>,
    pub top_products: Vec<ProductRow>,
}

impl From<SalesReport> for ReportsTemplate {
    fn from(report: SalesReport) -> Self {
        let total_orders = report.by_status.iter().map(|row| row.orders).sum();
        Self {
            current_path: "/reports".to_string(),
            order_count: report.order_count,
            revenue: report.revenue.to_string(),
            average_order_value: report.average_order_value.to_string(),
            units_sold: report.units_sold,
            tax_collected: report.tax_collected.to_string(),
            discounts_given: report.discounts_given.to_string(),
            by_status: report
                .by_status
                .iter()
                .map(|row| StatusRow::new(row, total_orders))
                .collect(),
            top_products: report
                .top_products
                .into_iter()
                .enumerate()
                .map(|(i, p)| ProductRow {
                    rank: i + 1,
                    name: p.name,
                    units: p.units,
                    revenue: p.revenue.to_string(),
                })
                .collect(),
        }
    }
}

/// Sales report page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let report = SalesReport::from_orders(state.store().await.orders());
    render(&ReportsTemplate::from(report))
}

#[cfg(test)]
mod tests {
    use meridian_core::{OrderStatus, Price};

    use super::*;

    #[test]
    fn test_status_share() {
        let row = StatusBreakdown {
            status: OrderStatus::Shipped,
            orders: 1,
            revenue: Price::ZERO,
        };
        assert_eq!(StatusRow::new(&row, 4).share, 25);
        assert_eq!(StatusRow::new(&row, 0).share, 0);
    }
}
