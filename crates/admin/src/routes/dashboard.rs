//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use meridian_core::order::Order;

use crate::{error::AppError, filters, services::SalesReport, state::AppState};

use super::render;

/// How many orders the dashboard lists.
const RECENT_ORDERS: usize = 5;

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub products: usize,
    pub orders: usize,
    pub pending_returns: usize,
    pub active_campaigns: usize,
    pub revenue: String,
}

/// Recent order view for dashboard.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub number: String,
    pub customer_name: String,
    pub placed_at: String,
    pub total: String,
    pub status: &'static str,
    pub status_label: &'static str,
}

impl From<&Order> for RecentOrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number.to_string(),
            customer_name: order.customer_name().to_string(),
            placed_at: order.placed_at.format("%b %-d, %Y").to_string(),
            total: order.totals.total.to_string(),
            status: order.status.as_str(),
            status_label: order.status.label(),
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub current_path: String,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<RecentOrderView>,
}

/// Dashboard page handler.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let store = state.store().await;
    let report = SalesReport::from_orders(store.orders());

    let template = DashboardTemplate {
        current_path: "/".to_string(),
        metrics: DashboardMetrics {
            products: store.products().len(),
            orders: store.orders().len(),
            pending_returns: store.pending_returns(),
            active_campaigns: store.active_campaigns(),
            revenue: report.revenue.to_string(),
        },
        recent_orders: store
            .orders()
            .iter()
            .take(RECENT_ORDERS)
            .map(RecentOrderView::from)
            .collect(),
    };
    drop(store);

    render(&template)
}
