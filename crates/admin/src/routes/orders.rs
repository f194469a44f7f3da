//! Order management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use meridian_core::order::Order;
use meridian_core::{OrderNumber, OrderStatus};

use crate::{
    components::data_table::{DataTableConfig, Page, orders_table_config},
    db::RepositoryError,
    error::AppError,
    filters,
    state::AppState,
};

use super::{Flash, FlashQuery, parse_filter, products::filter_query, redirect_with, render};

/// Order list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
}

/// Order row for templates.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub number: String,
    pub placed_at: String,
    pub customer_name: String,
    pub city: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub items: u32,
    pub total: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            number: order.number.to_string(),
            placed_at: order.placed_at.format("%b %-d, %Y %H:%M").to_string(),
            customer_name: order.customer_name().to_string(),
            city: order.shipping_address.city.clone(),
            status: order.status.as_str(),
            status_label: order.status.label(),
            items: order.item_count(),
            total: order.totals.total.to_string(),
        }
    }
}

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub current_path: String,
    pub table: DataTableConfig,
    pub page: Page<OrderRow>,
    pub filter_query: String,
}

/// Orders list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Html<String>, AppError> {
    let status = parse_filter::<OrderStatus>(query.status.as_deref());
    let rows: Vec<OrderRow> = state
        .store()
        .await
        .search_orders(query.search.as_deref(), status)
        .into_iter()
        .map(OrderRow::from)
        .collect();

    let table = orders_table_config()
        .with_value("search", query.search.as_deref())
        .with_value("status", status.map(|s| s.as_str()));
    let template = OrdersIndexTemplate {
        current_path: "/orders".to_string(),
        filter_query: filter_query(&table),
        table,
        page: Page::paginate(rows, query.page.unwrap_or(1), state.config().page_size),
    };

    render(&template)
}

/// Order line for the detail page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub variant: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

/// Status choice on the detail page.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Order detail template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub number: String,
    pub placed_at: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub customer_name: String,
    pub address_lines: Vec<String>,
    pub phone: String,
    pub shipping_label: String,
    pub payment_summary: String,
    pub coupon_code: Option<String>,
    pub lines: Vec<OrderLineView>,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub discount: Option<String>,
    pub total: String,
    /// Statuses the order may move to next.
    pub next_statuses: Vec<StatusOption>,
}

impl OrderShowTemplate {
    fn new(order: &Order, flash: Flash) -> Self {
        let address = &order.shipping_address;
        let address_lines = [
            Some(address.address_line1.clone()),
            address.address_line2.clone(),
            Some(format!(
                "{}, {} {}",
                address.city, address.state, address.postal_code
            )),
            Some(address.country.clone()),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self {
            current_path: "/orders".to_string(),
            flash,
            number: order.number.to_string(),
            placed_at: order.placed_at.format("%b %-d, %Y %H:%M UTC").to_string(),
            status: order.status.as_str(),
            status_label: order.status.label(),
            customer_name: order.customer_name().to_string(),
            address_lines,
            phone: address.phone.clone(),
            shipping_label: format!(
                "{} ({})",
                order.shipping_option.label(),
                order.totals.shipping
            ),
            payment_summary: order.payment.summary(),
            coupon_code: order.coupon_code.clone(),
            lines: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    name: item.name.clone(),
                    variant: [item.size.as_deref(), item.color.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" / "),
                    quantity: item.quantity,
                    price: item.price.to_string(),
                    line_total: item.line_total().to_string(),
                })
                .collect(),
            subtotal: order.totals.subtotal.to_string(),
            shipping: order.totals.shipping.to_string(),
            tax: order.totals.tax.to_string(),
            discount: (!order.totals.discount.is_zero())
                .then(|| order.totals.discount.to_string()),
            total: order.totals.total.to_string(),
            next_statuses: OrderStatus::ALL
                .iter()
                .filter(|next| order.status.can_transition_to(**next))
                .map(|next| StatusOption {
                    value: next.as_str(),
                    label: next.label(),
                })
                .collect(),
        }
    }
}

/// Order detail handler.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let number = parse_number(&number)?;
    let store = state.store().await;
    let template = OrderShowTemplate::new(store.order(&number)?, flash.into());
    drop(store);
    render(&template)
}

/// Form input for status changes.
#[derive(Debug, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

/// Move an order to a new status.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Form(input): Form<StatusInput>,
) -> Result<Redirect, AppError> {
    let number = parse_number(&number)?;
    let status: OrderStatus = input
        .status
        .parse()
        .map_err(|e: meridian_core::InvalidStatus| AppError::BadRequest(e.to_string()))?;

    let path = format!("/orders/{number}");
    let result = state.store_mut().await.update_order_status(&number, status);
    match result {
        Ok(()) => {
            tracing::info!(order_id = %number, status = %status, "Order status updated");
            Ok(redirect_with(
                &path,
                "success",
                &format!("Order marked {}", status.label().to_lowercase()),
            ))
        }
        Err(RepositoryError::InvalidState(message)) => {
            Ok(redirect_with(&path, "error", &message))
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_number(raw: &str) -> Result<OrderNumber, AppError> {
    OrderNumber::parse(raw).map_err(|_| AppError::NotFound(format!("order {raw}")))
}
