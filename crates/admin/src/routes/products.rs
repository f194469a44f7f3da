//! Product management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use meridian_core::catalog::Product;
use meridian_core::{ProductId, ProductStatus};

use crate::{
    components::data_table::{DataTableConfig, Page, products_table_config},
    db::ProductFilter,
    error::AppError,
    filters,
    state::AppState,
};

use super::{
    BulkInput, BulkOutcome, Flash, parse_filter, redirect_with, render, unknown_action,
};

/// Product list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Product row for templates.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub category: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub price: String,
    pub stock: u32,
    pub low_stock: bool,
}

/// Stock at or below this is flagged in the list.
const LOW_STOCK: u32 = 5;

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            image: product.image.clone(),
            category: product.category.clone(),
            status: product.status.as_str(),
            status_label: product.status.label(),
            price: product.price.to_string(),
            stock: product.stock,
            low_stock: product.stock <= LOW_STOCK,
        }
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub table: DataTableConfig,
    pub page: Page<ProductRow>,
    /// Current filters as a query string, for pager links.
    pub filter_query: String,
}

/// Products list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Html<String>, AppError> {
    let filter = ProductFilter {
        search: query.search.clone(),
        category: query.category.clone(),
        status: parse_filter::<ProductStatus>(query.status.as_deref()),
    };

    let store = state.store().await;
    let rows: Vec<ProductRow> = store
        .search_products(&filter)
        .into_iter()
        .map(ProductRow::from)
        .collect();
    let table = products_table_config(store.categories())
        .with_value("search", query.search.as_deref())
        .with_value("category", query.category.as_deref())
        .with_value("status", filter.status.map(|s| s.as_str()));
    drop(store);

    let filter_query = filter_query(&table);
    let template = ProductsIndexTemplate {
        current_path: "/products".to_string(),
        flash: Flash::new(query.success, query.error),
        page: Page::paginate(rows, query.page.unwrap_or(1), state.config().page_size),
        table,
        filter_query,
    };

    render(&template)
}

/// Delete a single product.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Redirect, AppError> {
    let product = state.store_mut().await.delete_product(id)?;
    tracing::info!(product_id = %id, name = %product.name, "Product deleted");
    Ok(redirect_with(
        "/products",
        "success",
        &format!("Deleted {}", product.name),
    ))
}

/// Bulk activate, archive or delete products.
#[instrument(skip(state))]
pub async fn bulk(
    State(state): State<AppState>,
    Form(input): Form<BulkInput>,
) -> Result<Response, AppError> {
    let ids: Vec<ProductId> = input.parse_ids()?;
    let mut outcome = BulkOutcome::default();
    let mut store = state.store_mut().await;

    let done = match input.action.as_str() {
        "delete" => {
            for id in ids {
                outcome.record(id, store.delete_product(id));
            }
            "deleted"
        }
        "archive" => {
            for id in ids {
                outcome.record(id, store.set_product_status(id, ProductStatus::Archived));
            }
            "archived"
        }
        "activate" => {
            for id in ids {
                outcome.record(id, store.set_product_status(id, ProductStatus::Active));
            }
            "activated"
        }
        other => return Err(unknown_action(other)),
    };
    drop(store);

    Ok(outcome.into_response("/products", done).into_response())
}

/// Serialize the applied filters so pager links keep them.
pub(crate) fn filter_query(table: &DataTableConfig) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for filter in table.filters.iter().filter(|f| !f.value.is_empty()) {
        query.append_pair(&filter.key, &filter.value);
    }
    query.finish()
}
