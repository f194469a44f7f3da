//! Product and category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use meridian_core::catalog::{Category, Product, ProductPage, ProductQuery, SortKey};
use meridian_core::{ProductId, cart};

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Number of related products shown on a product page.
const RELATED_LIMIT: usize = 4;

/// Listing query parameters shared by `/products` and `/categories/{slug}`.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
}

/// An option in the sort or category dropdown.
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub heading: String,
    pub description: Option<String>,
    pub products: Vec<Product>,
    pub total: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub search: String,
    /// Path the filter form submits to.
    pub action: String,
    /// Whether the category dropdown is shown (hidden on category pages).
    pub show_category_filter: bool,
    pub sort_options: Vec<SelectOption>,
    pub category_options: Vec<SelectOption>,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub category: Option<Category>,
    pub related_products: Vec<Product>,
    pub max_quantity: u32,
}

/// Display the product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ProductsIndexTemplate {
    let category = query
        .category
        .as_deref()
        .and_then(|slug| state.catalog().category(slug))
        .cloned();
    let heading = category
        .as_ref()
        .map_or_else(|| "All Products".to_string(), |c| c.name.clone());
    listing(&state, &query, "/products", heading, None, category.as_ref(), true)
}

/// Display a category listing.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate> {
    let category = state
        .catalog()
        .category(&slug)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?
        .clone();
    Ok(listing(
        &state,
        &query,
        &format!("/categories/{}", category.slug),
        category.name.clone(),
        Some(category.description.clone()),
        Some(&category),
        false,
    ))
}

/// Display a product detail page.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = id
        .parse::<ProductId>()
        .ok()
        .and_then(|id| state.catalog().product(id))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let related_products = state
        .catalog()
        .related(product, RELATED_LIMIT)
        .into_iter()
        .cloned()
        .collect();

    Ok(ProductShowTemplate {
        category: state.catalog().category(&product.category).cloned(),
        related_products,
        max_quantity: cart::max_quantity(product.stock),
        product: product.clone(),
    })
}

fn listing(
    state: &AppState,
    query: &ListingQuery,
    action: &str,
    heading: String,
    description: Option<String>,
    category: Option<&Category>,
    show_category_filter: bool,
) -> ProductsIndexTemplate {
    let sort = query
        .sort
        .as_deref()
        .and_then(|s| s.parse::<SortKey>().ok())
        .unwrap_or_default();
    let search = query.q.clone().unwrap_or_default();

    let product_query = ProductQuery {
        search: Some(search.clone()),
        category: category.map(|c| c.slug.clone()),
        sort,
        page: query.page.unwrap_or(1),
        ..ProductQuery::default()
    };
    let page: ProductPage<'_> = state.catalog().search(&product_query);

    let page_url = |page: usize| {
        let mut params = url::form_urlencoded::Serializer::new(String::new());
        if !search.is_empty() {
            params.append_pair("q", &search);
        }
        if show_category_filter && let Some(category) = category {
            params.append_pair("category", &category.slug);
        }
        if sort != SortKey::default() {
            params.append_pair("sort", sort.as_str());
        }
        params.append_pair("page", &page.to_string());
        format!("{action}?{}", params.finish())
    };

    let sort_options = SortKey::ALL
        .iter()
        .map(|key| SelectOption {
            value: key.as_str().to_string(),
            label: key.label().to_string(),
            selected: *key == sort,
        })
        .collect();
    let category_options = state
        .catalog()
        .categories()
        .iter()
        .map(|c| SelectOption {
            value: c.slug.clone(),
            label: c.name.clone(),
            selected: category.is_some_and(|selected| selected.slug == c.slug),
        })
        .collect();

    tracing::debug!(
        total = page.total,
        page = page.page,
        sort = sort.as_str(),
        "Product listing"
    );

    ProductsIndexTemplate {
        heading,
        description,
        prev_url: (page.page > 1).then(|| page_url(page.page - 1)),
        next_url: page.has_next().then(|| page_url(page.page + 1)),
        products: page.items.iter().map(|p| (*p).clone()).collect(),
        total: page.total,
        current_page: page.page,
        total_pages: page.total_pages,
        search,
        action: action.to_string(),
        show_category_filter,
        sort_options,
        category_options,
    }
}
