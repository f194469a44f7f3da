//! Automatic discount route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use meridian_core::DiscountId;
use meridian_core::catalog::Category;
use meridian_core::marketing::{Discount, DiscountScope, DiscountValue};

use crate::{
    components::data_table::{DataTableConfig, discounts_table_config},
    db::{NewDiscount, RepositoryError},
    error::AppError,
    filters,
    routes::{BulkInput, Flash, FlashQuery, parse_datetime, redirect_with, render},
    state::AppState,
};

use super::{bulk_switch, toggle_response};

const LIST_PATH: &str = "/marketing/discounts";

/// Discount row for templates.
#[derive(Debug, Clone)]
pub struct DiscountRow {
    pub id: i32,
    pub name: String,
    pub value: String,
    pub scope: String,
    pub window: String,
    /// `Active`, `Scheduled`, `Expired` or `Paused`.
    pub state: &'static str,
    pub active: bool,
}

impl DiscountRow {
    fn new(discount: &Discount, now: chrono::DateTime<Utc>) -> Self {
        let start = discount.starts_at.format("%b %-d, %Y");
        Self {
            id: discount.id.as_i32(),
            name: discount.name.clone(),
            value: discount.value.describe(),
            scope: discount.scope.describe(),
            window: discount.ends_at.map_or_else(
                || format!("From {start}"),
                |end| format!("{start} to {}", end.format("%b %-d, %Y")),
            ),
            state: discount.state(now),
            active: discount.active,
        }
    }
}

/// Discounts list page template.
#[derive(Template)]
#[template(path = "marketing/discounts/index.html")]
pub struct DiscountsIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub table: DataTableConfig,
    pub discounts: Vec<DiscountRow>,
}

/// Discounts list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let now = Utc::now();
    let discounts = state
        .store()
        .await
        .discounts()
        .iter()
        .map(|d| DiscountRow::new(d, now))
        .collect();

    render(&DiscountsIndexTemplate {
        current_path: LIST_PATH.to_string(),
        flash: flash.into(),
        table: discounts_table_config(),
        discounts,
    })
}

/// Form input for creating discounts.
#[derive(Debug, Default, Deserialize)]
pub struct DiscountForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub discount_type: String,
    #[serde(default)]
    pub value: String,
    /// `all` or a category slug.
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: String,
}

impl DiscountForm {
    /// Validate the form. A blank start means "now".
    fn validate(&self, now: chrono::DateTime<Utc>) -> Result<NewDiscount, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let value =
            DiscountValue::parse(&self.discount_type, &self.value).map_err(|e| e.to_string())?;
        let scope = match self.scope.trim() {
            "" | "all" => DiscountScope::All,
            slug => DiscountScope::Category(slug.to_string()),
        };

        Ok(NewDiscount {
            name: name.to_string(),
            value,
            scope,
            starts_at: parse_datetime("Start", Some(&self.starts_at))?.unwrap_or(now),
            ends_at: parse_datetime("End", Some(&self.ends_at))?,
        })
    }
}

/// New discount form template.
#[derive(Template)]
#[template(path = "marketing/discounts/new.html")]
pub struct DiscountNewTemplate {
    pub current_path: String,
    pub form: DiscountForm,
    pub categories: Vec<Category>,
    pub error: Option<String>,
}

async fn form_page(
    state: &AppState,
    form: DiscountForm,
    error: Option<String>,
) -> Result<Html<String>, AppError> {
    let categories = state.store().await.categories().to_vec();
    render(&DiscountNewTemplate {
        current_path: LIST_PATH.to_string(),
        form,
        categories,
        error,
    })
}

/// New discount form handler.
#[instrument(skip(state))]
pub async fn new_discount(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let form = DiscountForm {
        discount_type: "percentage".to_string(),
        scope: "all".to_string(),
        ..DiscountForm::default()
    };
    form_page(&state, form, None).await
}

/// Create discount handler.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<DiscountForm>,
) -> Result<Response, AppError> {
    let result = match form.validate(Utc::now()) {
        Ok(new) => state.store_mut().await.create_discount(new),
        Err(message) => Err(RepositoryError::InvalidState(message)),
    };

    match result {
        Ok(id) => {
            tracing::info!(discount_id = %id, "Discount created");
            Ok(
                redirect_with(LIST_PATH, "success", &format!("Created {}", form.name.trim()))
                    .into_response(),
            )
        }
        Err(RepositoryError::InvalidState(message)) => {
            let page = form_page(&state, form, Some(message)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Switch a discount on or off.
#[instrument(skip(state, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<DiscountId>,
) -> Result<Response, AppError> {
    let active = state.store_mut().await.toggle_discount(id)?;
    tracing::info!(discount_id = %id, active, "Discount toggled");
    toggle_response(&headers, LIST_PATH, id, "Discount", active)
}

/// Delete a discount.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DiscountId>,
) -> Result<Redirect, AppError> {
    let discount = state.store_mut().await.delete_discount(id)?;
    tracing::info!(discount_id = %id, "Discount deleted");
    Ok(redirect_with(LIST_PATH, "success", &format!("Deleted {}", discount.name)))
}

/// Bulk activate, deactivate or delete discounts.
#[instrument(skip(state))]
pub async fn bulk(
    State(state): State<AppState>,
    Form(input): Form<BulkInput>,
) -> Result<Response, AppError> {
    bulk_switch(
        &state,
        &input,
        LIST_PATH,
        |store, id: DiscountId, active| store.set_discount_active(id, active),
        |store, id: DiscountId| store.delete_discount(id),
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_start_means_now() {
        let now = Utc::now();
        let form = DiscountForm {
            name: "Flash sale".to_string(),
            discount_type: "fixed_amount".to_string(),
            value: "5".to_string(),
            scope: "footwear".to_string(),
            ..DiscountForm::default()
        };
        let new = form.validate(now).unwrap();
        assert_eq!(new.starts_at, now);
        assert_eq!(new.scope, DiscountScope::Category("footwear".to_string()));
    }

    #[test]
    fn test_requires_name() {
        let form = DiscountForm {
            discount_type: "percentage".to_string(),
            value: "5".to_string(),
            ..DiscountForm::default()
        };
        assert_eq!(form.validate(Utc::now()).unwrap_err(), "Name is required");
    }
}
