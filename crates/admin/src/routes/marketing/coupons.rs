//! Coupon management route handlers.

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

use meridian_core::marketing::{Coupon, DiscountValue};
use meridian_core::{CouponId, Price};

use crate::{
    components::data_table::{DataTableConfig, coupons_table_config},
    db::{NewCoupon, RepositoryError},
    error::AppError,
    filters,
    routes::{BulkInput, Flash, FlashQuery, parse_datetime, redirect_with, render},
    state::AppState,
};

use super::{bulk_switch, toggle_response};

const LIST_PATH: &str = "/marketing/coupons";

/// Longest coupon code accepted.
const MAX_CODE_LEN: usize = 32;

/// Coupon row for templates.
#[derive(Debug, Clone)]
pub struct CouponRow {
    pub id: i32,
    pub code: String,
    pub description: String,
    pub value: String,
    pub minimum: Option<String>,
    pub usage: String,
    pub expires: String,
    pub expired: bool,
    pub active: bool,
}

impl CouponRow {
    fn new(coupon: &Coupon, now: chrono::DateTime<Utc>) -> Self {
        Self {
            id: coupon.id.as_i32(),
            code: coupon.code.clone(),
            description: coupon.description.clone(),
            value: coupon.value.describe(),
            minimum: coupon.min_subtotal.map(|min| format!("Orders over {min}")),
            usage: coupon.usage(),
            expires: coupon.expires_at.map_or_else(
                || "Never".to_string(),
                |at| at.format("%b %-d, %Y").to_string(),
            ),
            expired: coupon.expires_at.is_some_and(|at| at <= now),
            active: coupon.active,
        }
    }
}

/// Coupons list page template.
#[derive(Template)]
#[template(path = "marketing/coupons/index.html")]
pub struct CouponsIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub table: DataTableConfig,
    pub coupons: Vec<CouponRow>,
}

/// Coupons list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let now = Utc::now();
    let coupons = state
        .store()
        .await
        .coupons()
        .iter()
        .map(|c| CouponRow::new(c, now))
        .collect();

    render(&CouponsIndexTemplate {
        current_path: LIST_PATH.to_string(),
        flash: flash.into(),
        table: coupons_table_config(),
        coupons,
    })
}

/// Form input for creating coupons.
#[derive(Debug, Default, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discount_type: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub min_subtotal: String,
    #[serde(default)]
    pub usage_limit: String,
    #[serde(default)]
    pub expires_at: String,
}

impl CouponForm {
    fn validate(&self) -> Result<NewCoupon, String> {
        let code = Coupon::normalize_code(&self.code);
        if code.is_empty() {
            return Err("Code is required".to_string());
        }
        if code.len() > MAX_CODE_LEN
            || !code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!(
                "Code must be up to {MAX_CODE_LEN} letters, digits, dashes or underscores"
            ));
        }
        let value =
            DiscountValue::parse(&self.discount_type, &self.value).map_err(|e| e.to_string())?;

        let min_subtotal = match self.min_subtotal.trim() {
            "" => None,
            raw => Some(
                Price::parse(raw).map_err(|_| "Minimum order must be a valid amount".to_string())?,
            ),
        };
        let usage_limit = match self.usage_limit.trim() {
            "" => None,
            raw => match raw.parse::<u32>() {
                Ok(limit) if limit > 0 => Some(limit),
                _ => return Err("Usage limit must be a positive whole number".to_string()),
            },
        };

        Ok(NewCoupon {
            code,
            description: self.description.trim().to_string(),
            value,
            min_subtotal,
            usage_limit,
            expires_at: parse_datetime("Expiry", Some(&self.expires_at))?,
        })
    }
}

/// New coupon form template.
#[derive(Template)]
#[template(path = "marketing/coupons/new.html")]
pub struct CouponNewTemplate {
    pub current_path: String,
    pub form: CouponForm,
    pub error: Option<String>,
}

fn form_page(form: CouponForm, error: String) -> Result<Response, AppError> {
    let page = render(&CouponNewTemplate {
        current_path: LIST_PATH.to_string(),
        form,
        error: Some(error),
    })?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

/// New coupon form handler.
#[instrument]
pub async fn new_coupon() -> Result<Html<String>, AppError> {
    render(&CouponNewTemplate {
        current_path: LIST_PATH.to_string(),
        form: CouponForm {
            discount_type: "percentage".to_string(),
            ..CouponForm::default()
        },
        error: None,
    })
}

/// Create coupon handler.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CouponForm>,
) -> Result<Response, AppError> {
    let new = match form.validate() {
        Ok(new) => new,
        Err(message) => return form_page(form, message),
    };
    let code = new.code.clone();

    let result = state.store_mut().await.create_coupon(new);
    match result {
        Ok(id) => {
            tracing::info!(coupon_id = %id, code = %code, "Coupon created");
            Ok(redirect_with(LIST_PATH, "success", &format!("Created {code}")).into_response())
        }
        Err(RepositoryError::Conflict(message)) => form_page(form, message),
        Err(e) => Err(e.into()),
    }
}

/// Switch a coupon on or off.
#[instrument(skip(state, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<CouponId>,
) -> Result<Response, AppError> {
    let active = state.store_mut().await.toggle_coupon(id)?;
    tracing::info!(coupon_id = %id, active, "Coupon toggled");
    toggle_response(&headers, LIST_PATH, id, "Coupon", active)
}

/// Delete a coupon.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<Redirect, AppError> {
    let coupon = state.store_mut().await.delete_coupon(id)?;
    tracing::info!(coupon_id = %id, code = %coupon.code, "Coupon deleted");
    Ok(redirect_with(LIST_PATH, "success", &format!("Deleted {}", coupon.code)))
}

/// Bulk activate, deactivate or delete coupons.
#[instrument(skip(state))]
pub async fn bulk(
    State(state): State<AppState>,
    Form(input): Form<BulkInput>,
) -> Result<Response, AppError> {
    bulk_switch(
        &state,
        &input,
        LIST_PATH,
        |store, id: CouponId, active| store.set_coupon_active(id, active),
        |store, id: CouponId| store.delete_coupon(id),
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn form() -> CouponForm {
        CouponForm {
            code: "fall15".to_string(),
            discount_type: "percentage".to_string(),
            value: "15".to_string(),
            ..CouponForm::default()
        }
    }

    #[test]
    fn test_valid_form() {
        let new = form().validate().unwrap();
        assert_eq!(new.code, "FALL15");
        assert_eq!(new.value, DiscountValue::Percentage(Decimal::from(15)));
        assert_eq!(new.usage_limit, None);
    }

    #[test]
    fn test_rejects_bad_input() {
        let spaces = CouponForm {
            code: "two words".to_string(),
            ..form()
        };
        assert!(spaces.validate().is_err());

        let too_much = CouponForm {
            value: "150".to_string(),
            ..form()
        };
        assert!(too_much.validate().is_err());

        let zero_limit = CouponForm {
            usage_limit: "0".to_string(),
            ..form()
        };
        assert!(zero_limit.validate().is_err());

        let fixed = CouponForm {
            discount_type: "fixed_amount".to_string(),
            value: "$5".to_string(),
            min_subtotal: "40".to_string(),
            ..form()
        };
        let new = fixed.validate().unwrap();
        assert_eq!(new.min_subtotal, Some(Price::parse("40").unwrap()));
    }
}
