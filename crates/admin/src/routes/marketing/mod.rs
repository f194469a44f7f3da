//! Marketing route handlers: banners, coupons, discounts and email campaigns.

pub mod banners;
pub mod campaigns;
pub mod coupons;
pub mod discounts;

use std::fmt::Display;
use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::{
    db::{self, AdminStore},
    error::AppError,
    state::AppState,
};

use super::{BulkInput, BulkOutcome, is_htmx, redirect_with, render, unknown_action};

/// Build the marketing router, nested under `/marketing`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/marketing/banners") }))
        // Banners
        .route("/banners", get(banners::index).post(banners::create))
        .route("/banners/new", get(banners::new_banner))
        .route("/banners/{id}/toggle", post(banners::toggle))
        .route("/banners/{id}/delete", post(banners::delete))
        .route("/banners/bulk", post(banners::bulk))
        // Coupons
        .route("/coupons", get(coupons::index).post(coupons::create))
        .route("/coupons/new", get(coupons::new_coupon))
        .route("/coupons/{id}/toggle", post(coupons::toggle))
        .route("/coupons/{id}/delete", post(coupons::delete))
        .route("/coupons/bulk", post(coupons::bulk))
        // Discounts
        .route("/discounts", get(discounts::index).post(discounts::create))
        .route("/discounts/new", get(discounts::new_discount))
        .route("/discounts/{id}/toggle", post(discounts::toggle))
        .route("/discounts/{id}/delete", post(discounts::delete))
        .route("/discounts/bulk", post(discounts::bulk))
        // Email campaigns
        .route("/campaigns", get(campaigns::index).post(campaigns::create))
        .route("/campaigns/new", get(campaigns::new_campaign))
        .route("/campaigns/{id}/schedule", post(campaigns::schedule))
        .route("/campaigns/{id}/send", post(campaigns::send))
        .route("/campaigns/{id}/delete", post(campaigns::delete))
        .route("/campaigns/bulk", post(campaigns::bulk))
}

/// On/off switch fragment swapped in by HTMX.
#[derive(Template)]
#[template(path = "partials/toggle.html")]
pub struct ToggleTemplate {
    pub url: String,
    pub active: bool,
}

/// Answer a toggle: the switch fragment for HTMX, a redirect otherwise.
pub(super) fn toggle_response(
    headers: &HeaderMap,
    list_path: &str,
    id: impl Display,
    name: &str,
    active: bool,
) -> Result<Response, AppError> {
    if is_htmx(headers) {
        let fragment = render(&ToggleTemplate {
            url: format!("{list_path}/{id}/toggle"),
            active,
        })?;
        return Ok(([("HX-Trigger", "toggled")], fragment).into_response());
    }
    let state = if active { "activated" } else { "deactivated" };
    Ok(redirect_with(list_path, "success", &format!("{name} {state}")).into_response())
}

/// Bulk activate, deactivate or delete entities with an on/off switch.
pub(super) async fn bulk_switch<I, T>(
    state: &AppState,
    input: &BulkInput,
    list_path: &str,
    set_active: impl Fn(&mut AdminStore, I, bool) -> db::Result<()>,
    delete: impl Fn(&mut AdminStore, I) -> db::Result<T>,
) -> Result<Response, AppError>
where
    I: FromStr + Copy + Display,
{
    let ids: Vec<I> = input.parse_ids()?;
    let mut outcome = BulkOutcome::default();
    let mut store = state.store_mut().await;

    let done = match input.action.as_str() {
        "activate" => {
            for id in ids {
                outcome.record(id, set_active(&mut *store, id, true));
            }
            "activated"
        }
        "deactivate" => {
            for id in ids {
                outcome.record(id, set_active(&mut *store, id, false));
            }
            "deactivated"
        }
        "delete" => {
            for id in ids {
                outcome.record(id, delete(&mut *store, id));
            }
            "deleted"
        }
        other => return Err(unknown_action(other)),
    };
    drop(store);

    Ok(outcome.into_response(list_path, done))
}
