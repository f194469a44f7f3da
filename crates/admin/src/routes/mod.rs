//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Dashboard
//! GET  /                               - Dashboard overview
//!
//! # Catalog and orders
//! GET  /products                       - Product listing (?search=&category=&status=&page=)
//! POST /products/{id}/delete           - Delete product
//! POST /products/bulk                  - Bulk activate / archive / delete
//! GET  /orders                         - Order listing (?search=&status=&page=)
//! GET  /orders/{number}                - Order detail
//! POST /orders/{number}/status         - Move order to a new status
//! GET  /returns                        - Return requests (?status=)
//! POST /returns/{id}/status            - Approve / reject / refund
//!
//! # Marketing
//! GET  /marketing/banners              - Banner listing
//! GET  /marketing/banners/new          - New banner form
//! POST /marketing/banners              - Create banner
//! POST /marketing/banners/{id}/toggle  - Switch on/off (HTMX)
//! POST /marketing/banners/{id}/delete  - Delete banner
//! POST /marketing/banners/bulk         - Bulk activate / deactivate / delete
//! (same shape for /marketing/coupons and /marketing/discounts)
//! GET  /marketing/campaigns            - Campaign listing (?status=)
//! GET  /marketing/campaigns/new        - New campaign form
//! POST /marketing/campaigns            - Create draft
//! POST /marketing/campaigns/{id}/schedule
//! POST /marketing/campaigns/{id}/send
//! POST /marketing/campaigns/{id}/delete
//! POST /marketing/campaigns/bulk
//!
//! # Media
//! GET  /media                          - Media library (?search=&kind=&folder=)
//! GET  /media/new                      - Add asset form
//! POST /media                          - Add asset
//! POST /media/{id}/delete              - Delete asset
//! POST /media/bulk                     - Bulk delete
//!
//! # Settings and reports
//! GET  /settings/seo       POST /settings/seo
//! GET  /settings/shipping  POST /settings/shipping
//! GET  /settings/tax       POST /settings/tax
//! GET  /reports                        - Sales summary
//! ```
//!
//! Mutating handlers redirect back to the list with a `success` or `error`
//! query parameter, which the list page shows as a flash message.

pub mod dashboard;
pub mod marketing;
pub mod media;
pub mod orders;
pub mod products;
pub mod reports;
pub mod returns;
pub mod settings;

use std::fmt::Display;
use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/products", get(products::index))
        .route("/products/{id}/delete", post(products::delete))
        .route("/products/bulk", post(products::bulk))
        .route("/orders", get(orders::index))
        .route("/orders/{number}", get(orders::show))
        .route("/orders/{number}/status", post(orders::update_status))
        .route("/returns", get(returns::index))
        .route("/returns/{id}/status", post(returns::update_status))
        .nest("/marketing", marketing::router())
        .route("/media", get(media::index).post(media::create))
        .route("/media/new", get(media::new_asset))
        .route("/media/{id}/delete", post(media::delete))
        .route("/media/bulk", post(media::bulk))
        .route("/settings", get(|| async { Redirect::to("/settings/seo") }))
        .route("/settings/seo", get(settings::seo).post(settings::update_seo))
        .route(
            "/settings/shipping",
            get(settings::shipping).post(settings::update_shipping),
        )
        .route("/settings/tax", get(settings::tax).post(settings::update_tax))
        .route("/reports", get(reports::index))
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Render a template, turning failures into a 500.
pub(crate) fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("template render failed: {e}")))
}

/// Flash message carried in the query string after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Flash message for templates.
#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    /// Build from the raw `success` and `error` query values.
    #[must_use]
    pub fn new(success: Option<String>, error: Option<String>) -> Self {
        Self {
            success: non_empty(success),
            error: non_empty(error),
        }
    }
}

impl From<FlashQuery> for Flash {
    fn from(query: FlashQuery) -> Self {
        Self::new(query.success, query.error)
    }
}

/// Redirect to `path` with a flash message. `path` must not carry a query.
pub(crate) fn redirect_with(path: &str, kind: &str, message: &str) -> Redirect {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(kind, message)
        .finish();
    Redirect::to(&format!("{path}?{query}"))
}

/// Whether the request was issued by HTMX.
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}

/// Treat blank form and query values as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional filter value, ignoring blanks and unknown values.
pub(crate) fn parse_filter<T: FromStr>(value: Option<&str>) -> Option<T> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// Parse a `datetime-local` input (`2025-06-01T09:30`) as UTC.
///
/// # Errors
///
/// Returns a message naming `field` if the value is not a valid timestamp.
pub(crate) fn parse_datetime(
    field: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, String> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|dt| Some(dt.and_utc()))
        .map_err(|_| format!("{field} must be a valid date and time"))
}

// =============================================================================
// Bulk actions
// =============================================================================

/// Form posted by the selection bar on list screens.
#[derive(Debug, Deserialize)]
pub struct BulkInput {
    /// Action key, e.g. `delete`.
    pub action: String,
    /// Comma-separated list of ids.
    pub ids: String,
}

impl BulkInput {
    /// Parse the selected ids.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if nothing is selected or an id is malformed.
    pub fn parse_ids<T: FromStr>(&self) -> Result<Vec<T>, AppError> {
        let ids = self
            .ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse()
                    .map_err(|_| AppError::BadRequest(format!("invalid id: {id}")))
            })
            .collect::<Result<Vec<T>, _>>()?;
        if ids.is_empty() {
            return Err(AppError::BadRequest("No items selected".to_string()));
        }
        Ok(ids)
    }
}

/// Tally of a bulk action applied item by item.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub error_messages: Vec<String>,
}

impl BulkOutcome {
    /// Record the result for one id.
    pub fn record<T, E: Display>(&mut self, id: impl Display, result: Result<T, E>) {
        match result {
            Ok(_) => self.success_count += 1,
            Err(e) => self.error_messages.push(format!("{id}: {e}")),
        }
    }

    /// Redirect back to `path` when every item succeeded, otherwise answer
    /// 207 with the per-item errors.
    pub fn into_response(self, path: &str, done: &str) -> Response {
        if self.error_messages.is_empty() {
            tracing::info!(count = self.success_count, action = done, "Bulk action completed");
            redirect_with(
                path,
                "success",
                &format!("{} {} item(s)", capitalize(done), self.success_count),
            )
            .into_response()
        } else {
            tracing::warn!(
                success = self.success_count,
                errors = ?self.error_messages,
                action = done,
                "Bulk action completed with errors"
            );
            (
                StatusCode::MULTI_STATUS,
                format!(
                    "{} {} item(s). Errors: {}",
                    capitalize(done),
                    self.success_count,
                    self.error_messages.join("; ")
                ),
            )
                .into_response()
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Reject a bulk action key the screen does not offer.
pub(crate) fn unknown_action(action: &str) -> AppError {
    AppError::BadRequest(format!("unknown bulk action: {action}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, header::LOCATION};
    use meridian_core::{OrderStatus, ProductId};

    use super::*;

    #[test]
    fn test_parse_ids() {
        let input = BulkInput {
            action: "delete".to_string(),
            ids: " 3, 5,,7 ".to_string(),
        };
        let ids: Vec<ProductId> = input.parse_ids().unwrap();
        assert_eq!(ids, vec![ProductId::new(3), ProductId::new(5), ProductId::new(7)]);

        let empty = BulkInput {
            action: "delete".to_string(),
            ids: " , ".to_string(),
        };
        assert!(empty.parse_ids::<ProductId>().is_err());

        let junk = BulkInput {
            action: "delete".to_string(),
            ids: "3,x".to_string(),
        };
        assert!(junk.parse_ids::<ProductId>().is_err());
    }

    #[test]
    fn test_bulk_outcome_responses() {
        let mut ok = BulkOutcome::default();
        ok.record(1, Ok::<(), String>(()));
        let response = ok.into_response("/products", "deleted");
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/products?success=Deleted+1+item%28s%29"
        );

        let mut partial = BulkOutcome::default();
        partial.record(1, Ok::<(), String>(()));
        partial.record(2, Err::<(), _>("product 2 not found"));
        assert_eq!(
            partial.into_response("/products", "deleted").status(),
            StatusCode::MULTI_STATUS
        );
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(parse_datetime("Starts", Some("  ")), Ok(None));
        let parsed = parse_datetime("Starts", Some("2030-07-01T09:30")).unwrap().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2030-07-01T09:30:00+00:00");
        assert!(parse_datetime("Starts", Some("tomorrow")).is_err());
    }

    #[test]
    fn test_helpers() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(parse_filter(Some("shipped")), Some(OrderStatus::Shipped));
        assert_eq!(parse_filter::<OrderStatus>(Some("lost")), None);

        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
