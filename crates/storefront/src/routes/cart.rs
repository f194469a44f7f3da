//! Cart route handlers.
//!
//! Cart operations answer HTMX requests with fragments and an
//! `HX-Trigger: cart-updated` header, and plain form posts with a redirect
//! back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use meridian_core::ProductId;
use meridian_core::cart::{Cart, CartItem};
use meridian_core::checkout::{Checkout, CheckoutError};
use meridian_core::marketing::find_coupon;
use meridian_core::totals::OrderTotals;

use crate::error::{AppError, Result};
use crate::filters;
use crate::models::session;
use crate::state::AppState;

/// Cart line display data for templates.
pub struct CartLineView {
    pub line_id: String,
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    /// Chosen size and colour, e.g. `M / White`.
    pub options: Option<String>,
    pub price: String,
    pub original_price: Option<String>,
    pub quantity: u32,
    pub max_quantity: u32,
    pub line_total: String,
}

impl CartLineView {
    #[must_use]
    pub const fn can_decrease(&self) -> bool {
        self.quantity > 1
    }

    #[must_use]
    pub const fn can_increase(&self) -> bool {
        self.quantity < self.max_quantity
    }
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        let options: Vec<&str> = [item.size.as_deref(), item.color.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        Self {
            line_id: item.line_id(),
            product_id: item.product_id,
            name: item.name.clone(),
            image: item.image.clone(),
            options: (!options.is_empty()).then(|| options.join(" / ")),
            price: item.price.display(),
            original_price: item
                .original_price
                .filter(|original| *original > item.price)
                .map(|original| original.display()),
            quantity: item.quantity,
            max_quantity: item.max_quantity(),
            line_total: item.line_total().display(),
        }
    }
}

/// Cart display data for templates, shared with the checkout summary.
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub totals: OrderTotals,
    /// Whether shipping is still unknown because no address is on file.
    pub shipping_pending: bool,
    pub coupon_code: Option<String>,
    pub coupon_description: Option<String>,
    /// Whether the applied coupon currently takes anything off.
    pub coupon_applies: bool,
}

impl CartView {
    /// Build the view for `cart` with totals from `checkout`.
    #[must_use]
    pub fn new(state: &AppState, cart: &Cart, checkout: &Checkout) -> Self {
        let totals = checkout.totals(cart, state.tax_rate(), chrono::Utc::now());
        Self {
            lines: cart.items().iter().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            shipping_pending: checkout.address.is_none(),
            coupon_code: checkout.coupon.as_ref().map(|c| c.code.clone()),
            coupon_description: checkout.coupon.as_ref().map(|c| c.description.clone()),
            coupon_applies: !totals.discount.is_zero(),
            totals,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Update cart form data.
///
/// `action` is `increase` or `decrease` for the stepper buttons; otherwise
/// `quantity` is set directly.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: Option<u32>,
    pub action: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub coupon_input: String,
    pub coupon_error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Whether the request came from HTMX.
fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Respond to a cart mutation: the items fragment for HTMX, otherwise a
/// redirect to the cart page.
async fn cart_changed(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    cart: &Cart,
) -> Result<Response> {
    if !is_htmx(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }
    let checkout = session::load_checkout(session).await?;
    Ok((
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate {
            cart: CartView::new(state, cart, &checkout),
        },
    )
        .into_response())
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let cart = session::load_cart(&session).await?;
    let checkout = session::load_checkout(&session).await?;

    Ok(CartShowTemplate {
        cart: CartView::new(&state, &cart, &checkout),
        coupon_input: String::new(),
        coupon_error: None,
    })
}

/// Add item to cart.
///
/// Quantities are clamped to `[1, min(10, stock)]`; adding a product that is
/// already in the cart with the same options merges into that line.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = state
        .catalog()
        .product(form.product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;
    let item = CartItem::from_product(
        product,
        form.quantity.unwrap_or(1),
        form.size.as_deref(),
        form.color.as_deref(),
    )?;

    let mut cart = session::load_cart(&session).await?;
    let quantity = cart.add(item);
    session::save_cart(&session, &cart).await?;

    tracing::info!(product_id = %form.product_id, quantity, "Added to cart");

    if is_htmx(&headers) {
        return Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response());
    }
    Ok(Redirect::to("/cart").into_response())
}

/// Update cart line quantity.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = session::load_cart(&session).await?;
    let quantity = match form.action.as_deref() {
        Some("increase") => cart.step_quantity(&form.line_id, true)?,
        Some("decrease") => cart.step_quantity(&form.line_id, false)?,
        _ => cart.set_quantity(&form.line_id, form.quantity.unwrap_or(1))?,
    };
    session::save_cart(&session, &cart).await?;

    tracing::debug!(line_id = %form.line_id, quantity, "Cart line updated");
    cart_changed(&state, &session, &headers, &cart).await
}

/// Remove a line from the cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = session::load_cart(&session).await?;
    let removed = cart.remove(&form.line_id)?;
    session::save_cart(&session, &cart).await?;

    tracing::info!(product_id = %removed.product_id, "Removed from cart");
    cart_changed(&state, &session, &headers, &cart).await
}

/// Get cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<CartCountTemplate> {
    let cart = session::load_cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}

/// Apply a coupon code.
///
/// An unusable code re-renders the cart with the reason next to the form.
#[instrument(skip(state, session))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let cart = session::load_cart(&session).await?;
    let mut checkout = session::load_checkout(&session).await?;

    let applied = find_coupon(&state.coupons().await, &form.code)
        .map_err(CheckoutError::from)
        .and_then(|coupon| checkout.apply_coupon(coupon, &cart, chrono::Utc::now()));

    match applied {
        Ok(discount) => {
            session::save_checkout(&session, &checkout).await?;
            tracing::info!(coupon = %form.code.trim(), discount = %discount, "Coupon applied");
            Ok(Redirect::to("/cart").into_response())
        }
        Err(err) => {
            tracing::debug!(coupon = %form.code.trim(), error = %err, "Coupon rejected");
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                CartShowTemplate {
                    cart: CartView::new(&state, &cart, &checkout),
                    coupon_input: form.code,
                    coupon_error: Some(err.to_string()),
                },
            )
                .into_response())
        }
    }
}

/// Remove the applied coupon.
#[instrument(skip(session))]
pub async fn remove_coupon(session: Session) -> Result<Redirect> {
    let mut checkout = session::load_checkout(&session).await?;
    checkout.remove_coupon();
    session::save_checkout(&session, &checkout).await?;
    Ok(Redirect::to("/cart"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use meridian_core::seed::SeedData;

    use super::*;

    #[test]
    fn test_line_view_stepper_bounds() {
        let seed = SeedData::load().unwrap();
        let boot = seed.products.iter().find(|p| p.name == "Leather Chelsea Boot").unwrap();
        let item = CartItem::from_product(boot, 10, None, None).unwrap();
        let view = CartLineView::from(&item);

        assert_eq!(view.quantity, boot.stock);
        assert!(!view.can_increase());
        assert!(view.can_decrease());
        assert_eq!(view.options.as_deref(), Some("8 / Brown"));
        assert_eq!(view.original_price.as_deref(), Some("$260.00"));
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
