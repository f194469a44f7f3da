//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//! GET  /health                   - Health check
//!
//! # Catalog
//! GET  /products                 - Product listing (search, sort, page)
//! GET  /products/{id}            - Product detail
//! GET  /categories/{slug}        - Category listing
//!
//! # Cart (HTMX fragments or redirect)
//! GET  /cart                     - Cart page
//! POST /cart/add                 - Add to cart (count badge, triggers cart-updated)
//! POST /cart/update              - Update quantity (cart_items fragment)
//! POST /cart/remove              - Remove line (cart_items fragment)
//! POST /cart/coupon              - Apply coupon code
//! POST /cart/coupon/remove       - Remove coupon
//! GET  /cart/count               - Cart count badge (fragment)
//!
//! # Checkout (guarded, redirects back to the first incomplete step)
//! GET  /checkout                 - Redirect to the current step
//! GET  /checkout/shipping        - Shipping address and tier
//! POST /checkout/shipping
//! GET  /checkout/payment         - Payment method
//! POST /checkout/payment
//! GET  /checkout/review          - Order review
//! POST /checkout/place-order     - Place the order
//! GET  /checkout/success         - Confirmation
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/coupon", post(cart::apply_coupon))
        .route("/coupon/remove", post(cart::remove_coupon))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::start))
        .route(
            "/shipping",
            get(checkout::shipping).post(checkout::save_shipping),
        )
        .route(
            "/payment",
            get(checkout::payment).post(checkout::save_payment),
        )
        .route("/review", get(checkout::review))
        .route("/place-order", post(checkout::place_order))
        .route("/success", get(checkout::success))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .route("/categories/{slug}", get(products::category))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}
