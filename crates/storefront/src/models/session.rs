//! Session-related types.
//!
//! The session is the visitor's store: it holds the cart, the checkout
//! selections and the most recently placed order.

use tower_sessions::Session;

use meridian_core::cart::Cart;
use meridian_core::checkout::Checkout;
use meridian_core::order::Order;

/// Session keys for visitor state.
pub mod keys {
    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for checkout selections (address, shipping, payment, coupon).
    pub const CHECKOUT: &str = "checkout";

    /// Key for the order shown on the confirmation page.
    pub const LAST_ORDER: &str = "last_order";
}

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Load the cart, or an empty one.
pub async fn load_cart(session: &Session) -> SessionResult<Cart> {
    Ok(session.get(keys::CART).await?.unwrap_or_default())
}

/// Persist the cart.
pub async fn save_cart(session: &Session, cart: &Cart) -> SessionResult<()> {
    session.insert(keys::CART, cart).await
}

/// Load checkout selections, or fresh ones.
pub async fn load_checkout(session: &Session) -> SessionResult<Checkout> {
    Ok(session.get(keys::CHECKOUT).await?.unwrap_or_default())
}

/// Persist checkout selections.
pub async fn save_checkout(session: &Session, checkout: &Checkout) -> SessionResult<()> {
    session.insert(keys::CHECKOUT, checkout).await
}

/// Load the last placed order, if any.
pub async fn load_last_order(session: &Session) -> SessionResult<Option<Order>> {
    session.get(keys::LAST_ORDER).await
}

/// Remember `order` for the confirmation page.
pub async fn save_last_order(session: &Session, order: &Order) -> SessionResult<()> {
    session.insert(keys::LAST_ORDER, order).await
}

/// Forget the last placed order.
pub async fn clear_last_order(session: &Session) -> SessionResult<()> {
    session.remove::<Order>(keys::LAST_ORDER).await.map(|_| ())
}
