//! Checkout route handlers.
//!
//! Each step first runs the checkout guard; a visitor who skips ahead is
//! redirected to the earliest step still missing input.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use meridian_core::cart::Cart;
use meridian_core::checkout::{
    Address, Checkout, CheckoutError, CheckoutStep, PaymentKind, PaymentMethod, ShippingOption,
};
use meridian_core::marketing::record_redemption;
use meridian_core::order::Order;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::session;
use crate::routes::cart::{CartLineView, CartView};
use crate::state::AppState;

/// Progress indicator entry.
pub struct StepView {
    pub label: &'static str,
    pub path: &'static str,
    /// `complete`, `current` or `upcoming`.
    pub state: &'static str,
}

fn progress(current: CheckoutStep) -> Vec<StepView> {
    CheckoutStep::PROGRESS
        .iter()
        .map(|&step| StepView {
            label: step.label(),
            path: step.path(),
            state: match step.cmp(&current) {
                std::cmp::Ordering::Less => "complete",
                std::cmp::Ordering::Equal => "current",
                std::cmp::Ordering::Greater => "upcoming",
            },
        })
        .collect()
}

/// Load the cart and checkout for `step`, or the redirect the guard demands.
async fn enter(
    session: &Session,
    step: CheckoutStep,
) -> Result<std::result::Result<(Cart, Checkout), Redirect>> {
    let cart = session::load_cart(session).await?;
    let checkout = session::load_checkout(session).await?;

    let allowed = checkout.required_step(step, &cart);
    if allowed != step {
        tracing::debug!(
            requested = step.as_str(),
            redirect = allowed.as_str(),
            "Checkout guard redirect"
        );
        return Ok(Err(Redirect::to(allowed.path())));
    }
    Ok(Ok((cart, checkout)))
}

// =============================================================================
// Shipping
// =============================================================================

/// Shipping step form data.
#[derive(Debug, Default, Deserialize)]
pub struct ShippingForm {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub shipping_option: String,
}

impl ShippingForm {
    fn from_checkout(checkout: &Checkout) -> Self {
        let shipping_option = checkout.shipping_option.as_str().to_string();
        checkout.address.as_ref().map_or_else(
            || Self {
                country: "US".to_string(),
                shipping_option: shipping_option.clone(),
                ..Self::default()
            },
            |a| Self {
                full_name: a.full_name.clone(),
                address_line1: a.address_line1.clone(),
                address_line2: a.address_line2.clone().unwrap_or_default(),
                city: a.city.clone(),
                state: a.state.clone(),
                postal_code: a.postal_code.clone(),
                country: a.country.clone(),
                phone: a.phone.clone(),
                shipping_option: shipping_option.clone(),
            },
        )
    }

    fn address(&self) -> Address {
        Address {
            full_name: self.full_name.clone(),
            address_line1: self.address_line1.clone(),
            address_line2: Some(self.address_line2.clone()),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Shipping option display data.
pub struct ShippingOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub estimate: &'static str,
    pub price: String,
    pub selected: bool,
}

/// Shipping step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub form: ShippingForm,
    pub options: Vec<ShippingOptionView>,
    pub error: Option<String>,
    pub cart: CartView,
    pub steps: Vec<StepView>,
}

impl ShippingTemplate {
    fn new(state: &AppState, cart: &Cart, checkout: &Checkout, form: ShippingForm) -> Self {
        let options = ShippingOption::ALL
            .iter()
            .map(|&option| ShippingOptionView {
                value: option.as_str(),
                label: option.label(),
                estimate: option.estimate(),
                price: option.price().display(),
                selected: option.as_str() == form.shipping_option,
            })
            .collect();
        Self {
            form,
            options,
            error: None,
            cart: CartView::new(state, cart, checkout),
            steps: progress(CheckoutStep::Shipping),
        }
    }
}

/// Display the shipping step.
#[instrument(skip(state, session))]
pub async fn shipping(State(state): State<AppState>, session: Session) -> Result<Response> {
    let (cart, checkout) = match enter(&session, CheckoutStep::Shipping).await? {
        Ok(loaded) => loaded,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let form = ShippingForm::from_checkout(&checkout);
    Ok(ShippingTemplate::new(&state, &cart, &checkout, form).into_response())
}

/// Save the shipping address and option.
#[instrument(skip(state, session, form))]
pub async fn save_shipping(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let (cart, mut checkout) = match enter(&session, CheckoutStep::Shipping).await? {
        Ok(loaded) => loaded,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let result = form
        .shipping_option
        .parse::<ShippingOption>()
        .map_err(|_| "Choose a shipping option".to_string())
        .and_then(|option| {
            checkout
                .set_shipping(form.address(), option)
                .map_err(|e| e.to_string())
        });

    if let Err(error) = result {
        let mut page = ShippingTemplate::new(&state, &cart, &checkout, form);
        page.error = Some(error);
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    session::save_checkout(&session, &checkout).await?;
    tracing::info!(
        shipping_option = checkout.shipping_option.as_str(),
        "Shipping details saved"
    );
    Ok(Redirect::to(CheckoutStep::Shipping.next().path()).into_response())
}

// =============================================================================
// Payment
// =============================================================================

/// Payment step form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment_type: String,
    pub card_number: Option<String>,
    pub cardholder_name: Option<String>,
}

/// Payment kind display data.
pub struct PaymentKindView {
    pub value: &'static str,
    pub label: &'static str,
    pub is_card: bool,
    pub selected: bool,
}

/// Payment step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub kinds: Vec<PaymentKindView>,
    pub cardholder_name: String,
    pub error: Option<String>,
    pub cart: CartView,
    pub steps: Vec<StepView>,
}

impl PaymentTemplate {
    fn new(
        state: &AppState,
        cart: &Cart,
        checkout: &Checkout,
        selected: PaymentKind,
        cardholder_name: String,
    ) -> Self {
        let kinds = PaymentKind::ALL
            .iter()
            .map(|&kind| PaymentKindView {
                value: kind.as_str(),
                label: kind.label(),
                is_card: kind.is_card(),
                selected: kind == selected,
            })
            .collect();
        Self {
            kinds,
            cardholder_name,
            error: None,
            cart: CartView::new(state, cart, checkout),
            steps: progress(CheckoutStep::Payment),
        }
    }
}

/// Display the payment step.
#[instrument(skip(state, session))]
pub async fn payment(State(state): State<AppState>, session: Session) -> Result<Response> {
    let (cart, checkout) = match enter(&session, CheckoutStep::Payment).await? {
        Ok(loaded) => loaded,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let selected = checkout
        .payment
        .as_ref()
        .map_or(PaymentKind::CreditCard, PaymentMethod::kind);
    let cardholder_name = match &checkout.payment {
        Some(
            PaymentMethod::CreditCard {
                cardholder_name, ..
            }
            | PaymentMethod::DebitCard {
                cardholder_name, ..
            },
        ) => cardholder_name.clone(),
        _ => checkout
            .address
            .as_ref()
            .map(|a| a.full_name.clone())
            .unwrap_or_default(),
    };

    Ok(PaymentTemplate::new(&state, &cart, &checkout, selected, cardholder_name).into_response())
}

/// Save the payment method.
///
/// Only the last four digits of a card number are kept.
#[instrument(skip(state, session, form))]
pub async fn save_payment(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let (cart, mut checkout) = match enter(&session, CheckoutStep::Payment).await? {
        Ok(loaded) => loaded,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let kind = form.payment_type.parse::<PaymentKind>();
    let result = kind
        .clone()
        .and_then(|kind| {
            PaymentMethod::new(
                kind,
                form.card_number.as_deref(),
                form.cardholder_name.as_deref(),
            )
        })
        .map_err(CheckoutError::from)
        .and_then(|method| checkout.set_payment(method));

    if let Err(error) = result {
        let mut page = PaymentTemplate::new(
            &state,
            &cart,
            &checkout,
            kind.unwrap_or(PaymentKind::CreditCard),
            form.cardholder_name.unwrap_or_default(),
        );
        page.error = Some(error.to_string());
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    session::save_checkout(&session, &checkout).await?;
    tracing::info!(payment_type = %form.payment_type, "Payment method saved");
    Ok(Redirect::to(CheckoutStep::Payment.next().path()).into_response())
}

// =============================================================================
// Review & placement
// =============================================================================

/// Review step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub address: Address,
    pub shipping_label: &'static str,
    pub shipping_estimate: &'static str,
    pub payment_summary: String,
    pub cart: CartView,
    pub steps: Vec<StepView>,
}

/// Display the review step.
#[instrument(skip(state, session))]
pub async fn review(State(state): State<AppState>, session: Session) -> Result<Response> {
    let (cart, checkout) = match enter(&session, CheckoutStep::Review).await? {
        Ok(loaded) => loaded,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let (Some(address), Some(payment)) = (checkout.address.clone(), checkout.payment.as_ref())
    else {
        return Ok(Redirect::to(CheckoutStep::Shipping.path()).into_response());
    };

    Ok(ReviewTemplate {
        address,
        shipping_label: checkout.shipping_option.label(),
        shipping_estimate: checkout.shipping_option.estimate(),
        payment_summary: payment.summary(),
        cart: CartView::new(&state, &cart, &checkout),
        steps: progress(CheckoutStep::Review),
    }
    .into_response())
}

/// Place the order.
///
/// Waits for the configured processing delay, then snapshots the cart into
/// an order, clears the cart and checkout, and shows the confirmation.
#[instrument(skip(state, session))]
pub async fn place_order(State(state): State<AppState>, session: Session) -> Result<Response> {
    let (mut cart, mut checkout) = match enter(&session, CheckoutStep::Review).await? {
        Ok(loaded) => loaded,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let delay = state.config().checkout_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let order = {
        let mut coupons = state.coupons_mut().await;
        checkout.refresh_coupon(&coupons);
        let order =
            checkout.place_order(&mut cart, state.tax_rate(), Utc::now(), &mut rand::rng())?;
        if let Some(code) = order.coupon_code.as_deref() {
            let uses = record_redemption(&mut coupons, code).map_err(CheckoutError::from)?;
            tracing::debug!(coupon = code, uses, "Coupon redeemed");
        }
        order
    };

    session::save_cart(&session, &cart).await?;
    session::save_checkout(&session, &checkout).await?;
    session::save_last_order(&session, &order).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", order.number.as_str())]),
    );
    tracing::info!(
        order_id = %order.number,
        total = %order.totals.total,
        items = order.item_count(),
        "Order placed"
    );

    Ok(Redirect::to(CheckoutStep::Review.next().path()).into_response())
}

/// Redirect to the furthest reachable checkout step.
#[instrument(skip(session))]
pub async fn start(session: Session) -> Result<Redirect> {
    let cart = session::load_cart(&session).await?;
    let checkout = session::load_checkout(&session).await?;
    Ok(Redirect::to(checkout.current_step(&cart).path()))
}

// =============================================================================
// Confirmation
// =============================================================================

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub order: Order,
    pub lines: Vec<CartLineView>,
    pub shipping_label: &'static str,
    pub shipping_estimate: &'static str,
    pub payment_summary: String,
}

/// Display the confirmation for the last placed order.
///
/// Once the confirmation window has passed, the order is forgotten and the
/// visitor is sent home.
#[instrument(skip(state, session))]
pub async fn success(State(state): State<AppState>, session: Session) -> Result<Response> {
    let Some(order) = session::load_last_order(&session).await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let age = Utc::now().signed_duration_since(order.placed_at);
    let expired = age
        .to_std()
        .is_ok_and(|age| age >= state.config().confirmation_ttl);
    if expired {
        session::clear_last_order(&session).await?;
        tracing::debug!(order_id = %order.number, "Confirmation window expired");
        return Ok(Redirect::to("/").into_response());
    }

    Ok(SuccessTemplate {
        lines: order.items.iter().map(CartLineView::from).collect(),
        shipping_label: order.shipping_option.label(),
        shipping_estimate: order.shipping_option.estimate(),
        payment_summary: order.payment.summary(),
        order,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_marks_steps() {
        let steps = progress(CheckoutStep::Payment);
        let states: Vec<_> = steps.iter().map(|s| s.state).collect();
        assert_eq!(states, ["complete", "current", "upcoming"]);
        assert_eq!(steps.first().map(|s| s.path), Some("/checkout/shipping"));
    }

    #[test]
    fn test_shipping_form_round_trips_address() {
        let mut checkout = Checkout::default();
        let form = ShippingForm::from_checkout(&checkout);
        assert_eq!(form.country, "US");
        assert_eq!(form.shipping_option, "standard");

        let filled = ShippingForm {
            full_name: "Ada Lovelace".to_string(),
            address_line1: "12 Analytical Row".to_string(),
            address_line2: String::new(),
            city: "Portland".to_string(),
            state: "OR".to_string(),
            postal_code: "97201".to_string(),
            country: "US".to_string(),
            phone: "503-555-0199".to_string(),
            shipping_option: "overnight".to_string(),
        };
        checkout
            .set_shipping(filled.address(), ShippingOption::Overnight)
            .ok();
        let again = ShippingForm::from_checkout(&checkout);
        assert_eq!(again.full_name, "Ada Lovelace");
        assert_eq!(again.address_line2, "");
        assert_eq!(again.shipping_option, "overnight");
    }
}
