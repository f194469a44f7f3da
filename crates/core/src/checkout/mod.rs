//! Checkout state machine.
//!
//! Checkout walks `Cart → Shipping → Payment → Review → Success`. Visitors
//! may ask for any step, but [`Checkout::required_step`] sends them back to
//! the earliest step whose prerequisites are missing:
//!
//! | requested | empty cart | no address | no payment |
//! |-----------|------------|------------|------------|
//! | shipping  | cart       |            |            |
//! | payment   | cart       | shipping   |            |
//! | review    | cart       | shipping   | payment    |
//!
//! Placing an order freezes the totals, clears the cart and resets the
//! checkout so the next visit starts fresh.

mod address;
mod payment;
mod shipping;

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use address::{Address, AddressError};
pub use payment::{PaymentError, PaymentKind, PaymentMethod};
pub use shipping::ShippingOption;

use crate::cart::Cart;
use crate::marketing::{Coupon, CouponError, find_coupon};
use crate::order::Order;
use crate::totals::OrderTotals;
use crate::types::{OrderNumber, OrderStatus, Price};

/// A checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Cart,
    Shipping,
    Payment,
    Review,
    Success,
}

impl CheckoutStep {
    /// Steps shown in the progress indicator.
    pub const PROGRESS: &'static [Self] = &[Self::Shipping, Self::Payment, Self::Review];

    /// Machine name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Review => "review",
            Self::Success => "success",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cart => "Cart",
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
            Self::Success => "Confirmation",
        }
    }

    /// Storefront path that renders this step.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Cart => "/cart",
            Self::Shipping => "/checkout/shipping",
            Self::Payment => "/checkout/payment",
            Self::Review => "/checkout/review",
            Self::Success => "/checkout/success",
        }
    }

    /// The step after this one. `Success` is terminal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Cart => Self::Shipping,
            Self::Shipping => Self::Payment,
            Self::Payment => Self::Review,
            Self::Review | Self::Success => Self::Success,
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckoutStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(Self::Cart),
            "shipping" => Ok(Self::Shipping),
            "payment" => Ok(Self::Payment),
            "review" => Ok(Self::Review),
            "success" => Ok(Self::Success),
            _ => Err(format!("invalid checkout step: {s}")),
        }
    }
}

/// Errors raised while moving through checkout.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,
    #[error("add a shipping address first")]
    MissingAddress,
    #[error("choose a payment method first")]
    MissingPayment,
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Coupon(#[from] CouponError),
}

/// Selections collected during checkout.
///
/// Lives in the visitor's session next to the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub shipping_option: ShippingOption,
    #[serde(default)]
    pub payment: Option<PaymentMethod>,
    #[serde(default)]
    pub coupon: Option<Coupon>,
}

impl Checkout {
    /// Record the shipping address and tier.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is incomplete; the checkout is unchanged.
    pub fn set_shipping(
        &mut self,
        address: Address,
        option: ShippingOption,
    ) -> Result<(), CheckoutError> {
        let address = address.normalized();
        address.validate()?;
        self.address = Some(address);
        self.shipping_option = option;
        Ok(())
    }

    /// Record the payment method.
    ///
    /// # Errors
    ///
    /// Returns `MissingAddress` if shipping has not been completed.
    pub fn set_payment(&mut self, payment: PaymentMethod) -> Result<(), CheckoutError> {
        if self.address.is_none() {
            return Err(CheckoutError::MissingAddress);
        }
        self.payment = Some(payment);
        Ok(())
    }

    /// Apply `coupon` after checking it against the cart.
    ///
    /// # Errors
    ///
    /// Returns why the coupon cannot be used; any previous coupon is kept.
    pub fn apply_coupon(
        &mut self,
        coupon: &Coupon,
        cart: &Cart,
        now: DateTime<Utc>,
    ) -> Result<Price, CheckoutError> {
        let off = coupon.discount_for(cart.subtotal(), now)?;
        self.coupon = Some(coupon.clone());
        Ok(off)
    }

    /// Replace the applied coupon with its current state from `coupons`, so
    /// redemptions made since it was applied count against its limit. A
    /// coupon that no longer exists is dropped.
    pub fn refresh_coupon(&mut self, coupons: &[Coupon]) {
        self.coupon = self
            .coupon
            .take()
            .and_then(|applied| find_coupon(coupons, &applied.code).ok().cloned());
    }

    /// Drop the applied coupon.
    pub fn remove_coupon(&mut self) {
        self.coupon = None;
    }

    /// The furthest step the visitor may currently see.
    #[must_use]
    pub fn current_step(&self, cart: &Cart) -> CheckoutStep {
        self.required_step(CheckoutStep::Review, cart)
    }

    /// Resolve a requested step against the guards.
    ///
    /// Returns `requested` when its prerequisites hold, otherwise the
    /// earliest step that still needs input.
    #[must_use]
    pub fn required_step(&self, requested: CheckoutStep, cart: &Cart) -> CheckoutStep {
        if requested == CheckoutStep::Cart || requested == CheckoutStep::Success {
            return requested;
        }
        if cart.is_empty() {
            return CheckoutStep::Cart;
        }
        if requested >= CheckoutStep::Payment && self.address.is_none() {
            return CheckoutStep::Shipping;
        }
        if requested >= CheckoutStep::Review && self.payment.is_none() {
            return CheckoutStep::Payment;
        }
        requested
    }

    /// Discount from the applied coupon, or zero if it no longer qualifies.
    #[must_use]
    pub fn discount(&self, cart: &Cart, now: DateTime<Utc>) -> Price {
        self.coupon
            .as_ref()
            .and_then(|coupon| coupon.discount_for(cart.subtotal(), now).ok())
            .unwrap_or(Price::ZERO)
    }

    /// Current totals. Shipping is counted once an address is on file.
    #[must_use]
    pub fn totals(&self, cart: &Cart, tax_rate: Decimal, now: DateTime<Utc>) -> OrderTotals {
        let shipping = self.address.as_ref().map(|_| self.shipping_option);
        OrderTotals::calculate(cart.items(), shipping, tax_rate, self.discount(cart, now))
    }

    /// Place the order.
    ///
    /// On success the cart is emptied and the checkout reset. On error both
    /// are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or a prerequisite is missing.
    pub fn place_order(
        &mut self,
        cart: &mut Cart,
        tax_rate: Decimal,
        placed_at: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let address = self.address.clone().ok_or(CheckoutError::MissingAddress)?;
        let payment = self.payment.clone().ok_or(CheckoutError::MissingPayment)?;

        let totals = self.totals(cart, tax_rate, placed_at);
        let coupon_code = self
            .coupon
            .as_ref()
            .filter(|_| !totals.discount.is_zero())
            .map(|coupon| coupon.code.clone());

        let order = Order {
            number: OrderNumber::generate(placed_at.timestamp_millis(), rng),
            items: cart.items().to_vec(),
            shipping_address: address,
            shipping_option: self.shipping_option,
            payment,
            totals,
            coupon_code,
            status: OrderStatus::Pending,
            placed_at,
        };

        cart.clear();
        *self = Self::default();
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::cart::CartItem;
    use crate::catalog::tests::product;
    use crate::marketing::{DiscountValue, record_redemption};
    use crate::totals::DEFAULT_TAX_RATE;
    use crate::types::CouponId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem::from_product(&product(1, "Mug", 1_250, "home"), 2, None, None).unwrap());
        cart
    }

    fn card() -> PaymentMethod {
        PaymentMethod::new(PaymentKind::CreditCard, Some("4242424242424242"), Some("Ada")).unwrap()
    }

    fn ready() -> Checkout {
        let mut checkout = Checkout::default();
        checkout
            .set_shipping(address::tests::valid(), ShippingOption::Express)
            .unwrap();
        checkout.set_payment(card()).unwrap();
        checkout
    }

    #[test]
    fn test_empty_cart_always_goes_back_to_cart() {
        let checkout = ready();
        for step in [CheckoutStep::Shipping, CheckoutStep::Payment, CheckoutStep::Review] {
            assert_eq!(checkout.required_step(step, &Cart::new()), CheckoutStep::Cart);
        }
    }

    #[test]
    fn test_guards_without_address() {
        let checkout = Checkout::default();
        let cart = cart();
        assert_eq!(
            checkout.required_step(CheckoutStep::Shipping, &cart),
            CheckoutStep::Shipping
        );
        assert_eq!(
            checkout.required_step(CheckoutStep::Payment, &cart),
            CheckoutStep::Shipping
        );
        assert_eq!(
            checkout.required_step(CheckoutStep::Review, &cart),
            CheckoutStep::Shipping
        );
    }

    #[test]
    fn test_review_without_payment_goes_to_payment() {
        let mut checkout = Checkout::default();
        checkout
            .set_shipping(address::tests::valid(), ShippingOption::Standard)
            .unwrap();
        assert_eq!(
            checkout.required_step(CheckoutStep::Review, &cart()),
            CheckoutStep::Payment
        );
        assert_eq!(checkout.current_step(&cart()), CheckoutStep::Payment);
        assert_eq!(ready().current_step(&cart()), CheckoutStep::Review);
    }

    #[test]
    fn test_payment_requires_address() {
        let mut checkout = Checkout::default();
        assert_eq!(checkout.set_payment(card()), Err(CheckoutError::MissingAddress));
    }

    #[test]
    fn test_invalid_address_leaves_checkout_unchanged() {
        let mut checkout = Checkout::default();
        let mut address = address::tests::valid();
        address.full_name = String::new();
        assert_eq!(
            checkout.set_shipping(address, ShippingOption::Overnight),
            Err(CheckoutError::Address(AddressError::MissingField("Full name")))
        );
        assert_eq!(checkout, Checkout::default());
    }

    #[test]
    fn test_shipping_counted_once_address_known() {
        let cart = cart();
        let empty = Checkout::default().totals(&cart, DEFAULT_TAX_RATE, now());
        assert_eq!(empty.shipping, Price::ZERO);
        let express = ready().totals(&cart, DEFAULT_TAX_RATE, now());
        assert_eq!(express.shipping, ShippingOption::Express.price());
    }

    #[test]
    fn test_place_order_clears_cart_and_resets() {
        let mut checkout = ready();
        let mut cart = cart();
        let mut rng = StdRng::seed_from_u64(7);

        let order = checkout
            .place_order(&mut cart, DEFAULT_TAX_RATE, now(), &mut rng)
            .unwrap();

        assert!(cart.is_empty());
        assert_eq!(checkout, Checkout::default());
        assert!(
            order
                .number
                .as_str()
                .starts_with(&format!("ORD{}", now().timestamp_millis()))
        );
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.totals.subtotal, Price::from_cents(2_500));
        assert_eq!(
            order.totals.total,
            order.totals.subtotal + order.totals.shipping + order.totals.tax
        );
    }

    #[test]
    fn test_place_order_failure_is_atomic() {
        let mut checkout = Checkout::default();
        checkout
            .set_shipping(address::tests::valid(), ShippingOption::Standard)
            .unwrap();
        let mut cart = cart();
        let before = (checkout.clone(), cart.clone());
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(
            checkout.place_order(&mut cart, DEFAULT_TAX_RATE, now(), &mut rng),
            Err(CheckoutError::MissingPayment)
        );
        assert_eq!((checkout, cart), before);

        let mut empty = Cart::new();
        assert_eq!(
            ready().place_order(&mut empty, DEFAULT_TAX_RATE, now(), &mut rng),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_coupon_discount_recorded_on_order() {
        let coupon = Coupon {
            id: CouponId::new(1),
            code: "WELCOME10".to_string(),
            description: "10% off".to_string(),
            value: DiscountValue::Percentage(Decimal::from(10)),
            min_subtotal: None,
            usage_limit: None,
            usage_count: 0,
            active: true,
            expires_at: None,
        };
        let mut checkout = ready();
        let mut cart = cart();
        assert_eq!(
            checkout.apply_coupon(&coupon, &cart, now()),
            Ok(Price::from_cents(250))
        );

        let mut rng = StdRng::seed_from_u64(1);
        let order = checkout
            .place_order(&mut cart, DEFAULT_TAX_RATE, now(), &mut rng)
            .unwrap();
        assert_eq!(order.totals.discount, Price::from_cents(250));
        assert_eq!(order.coupon_code.as_deref(), Some("WELCOME10"));
    }

    #[test]
    fn test_coupon_at_usage_limit_stops_discounting() {
        let mut coupons = vec![Coupon {
            id: CouponId::new(1),
            code: "LAST1".to_string(),
            description: "One left".to_string(),
            value: DiscountValue::Percentage(Decimal::from(10)),
            min_subtotal: None,
            usage_limit: Some(1),
            usage_count: 0,
            active: true,
            expires_at: None,
        }];
        let mut first = ready();
        let mut second = ready();
        first.apply_coupon(&coupons[0], &cart(), now()).unwrap();
        second.apply_coupon(&coupons[0], &cart(), now()).unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        first.refresh_coupon(&coupons);
        let order = first
            .place_order(&mut cart(), DEFAULT_TAX_RATE, now(), &mut rng)
            .unwrap();
        let code = order.coupon_code.unwrap();
        assert_eq!(record_redemption(&mut coupons, &code), Ok(1));

        second.refresh_coupon(&coupons);
        let order = second
            .place_order(&mut cart(), DEFAULT_TAX_RATE, now(), &mut rng)
            .unwrap();
        assert_eq!(order.totals.discount, Price::ZERO);
        assert_eq!(order.coupon_code, None);

        let mut gone = ready();
        gone.apply_coupon(&coupons[0], &cart(), now()).unwrap_err();
        gone.coupon = Some(coupons[0].clone());
        gone.refresh_coupon(&[]);
        assert!(gone.coupon.is_none());
    }

    #[test]
    fn test_step_navigation() {
        assert_eq!(CheckoutStep::Shipping.next(), CheckoutStep::Payment);
        assert_eq!(CheckoutStep::Review.next(), CheckoutStep::Success);
        assert_eq!("review".parse::<CheckoutStep>(), Ok(CheckoutStep::Review));
        assert_eq!(CheckoutStep::Payment.path(), "/checkout/payment");
    }
}
