//! Order totals.
//!
//! ```text
//! subtotal = Σ price × quantity
//! tax      = round_cents(subtotal × tax_rate)
//! shipping = price of the selected option, or 0 before one is chosen
//! discount = min(discount, subtotal)
//! total    = subtotal + shipping + tax − discount
//! ```
//!
//! Totals are derived, never stored on their own: they are recomputed from
//! the cart and checkout selections whenever a page needs them, and frozen
//! only when an order is placed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::checkout::ShippingOption;
use crate::types::Price;

/// Sales tax rate applied to the subtotal (8%).
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Computed order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub shipping: Price,
    pub tax: Price,
    pub discount: Price,
    pub total: Price,
}

impl OrderTotals {
    /// Compute totals for `items`.
    #[must_use]
    pub fn calculate(
        items: &[CartItem],
        shipping: Option<ShippingOption>,
        tax_rate: Decimal,
        discount: Price,
    ) -> Self {
        let subtotal: Price = items.iter().map(CartItem::line_total).sum();
        let shipping = shipping.map_or(Price::ZERO, ShippingOption::price);
        let tax = subtotal.scale(tax_rate).round_to_cents();
        let discount = discount.min(subtotal);
        let total = subtotal + shipping + tax - discount;

        Self {
            subtotal,
            shipping,
            tax,
            discount,
            total,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    fn items() -> Vec<CartItem> {
        vec![
            CartItem::from_product(&product(1, "Mug", 1_250, "home"), 2, None, None).unwrap(),
            CartItem::from_product(&product(2, "Throw", 5_999, "home"), 1, None, None).unwrap(),
        ]
    }

    #[test]
    fn test_total_identity_for_every_shipping_tier() {
        let items = items();
        for option in ShippingOption::ALL {
            for discount in [Price::ZERO, Price::from_cents(500)] {
                let totals =
                    OrderTotals::calculate(&items, Some(*option), DEFAULT_TAX_RATE, discount);
                assert_eq!(
                    totals.total,
                    totals.subtotal + totals.shipping + totals.tax - totals.discount
                );
                assert_eq!(totals.shipping, option.price());
            }
        }
    }

    #[test]
    fn test_known_values() {
        let totals = OrderTotals::calculate(
            &items(),
            Some(ShippingOption::Express),
            DEFAULT_TAX_RATE,
            Price::ZERO,
        );
        // 2 × 12.50 + 59.99 = 84.99; tax 6.7992 → 6.80
        assert_eq!(totals.subtotal, Price::from_cents(8_499));
        assert_eq!(totals.tax, Price::from_cents(680));
        assert_eq!(totals.shipping, Price::from_cents(999));
        assert_eq!(totals.total, Price::from_cents(8_499 + 680 + 999));
    }

    #[test]
    fn test_no_shipping_selected_yet() {
        let totals = OrderTotals::calculate(&items(), None, DEFAULT_TAX_RATE, Price::ZERO);
        assert_eq!(totals.shipping, Price::ZERO);
    }

    #[test]
    fn test_discount_is_capped_at_subtotal() {
        let totals = OrderTotals::calculate(
            &items(),
            Some(ShippingOption::Standard),
            DEFAULT_TAX_RATE,
            Price::from_cents(1_000_000),
        );
        assert_eq!(totals.discount, totals.subtotal);
        assert_eq!(totals.total, totals.shipping + totals.tax);
    }

    #[test]
    fn test_empty_cart() {
        let totals = OrderTotals::calculate(&[], None, DEFAULT_TAX_RATE, Price::ZERO);
        assert_eq!(totals, OrderTotals::default());
    }
}
