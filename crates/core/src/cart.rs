//! Shopping cart.
//!
//! A cart line is keyed by product plus the chosen size and colour. Adding the
//! same combination again merges into the existing line. Every quantity is
//! kept inside `[1, min(MAX_QUANTITY_PER_LINE, stock)]`.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Price, ProductId};

/// Most units of one line a visitor may buy, regardless of stock.
pub const MAX_QUANTITY_PER_LINE: u32 = 10;

/// Errors returned by cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product has no stock.
    #[error("{0} is out of stock")]
    OutOfStock(String),
    /// No line with this ID is in the cart.
    #[error("cart line not found: {0}")]
    LineNotFound(String),
    /// The chosen size or colour is not offered for the product.
    #[error("{option} '{value}' is not available for this product")]
    InvalidOption {
        /// `size` or `color`.
        option: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Largest quantity allowed for a line with `stock` units available.
#[must_use]
pub fn max_quantity(stock: u32) -> u32 {
    stock.clamp(1, MAX_QUANTITY_PER_LINE)
}

/// Clamp a requested quantity into `[1, max_quantity(stock)]`.
#[must_use]
pub fn clamp_quantity(requested: u32, stock: u32) -> u32 {
    requested.clamp(1, max_quantity(stock))
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub original_price: Option<Price>,
    pub quantity: u32,
    pub image: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Stock ceiling captured when the line was added.
    pub stock: u32,
}

impl CartItem {
    /// Build a cart line for `product`.
    ///
    /// When the product offers sizes or colours and none is chosen, the first
    /// option is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is out of stock or the chosen size or
    /// colour is not offered.
    pub fn from_product(
        product: &Product,
        quantity: u32,
        size: Option<&str>,
        color: Option<&str>,
    ) -> Result<Self, CartError> {
        if !product.in_stock() {
            return Err(CartError::OutOfStock(product.name.clone()));
        }
        let size = pick_option("size", &product.sizes, size)?;
        let color = pick_option("color", &product.colors, color)?;

        Ok(Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            original_price: product.original_price,
            quantity: clamp_quantity(quantity, product.stock),
            image: product.image.clone(),
            size,
            color,
            stock: product.stock,
        })
    }

    /// Stable identifier for this line within a cart.
    ///
    /// Size and colour are form-encoded, so the `:` separator never appears
    /// inside a component.
    #[must_use]
    pub fn line_id(&self) -> String {
        format!(
            "{}:{}:{}",
            self.product_id,
            encode_option(self.size.as_deref()),
            encode_option(self.color.as_deref())
        )
    }

    /// Whether `other` is the same product with the same size and colour.
    #[must_use]
    pub fn same_variant(&self, other: &Self) -> bool {
        self.product_id == other.product_id && self.size == other.size && self.color == other.color
    }

    /// Largest quantity this line may hold.
    #[must_use]
    pub fn max_quantity(&self) -> u32 {
        max_quantity(self.stock)
    }

    /// `price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

fn encode_option(value: Option<&str>) -> String {
    value
        .map(|v| url::form_urlencoded::byte_serialize(v.as_bytes()).collect())
        .unwrap_or_default()
}

fn pick_option(
    option: &'static str,
    offered: &[String],
    chosen: Option<&str>,
) -> Result<Option<String>, CartError> {
    match chosen.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) if offered.iter().any(|o| o == value) => Ok(Some(value.to_string())),
        Some(value) => Err(CartError::InvalidOption {
            option,
            value: value.to_string(),
        }),
        None => Ok(offered.first().cloned()),
    }
}

/// A visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The cart lines, in the order they were added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// `Σ price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add a line, merging with an existing line for the same product options.
    ///
    /// Returns the resulting quantity of the affected line.
    pub fn add(&mut self, item: CartItem) -> u32 {
        if let Some(existing) = self.items.iter_mut().find(|i| i.same_variant(&item)) {
            existing.stock = item.stock;
            existing.quantity =
                clamp_quantity(existing.quantity.saturating_add(item.quantity), item.stock);
            existing.quantity
        } else {
            let quantity = item.quantity;
            self.items.push(item);
            quantity
        }
    }

    /// Set a line's quantity, clamped to the line's bounds.
    ///
    /// Returns the quantity actually stored.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if no line has this ID.
    pub fn set_quantity(&mut self, line_id: &str, quantity: u32) -> Result<u32, CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.line_id() == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;
        item.quantity = clamp_quantity(quantity, item.stock);
        Ok(item.quantity)
    }

    /// Step a line's quantity up or down by one, within bounds.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if no line has this ID.
    pub fn step_quantity(&mut self, line_id: &str, increase: bool) -> Result<u32, CartError> {
        let current = self
            .items
            .iter()
            .find(|i| i.line_id() == line_id)
            .map(|i| i.quantity)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;
        let next = if increase {
            current.saturating_add(1)
        } else {
            current.saturating_sub(1)
        };
        self.set_quantity(line_id, next)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if no line has this ID.
    pub fn remove(&mut self, line_id: &str) -> Result<CartItem, CartError> {
        let index = self
            .items
            .iter()
            .position(|i| i.line_id() == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    fn tee() -> Product {
        let mut p = product(7, "Cotton Tee", 2_400, "apparel");
        p.sizes = vec!["S".into(), "M".into(), "L".into()];
        p.colors = vec!["Black".into(), "White".into()];
        p.stock = 4;
        p
    }

    #[test]
    fn test_quantity_bounds() {
        assert_eq!(max_quantity(0), 1);
        assert_eq!(max_quantity(3), 3);
        assert_eq!(max_quantity(50), 10);
        for stock in [1, 3, 10, 50] {
            for requested in [0, 1, 5, 11, 100] {
                let q = clamp_quantity(requested, stock);
                assert!(q >= 1);
                assert!(q <= MAX_QUANTITY_PER_LINE.min(stock));
            }
        }
    }

    #[test]
    fn test_from_product_defaults_and_validates_options() {
        let item = CartItem::from_product(&tee(), 2, None, None).unwrap();
        assert_eq!(item.size.as_deref(), Some("S"));
        assert_eq!(item.color.as_deref(), Some("Black"));
        assert_eq!(item.line_id(), "7:S:Black");

        let err = CartItem::from_product(&tee(), 1, Some("XXL"), None).unwrap_err();
        assert!(matches!(err, CartError::InvalidOption { option: "size", .. }));
    }

    #[test]
    fn test_out_of_stock() {
        let mut sold_out = tee();
        sold_out.stock = 0;
        assert_eq!(
            CartItem::from_product(&sold_out, 1, None, None),
            Err(CartError::OutOfStock("Cotton Tee".to_string()))
        );
    }

    #[test]
    fn test_add_merges_and_clamps_to_stock() {
        let mut cart = Cart::new();
        cart.add(CartItem::from_product(&tee(), 3, Some("M"), Some("White")).unwrap());
        let merged = cart.add(CartItem::from_product(&tee(), 3, Some("M"), Some("White")).unwrap());
        assert_eq!(merged, 4);
        assert_eq!(cart.items().len(), 1);

        cart.add(CartItem::from_product(&tee(), 1, Some("L"), Some("White")).unwrap());
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_hyphenated_variants_stay_separate() {
        let mut p = tee();
        p.sizes = vec!["XS".into(), "XS-S".into()];
        p.colors = vec!["Off".into(), "S-Off".into()];

        let mut cart = Cart::new();
        cart.add(CartItem::from_product(&p, 1, Some("XS-S"), Some("Off")).unwrap());
        cart.add(CartItem::from_product(&p, 2, Some("XS"), Some("S-Off")).unwrap());
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[1].size.as_deref(), Some("XS"));
        assert_eq!(cart.items()[1].color.as_deref(), Some("S-Off"));

        let first = cart.items()[0].line_id();
        let second = cart.items()[1].line_id();
        assert_ne!(first, second);

        assert_eq!(cart.set_quantity(&second, 3).unwrap(), 3);
        assert_eq!(cart.items()[0].quantity, 1);
        cart.remove(&first).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].size.as_deref(), Some("XS"));
    }

    #[test]
    fn test_subtotal_is_sum_of_lines() {
        let mut cart = Cart::new();
        cart.add(CartItem::from_product(&tee(), 2, Some("S"), None).unwrap());
        cart.add(
            CartItem::from_product(&product(8, "Cap", 1_999, "accessories"), 3, None, None)
                .unwrap(),
        );
        let expected: Price = cart
            .items()
            .iter()
            .map(|i| i.price * i.quantity)
            .sum();
        assert_eq!(cart.subtotal(), expected);
        assert_eq!(cart.subtotal(), Price::from_cents(2 * 2_400 + 3 * 1_999));
    }

    #[test]
    fn test_stepper_never_leaves_bounds() {
        let mut cart = Cart::new();
        cart.add(CartItem::from_product(&tee(), 1, None, None).unwrap());
        let line = cart.items()[0].line_id();

        assert_eq!(cart.step_quantity(&line, false).unwrap(), 1);
        for _ in 0..10 {
            cart.step_quantity(&line, true).unwrap();
        }
        assert_eq!(cart.items()[0].quantity, 4);
        assert_eq!(cart.set_quantity(&line, 0).unwrap(), 1);
        assert_eq!(cart.set_quantity(&line, 99).unwrap(), 4);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(CartItem::from_product(&tee(), 1, None, None).unwrap());
        let line = cart.items()[0].line_id();
        assert!(cart.remove("nope").is_err());
        assert_eq!(cart.remove(&line).unwrap().product_id, ProductId::new(7));
        assert!(cart.is_empty());

        cart.add(CartItem::from_product(&tee(), 1, None, None).unwrap());
        cart.clear();
        assert_eq!(cart.subtotal(), Price::ZERO);
    }
}
