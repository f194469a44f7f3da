//! Built-in mock data.
//!
//! Both the storefront and the admin boot from this data set; nothing is
//! persisted, so every restart begins from the same state.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::catalog::{Catalog, Category, Product};
use crate::marketing::{Banner, Coupon, Discount, EmailCampaign};
use crate::media::MediaAsset;
use crate::order::{Order, ReturnRequest};
use crate::settings::StoreSettings;

const CATEGORIES: &str = include_str!("data/categories.json");
const PRODUCTS: &str = include_str!("data/products.json");
const ORDERS: &str = include_str!("data/orders.json");
const RETURNS: &str = include_str!("data/returns.json");
const MARKETING: &str = include_str!("data/marketing.json");
const MEDIA: &str = include_str!("data/media.json");
const SETTINGS: &str = include_str!("data/settings.json");

/// Error loading seed data.
#[derive(thiserror::Error, Debug)]
#[error("failed to parse seed file {file}: {source}")]
pub struct SeedError {
    pub file: &'static str,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Deserialize)]
struct MarketingSeed {
    banners: Vec<Banner>,
    coupons: Vec<Coupon>,
    discounts: Vec<Discount>,
    campaigns: Vec<EmailCampaign>,
}

/// Everything the mock store starts with.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
    pub returns: Vec<ReturnRequest>,
    pub banners: Vec<Banner>,
    pub coupons: Vec<Coupon>,
    pub discounts: Vec<Discount>,
    pub campaigns: Vec<EmailCampaign>,
    pub media: Vec<MediaAsset>,
    pub settings: StoreSettings,
}

fn parse<T: DeserializeOwned>(file: &'static str, raw: &str) -> Result<T, SeedError> {
    serde_json::from_str(raw).map_err(|source| SeedError { file, source })
}

impl SeedData {
    /// Parse the embedded data set.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first file that fails to parse.
    pub fn load() -> Result<Self, SeedError> {
        let marketing: MarketingSeed = parse("marketing.json", MARKETING)?;
        Ok(Self {
            categories: parse("categories.json", CATEGORIES)?,
            products: parse("products.json", PRODUCTS)?,
            orders: parse("orders.json", ORDERS)?,
            returns: parse("returns.json", RETURNS)?,
            banners: marketing.banners,
            coupons: marketing.coupons,
            discounts: marketing.discounts,
            campaigns: marketing.campaigns,
            media: parse("media.json", MEDIA)?,
            settings: parse("settings.json", SETTINGS)?,
        })
    }

    /// Build a catalog from the seeded products and categories.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.products.clone(), self.categories.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::checkout::ShippingOption;
    use crate::totals::OrderTotals;

    #[test]
    fn test_seed_parses() {
        let seed = SeedData::load().unwrap();
        assert_eq!(seed.categories.len(), 4);
        assert_eq!(seed.products.len(), 16);
        assert!(!seed.orders.is_empty());
        assert!(!seed.coupons.is_empty());
        assert!(!seed.media.is_empty());
        assert!(seed.settings.tax.validate().is_ok());
    }

    #[test]
    fn test_ids_are_unique_and_categories_exist() {
        let seed = SeedData::load().unwrap();
        let ids: HashSet<_> = seed.products.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), seed.products.len());
        for product in &seed.products {
            assert!(
                seed.categories.iter().any(|c| c.slug == product.category),
                "{} has unknown category {}",
                product.name,
                product.category
            );
        }
    }

    #[test]
    fn test_seeded_order_totals_are_consistent() {
        let seed = SeedData::load().unwrap();
        for order in &seed.orders {
            let recomputed = OrderTotals::calculate(
                &order.items,
                Some(order.shipping_option),
                seed.settings.tax.rate,
                order.totals.discount,
            );
            assert_eq!(recomputed, order.totals, "order {}", order.number);
            assert_eq!(order.totals.shipping, ShippingOption::price(order.shipping_option));
        }
    }
}
