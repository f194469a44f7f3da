//! Application state shared across handlers.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use meridian_core::catalog::Catalog;
use meridian_core::marketing::{Banner, Coupon};
use meridian_core::seed::{SeedData, SeedError};
use meridian_core::settings::SeoSettings;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Only coupon redemption counts
/// change after start-up; per-visitor state (cart, checkout, last order)
/// lives in the session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    banners: Vec<Banner>,
    coupons: RwLock<Vec<Coupon>>,
    seo: SeoSettings,
    tax_rate: Decimal,
}

impl AppState {
    /// Create application state from a seed data set.
    #[must_use]
    pub fn new(config: StorefrontConfig, seed: SeedData) -> Self {
        let catalog = seed.catalog();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                banners: seed.banners,
                coupons: RwLock::new(seed.coupons),
                seo: seed.settings.seo,
                tax_rate: seed.settings.tax.rate,
            }),
        }
    }

    /// Create application state from the built-in seed data.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded seed data fails to parse.
    pub fn from_seed(config: StorefrontConfig) -> Result<Self, SeedError> {
        Ok(Self::new(config, SeedData::load()?))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// All banners; callers filter by placement and schedule.
    #[must_use]
    pub fn banners(&self) -> &[Banner] {
        &self.inner.banners
    }

    /// Coupons visitors may redeem.
    pub async fn coupons(&self) -> RwLockReadGuard<'_, Vec<Coupon>> {
        self.inner.coupons.read().await
    }

    /// Coupons, locked for recording redemptions.
    pub async fn coupons_mut(&self) -> RwLockWriteGuard<'_, Vec<Coupon>> {
        self.inner.coupons.write().await
    }

    /// Storefront SEO metadata.
    #[must_use]
    pub fn seo(&self) -> &SeoSettings {
        &self.inner.seo
    }

    /// Sales tax rate applied at checkout.
    #[must_use]
    pub fn tax_rate(&self) -> Decimal {
        self.inner.tax_rate
    }
}
