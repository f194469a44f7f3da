//! In-memory data store for the admin panel.
//!
//! The store is seeded from [`SeedData`] at start-up and lives behind a
//! `tokio::sync::RwLock` in [`AppState`](crate::state::AppState). Nothing is
//! written back anywhere; a restart restores the seed.
//!
//! # Repositories
//!
//! - [`products`] - Catalog products and categories
//! - [`orders`] - Orders and return requests
//! - [`marketing`] - Banners, coupons, discounts and email campaigns
//! - [`media`] - Media library assets
//! - [`settings`] - SEO, shipping and tax settings

pub mod marketing;
pub mod media;
pub mod orders;
pub mod products;
pub mod settings;

use std::fmt::Display;

use thiserror::Error;

use meridian_core::catalog::{Category, Product};
use meridian_core::marketing::{Banner, Coupon, Discount, EmailCampaign};
use meridian_core::media::MediaAsset;
use meridian_core::order::{Order, ReturnRequest};
use meridian_core::seed::SeedData;
use meridian_core::settings::StoreSettings;

pub use marketing::{NewBanner, NewCampaign, NewCoupon, NewDiscount};
pub use media::NewMediaAsset;
pub use products::ProductFilter;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Requested entity was not found.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Constraint violation (e.g., duplicate coupon code).
    #[error("{0}")]
    Conflict(String),

    /// The change is not allowed in the entity's current state.
    #[error("{0}")]
    InvalidState(String),
}

impl RepositoryError {
    fn not_found(kind: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

/// An entity stored in a list and addressed by a copyable id.
pub trait Record {
    type Id: Copy + PartialEq + Display;

    /// Entity name used in error messages.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
}

/// An entity with an on/off switch.
pub trait Toggle: Record {
    fn active_mut(&mut self) -> &mut bool;
}

macro_rules! impl_record {
    ($ty:ty, $id:ty, $kind:literal) => {
        impl Record for $ty {
            type Id = $id;
            const KIND: &'static str = $kind;

            fn id(&self) -> Self::Id {
                self.id
            }
        }
    };
    ($ty:ty, $id:ty, $kind:literal, toggle) => {
        impl_record!($ty, $id, $kind);

        impl Toggle for $ty {
            fn active_mut(&mut self) -> &mut bool {
                &mut self.active
            }
        }
    };
}

impl_record!(Product, meridian_core::ProductId, "product");
impl_record!(ReturnRequest, meridian_core::ReturnId, "return");
impl_record!(Banner, meridian_core::BannerId, "banner", toggle);
impl_record!(Coupon, meridian_core::CouponId, "coupon", toggle);
impl_record!(Discount, meridian_core::DiscountId, "discount", toggle);
impl_record!(EmailCampaign, meridian_core::CampaignId, "campaign");
impl_record!(MediaAsset, meridian_core::MediaId, "media asset");

fn find<R: Record>(items: &[R], id: R::Id) -> Result<&R> {
    items
        .iter()
        .find(|item| item.id() == id)
        .ok_or_else(|| RepositoryError::not_found(R::KIND, id))
}

fn find_mut<R: Record>(items: &mut [R], id: R::Id) -> Result<&mut R> {
    items
        .iter_mut()
        .find(|item| item.id() == id)
        .ok_or_else(|| RepositoryError::not_found(R::KIND, id))
}

fn remove<R: Record>(items: &mut Vec<R>, id: R::Id) -> Result<R> {
    let index = items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| RepositoryError::not_found(R::KIND, id))?;
    Ok(items.remove(index))
}

/// Flip the switch and return the new value.
fn toggle<R: Toggle>(items: &mut [R], id: R::Id) -> Result<bool> {
    let active = find_mut(items, id)?.active_mut();
    *active = !*active;
    Ok(*active)
}

fn set_active<R: Toggle>(items: &mut [R], id: R::Id, value: bool) -> Result<()> {
    *find_mut(items, id)?.active_mut() = value;
    Ok(())
}

/// Id allocator for one collection. Ids are never handed out twice, even
/// after the record holding the largest id is deleted.
#[derive(Debug, Clone, Copy)]
struct IdSequence {
    next: i32,
}

impl IdSequence {
    /// Start one past the largest id in `items`.
    fn after<R: Record>(items: &[R]) -> Self
    where
        R::Id: Into<i32>,
    {
        let max = items.iter().map(|item| item.id().into()).max().unwrap_or(0);
        Self { next: max + 1 }
    }

    /// Hand out the next id.
    fn issue(&mut self) -> i32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Sequences for the collections the admin can add to.
#[derive(Debug, Clone, Copy)]
struct Sequences {
    banners: IdSequence,
    coupons: IdSequence,
    discounts: IdSequence,
    campaigns: IdSequence,
    media: IdSequence,
}

/// Everything the admin panel reads and edits.
#[derive(Debug, Clone)]
pub struct AdminStore {
    categories: Vec<Category>,
    products: Vec<Product>,
    orders: Vec<Order>,
    returns: Vec<ReturnRequest>,
    banners: Vec<Banner>,
    coupons: Vec<Coupon>,
    discounts: Vec<Discount>,
    campaigns: Vec<EmailCampaign>,
    media: Vec<MediaAsset>,
    settings: StoreSettings,
    sequences: Sequences,
}

impl From<SeedData> for AdminStore {
    fn from(seed: SeedData) -> Self {
        let mut orders = seed.orders;
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        let sequences = Sequences {
            banners: IdSequence::after(&seed.banners),
            coupons: IdSequence::after(&seed.coupons),
            discounts: IdSequence::after(&seed.discounts),
            campaigns: IdSequence::after(&seed.campaigns),
            media: IdSequence::after(&seed.media),
        };
        Self {
            categories: seed.categories,
            products: seed.products,
            orders,
            returns: seed.returns,
            banners: seed.banners,
            coupons: seed.coupons,
            discounts: seed.discounts,
            campaigns: seed.campaigns,
            media: seed.media,
            settings: seed.settings,
            sequences,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use meridian_core::ProductId;

    use super::*;

    /// A store seeded with the built-in data.
    pub(crate) fn store() -> AdminStore {
        AdminStore::from(SeedData::load().unwrap())
    }

    #[test]
    fn test_orders_sorted_newest_first() {
        let store = store();
        let orders = store.orders();
        assert!(orders.windows(2).all(|w| w[0].placed_at >= w[1].placed_at));
    }

    #[test]
    fn test_generic_helpers() {
        let mut store = store();
        let mut products = IdSequence::after(&store.products);
        assert_eq!(products.issue(), 17);
        assert_eq!(products.issue(), 18);

        let err = find(&store.products, ProductId::new(999)).unwrap_err();
        assert_eq!(err.to_string(), "product 999 not found");

        let removed = remove(&mut store.products, ProductId::new(1)).unwrap();
        assert_eq!(removed.id, ProductId::new(1));
        assert!(find(&store.products, ProductId::new(1)).is_err());
    }
}
