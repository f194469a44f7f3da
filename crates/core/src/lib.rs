//! Meridian Core - Domain library.
//!
//! This crate provides the types and rules shared by the Meridian binaries:
//! - `storefront` - Public catalog, cart and checkout
//! - `admin` - Back-office for marketing, media, orders and settings
//!
//! # Architecture
//!
//! The core crate contains types, pure business rules and the embedded seed
//! data - no HTTP, no sessions, no clocks. Callers pass in the current time and
//! a random source where a rule needs them, which keeps every rule testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and statuses
//! - [`catalog`] - Products, categories and listing queries
//! - [`cart`] - Cart lines and quantity bounds
//! - [`checkout`] - The checkout step machine and its form data
//! - [`totals`] - Order totals calculation
//! - [`order`] - Placed orders and return requests
//! - [`marketing`] - Banners, coupons, discounts and email campaigns
//! - [`media`] - Media library assets
//! - [`settings`] - Store SEO, shipping and tax settings
//! - [`seed`] - Mock data embedded at compile time

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod marketing;
pub mod media;
pub mod order;
pub mod seed;
pub mod settings;
pub mod totals;
pub mod types;

pub use types::*;
