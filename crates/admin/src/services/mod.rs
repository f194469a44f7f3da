//! Business logic services for admin.
//!
//! # Services
//!
//! - `reports` - Sales summary computed from the order list

pub mod reports;

pub use reports::SalesReport;
