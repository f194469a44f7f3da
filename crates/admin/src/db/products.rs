//! Product repository.

use meridian_core::catalog::{Category, Product};
use meridian_core::{ProductId, ProductStatus};

use super::{AdminStore, Result, find, find_mut, remove};

/// Product list filters, as read from the query string.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
}

impl ProductFilter {
    fn matches(&self, product: &Product, needle: &str) -> bool {
        self.status.is_none_or(|status| product.status == status)
            && self
                .category
                .as_deref()
                .filter(|slug| !slug.is_empty())
                .is_none_or(|slug| product.category == slug)
            && product.matches_search(needle)
    }
}

impl AdminStore {
    /// All categories.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// All products, drafts and archived included.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products matching `filter`, newest first.
    #[must_use]
    pub fn search_products(&self, filter: &ProductFilter) -> Vec<&Product> {
        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        let mut products: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| filter.matches(p, &needle))
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        products
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this id.
    pub fn product(&self, id: ProductId) -> Result<&Product> {
        find(&self.products, id)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this id.
    pub fn delete_product(&mut self, id: ProductId) -> Result<Product> {
        remove(&mut self.products, id)
    }

    /// Change a product's catalog status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no product has this id.
    pub fn set_product_status(&mut self, id: ProductId, status: ProductStatus) -> Result<()> {
        find_mut(&mut self.products, id)?.status = status;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::store;
    use super::*;

    #[test]
    fn test_filter_by_status_and_category() {
        let store = store();
        let drafts = store.search_products(&ProductFilter {
            status: Some(ProductStatus::Draft),
            ..ProductFilter::default()
        });
        assert!(!drafts.is_empty());
        assert!(drafts.iter().all(|p| p.status == ProductStatus::Draft));

        let footwear = store.search_products(&ProductFilter {
            category: Some("footwear".to_string()),
            ..ProductFilter::default()
        });
        assert!(!footwear.is_empty());
        assert!(footwear.iter().all(|p| p.category == "footwear"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let store = store();
        let hits = store.search_products(&ProductFilter {
            search: Some("  CHELSEA ".to_string()),
            ..ProductFilter::default()
        });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.first().unwrap().name, "Leather Chelsea Boot");
    }

    #[test]
    fn test_delete_and_status_change() {
        let mut store = store();
        let before = store.products().len();
        store.delete_product(ProductId::new(2)).unwrap();
        assert_eq!(store.products().len(), before - 1);
        assert!(store.delete_product(ProductId::new(2)).is_err());

        store
            .set_product_status(ProductId::new(3), ProductStatus::Archived)
            .unwrap();
        assert_eq!(
            store.product(ProductId::new(3)).unwrap().status,
            ProductStatus::Archived
        );
    }
}
