//! Product catalog and listing queries.
//!
//! Listing is a linear filter/sort/slice over the in-memory product list; the
//! catalog is small enough that no index is needed.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, ProductStatus};

/// Default number of products per listing page.
pub const DEFAULT_PER_PAGE: usize = 12;

/// Upper bound on products per listing page.
pub const MAX_PER_PAGE: usize = 48;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub image: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Pre-sale price, shown struck through when higher than `price`.
    #[serde(default)]
    pub original_price: Option<Price>,
    /// Category slug.
    pub category: String,
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Average review rating, 0.0 to 5.0.
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
    pub stock: u32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product is discounted from its original price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.original_price.is_some_and(|original| original > self.price)
    }

    /// Whether any units are available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether the product is visible on the storefront.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Case-insensitive substring match on name, description and tags.
    ///
    /// `needle` must already be lower-cased.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Most recently added first.
    #[default]
    Newest,
    /// Alphabetical by name.
    Name,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
    /// Highest rated first.
    Rating,
}

impl SortKey {
    /// All sort keys, in the order shown in the sort dropdown.
    pub const ALL: &'static [Self] = &[
        Self::Newest,
        Self::Name,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Rating,
    ];

    /// The query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Name => "name",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::Rating => "rating",
        }
    }

    /// Label for the sort dropdown.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Name => "Name",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::Rating => "Top Rated",
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        let primary = match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::Rating => b.rating.total_cmp(&a.rating),
        };
        // Stable tie-break so pages never shuffle between requests.
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("invalid sort key: {s}"))
    }
}

/// A product listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Free-text search; blank means no filter.
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    pub sort: SortKey,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            sort: SortKey::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of listing results.
#[derive(Debug, Clone)]
pub struct ProductPage<'a> {
    pub items: Vec<&'a Product>,
    /// Number of products matching the filters, across all pages.
    pub total: usize,
    /// The page actually returned, after clamping.
    pub page: usize,
    pub total_pages: usize,
}

impl ProductPage<'_> {
    /// Whether the query matched nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Whether there is a page after this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Filter, sort and paginate `products`.
///
/// The page is clamped into `1..=total_pages`, so an out-of-range page returns
/// the last page rather than nothing.
#[must_use]
pub fn search<'a, I>(products: I, query: &ProductQuery) -> ProductPage<'a>
where
    I: IntoIterator<Item = &'a Product>,
{
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_lowercase();
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|slug| !slug.is_empty());

    let mut matched: Vec<&Product> = products
        .into_iter()
        .filter(|product| category.is_none_or(|slug| product.category == slug))
        .filter(|product| product.matches_search(&needle))
        .collect();
    matched.sort_by(|a, b| query.sort.compare(a, b));

    let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
    let total = matched.len();
    let total_pages = total.div_ceil(per_page).max(1);
    let page = query.page.clamp(1, total_pages);

    let items = matched
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    ProductPage {
        items,
        total,
        page,
        total_pages,
    }
}

/// The product catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    categories: Vec<Category>,
}

impl Catalog {
    /// Create a catalog.
    #[must_use]
    pub const fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products,
            categories,
        }
    }

    /// All products, listed or not.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// All categories.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Look up a category by slug.
    #[must_use]
    pub fn category(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.slug == slug)
    }

    /// Look up a listed product by ID.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.listed().find(|product| product.id == id)
    }

    /// Run a listing query over listed products.
    #[must_use]
    pub fn search(&self, query: &ProductQuery) -> ProductPage<'_> {
        search(self.listed(), query)
    }

    /// Featured products, newest first.
    #[must_use]
    pub fn featured(&self, limit: usize) -> Vec<&Product> {
        let mut featured: Vec<&Product> = self.listed().filter(|p| p.featured).collect();
        featured.sort_by(|a, b| SortKey::Newest.compare(a, b));
        featured.truncate(limit);
        featured
    }

    /// Other listed products from the same category, highest rated first.
    #[must_use]
    pub fn related(&self, product: &Product, limit: usize) -> Vec<&Product> {
        let mut related: Vec<&Product> = self
            .listed()
            .filter(|p| p.category == product.category && p.id != product.id)
            .collect();
        related.sort_by(|a, b| SortKey::Rating.compare(a, b));
        related.truncate(limit);
        related
    }

    fn listed(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|product| product.is_listed())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use chrono::TimeZone;

    use super::*;

    pub(crate) fn product(id: i32, name: &str, cents: i64, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("The {name}"),
            price: Price::from_cents(cents),
            original_price: None,
            category: category.to_string(),
            image: format!("/static/img/{id}.jpg"),
            images: vec![],
            rating: 4.0,
            review_count: 0,
            stock: 25,
            sizes: vec![],
            colors: vec![],
            tags: vec![],
            featured: false,
            status: ProductStatus::Active,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::days(i64::from(id)),
        }
    }

    fn sample() -> Vec<Product> {
        let mut trail = product(3, "Trail Runner", 12_000, "shoes");
        trail.rating = 4.8;
        trail.tags = vec!["running".to_string()];
        let mut canvas = product(1, "canvas tote", 2_500, "bags");
        canvas.rating = 3.9;
        let mut linen = product(2, "Linen Shirt", 4_800, "apparel");
        linen.rating = 4.5;
        vec![trail, canvas, linen]
    }

    fn names(page: &ProductPage<'_>) -> Vec<String> {
        page.items.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_sort_keys() {
        let products = sample();
        let mut query = ProductQuery::default();

        assert_eq!(
            names(&search(&products, &query)),
            ["Trail Runner", "Linen Shirt", "canvas tote"]
        );
        query.sort = SortKey::Name;
        assert_eq!(
            names(&search(&products, &query)),
            ["canvas tote", "Linen Shirt", "Trail Runner"]
        );
        query.sort = SortKey::PriceAsc;
        assert_eq!(
            names(&search(&products, &query)),
            ["canvas tote", "Linen Shirt", "Trail Runner"]
        );
        query.sort = SortKey::PriceDesc;
        assert_eq!(
            names(&search(&products, &query)),
            ["Trail Runner", "Linen Shirt", "canvas tote"]
        );
        query.sort = SortKey::Rating;
        assert_eq!(
            names(&search(&products, &query)),
            ["Trail Runner", "Linen Shirt", "canvas tote"]
        );
    }

    #[test]
    fn test_search_is_case_insensitive_and_covers_tags() {
        let products = sample();
        let query = ProductQuery {
            search: Some("  RUNNING ".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(names(&search(&products, &query)), ["Trail Runner"]);
    }

    #[test]
    fn test_search_without_matches_is_empty() {
        let products = sample();
        let query = ProductQuery {
            search: Some("zeppelin".to_string()),
            ..ProductQuery::default()
        };
        let page = search(&products, &query);
        assert!(page.is_empty());
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_category_filter() {
        let products = sample();
        let query = ProductQuery {
            category: Some("bags".to_string()),
            ..ProductQuery::default()
        };
        assert_eq!(names(&search(&products, &query)), ["canvas tote"]);
    }

    #[test]
    fn test_pagination_slices_and_clamps() {
        let products: Vec<Product> = (1..=5)
            .map(|id| product(id, &format!("P{id}"), 1_000, "misc"))
            .collect();
        let mut query = ProductQuery {
            sort: SortKey::Name,
            per_page: 2,
            ..ProductQuery::default()
        };

        let first = search(&products, &query);
        assert_eq!(names(&first), ["P1", "P2"]);
        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next());

        query.page = 3;
        let last = search(&products, &query);
        assert_eq!(names(&last), ["P5"]);
        assert!(!last.has_next());

        query.page = 99;
        assert_eq!(search(&products, &query).page, 3);
    }

    #[test]
    fn test_catalog_hides_unlisted_products() {
        let mut products = sample();
        products[0].status = ProductStatus::Draft;
        let catalog = Catalog::new(products, vec![]);
        assert!(catalog.product(ProductId::new(3)).is_none());
        assert_eq!(catalog.search(&ProductQuery::default()).total, 2);
    }

    #[test]
    fn test_related_excludes_self() {
        let mut products = sample();
        products.push(product(4, "Court Sneaker", 9_000, "shoes"));
        let catalog = Catalog::new(products, vec![]);
        let trail = catalog.product(ProductId::new(3)).unwrap();
        let related = catalog.related(trail, 4);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].id, ProductId::new(4));
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("price-desc".parse::<SortKey>().unwrap(), SortKey::PriceDesc);
        assert!("cheapest".parse::<SortKey>().is_err());
    }
}
