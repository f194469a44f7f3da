//! Data table component types.
//!
//! These types describe the list screens in the admin panel: which columns
//! to show, which filters sit above the table, which bulk actions the
//! selection bar offers and how rows are paged. The markup lives in
//! `templates/partials/table_toolbar.html` and `templates/partials/pagination.html`.

use meridian_core::catalog::Category;
use meridian_core::media::MediaKind;
use meridian_core::{CampaignStatus, OrderStatus, ProductStatus, ReturnStatus};
use serde::Serialize;

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Right-align numeric columns.
    pub numeric: bool,
}

impl TableColumn {
    /// Create a new text column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            numeric: false,
        }
    }

    /// Create a right-aligned numeric column.
    #[must_use]
    pub fn numeric(key: &str, label: &str) -> Self {
        Self {
            numeric: true,
            ..Self::new(key, label)
        }
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Text input filter.
    Text,
    /// Single-select dropdown.
    Select,
}

/// Filter definition for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct TableFilter {
    /// Query parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Placeholder text (for text inputs).
    pub placeholder: String,
    /// Available options (for selects).
    pub options: Vec<FilterOption>,
    /// Value currently applied, empty if none.
    pub value: String,
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            placeholder: placeholder.to_string(),
            options: vec![],
            value: String::new(),
        }
    }

    /// Create a select filter. An "All" option is implied.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            placeholder: String::new(),
            options,
            value: String::new(),
        }
    }

    /// Whether this is a text input.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.filter_type == FilterType::Text
    }
}

/// Bulk action definition for data tables.
#[derive(Debug, Clone, Serialize)]
pub struct BulkAction {
    /// Action key, posted as the `action` form field.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Whether this is a destructive action.
    pub destructive: bool,
}

impl BulkAction {
    /// Create a new bulk action.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            destructive: false,
        }
    }

    /// Mark this action as destructive.
    #[must_use]
    pub const fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Where the selection bar posts `{action, ids}`.
    pub bulk_url: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    /// Bulk action definitions.
    pub bulk_actions: Vec<BulkAction>,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str, bulk_url: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            bulk_url: bulk_url.to_string(),
            columns: vec![],
            filters: vec![],
            bulk_actions: vec![],
            empty_title: "No items found".to_string(),
            empty_description: None,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a bulk action.
    #[must_use]
    pub fn bulk_action(mut self, action: BulkAction) -> Self {
        self.bulk_actions.push(action);
        self
    }

    /// Set empty state text.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Record the value currently applied to the filter named `key`.
    #[must_use]
    pub fn with_value(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(filter) = self.filters.iter_mut().find(|f| f.key == key) {
            filter.value = value.unwrap_or_default().trim().to_string();
        }
        self
    }

    /// Whether the selection bar should render.
    #[must_use]
    pub fn has_bulk_actions(&self) -> bool {
        !self.bulk_actions.is_empty()
    }

    /// Whether the filter form should render.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Columns plus the selection checkbox, for `colspan` on empty rows.
    #[must_use]
    pub fn colspan(&self) -> usize {
        self.columns.len() + usize::from(self.has_bulk_actions())
    }
}

/// One page of rows plus the numbers the pager needs.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number, clamped to the last page.
    pub page: usize,
    pub total_pages: usize,
    /// Rows across all pages.
    pub total: usize,
}

impl<T> Page<T> {
    /// Slice `rows` into page `page` of `size` rows each.
    #[must_use]
    pub fn paginate(rows: Vec<T>, page: usize, size: usize) -> Self {
        let size = size.max(1);
        let total = rows.len();
        let total_pages = total.div_ceil(size).max(1);
        let page = page.clamp(1, total_pages);
        let items = rows.into_iter().skip((page - 1) * size).take(size).collect();
        Self {
            items,
            page,
            total_pages,
            total,
        }
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn prev(&self) -> usize {
        self.page.saturating_sub(1)
    }

    #[must_use]
    pub const fn next(&self) -> usize {
        self.page + 1
    }
}

// =============================================================================
// Table configurations
// =============================================================================

fn status_options<S>(
    all: &[S],
    value: fn(&S) -> &'static str,
    label: fn(&S) -> &'static str,
) -> Vec<FilterOption> {
    all.iter()
        .map(|s| FilterOption::new(value(s), label(s)))
        .collect()
}

/// Build the products table configuration.
#[must_use]
pub fn products_table_config(categories: &[Category]) -> DataTableConfig {
    DataTableConfig::new("products", "/products/bulk")
        .column(TableColumn::new("name", "Product"))
        .column(TableColumn::new("category", "Category"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::numeric("price", "Price"))
        .column(TableColumn::numeric("inventory", "Inventory"))
        .column(TableColumn::new("actions", ""))
        .filter(TableFilter::text("search", "Search", "Search by name or tag..."))
        .filter(TableFilter::select(
            "category",
            "Category",
            categories
                .iter()
                .map(|c| FilterOption::new(&c.slug, &c.name))
                .collect(),
        ))
        .filter(TableFilter::select(
            "status",
            "Status",
            status_options(ProductStatus::ALL, ProductStatus::as_str, ProductStatus::label),
        ))
        .bulk_action(BulkAction::new("activate", "Set active"))
        .bulk_action(BulkAction::new("archive", "Archive"))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .empty_state(
            "No products found",
            Some("Try adjusting your search or filters"),
        )
}

/// Build the orders table configuration.
#[must_use]
pub fn orders_table_config() -> DataTableConfig {
    DataTableConfig::new("orders", "")
        .column(TableColumn::new("number", "Order"))
        .column(TableColumn::new("placed", "Placed"))
        .column(TableColumn::new("customer", "Customer"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::numeric("items", "Items"))
        .column(TableColumn::numeric("total", "Total"))
        .filter(TableFilter::text(
            "search",
            "Search",
            "Order number, customer or city...",
        ))
        .filter(TableFilter::select(
            "status",
            "Status",
            status_options(OrderStatus::ALL, OrderStatus::as_str, OrderStatus::label),
        ))
        .empty_state("No orders found", Some("Try adjusting your search or filters"))
}

/// Build the returns table configuration.
#[must_use]
pub fn returns_table_config() -> DataTableConfig {
    DataTableConfig::new("returns", "")
        .column(TableColumn::new("id", "Return"))
        .column(TableColumn::new("order", "Order"))
        .column(TableColumn::new("reason", "Reason"))
        .column(TableColumn::new("requested", "Requested"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::new("actions", ""))
        .filter(TableFilter::select(
            "status",
            "Status",
            status_options(ReturnStatus::ALL, ReturnStatus::as_str, ReturnStatus::label),
        ))
        .empty_state("No return requests", None)
}

/// Build the banners table configuration.
#[must_use]
pub fn banners_table_config() -> DataTableConfig {
    DataTableConfig::new("banners", "/marketing/banners/bulk")
        .column(TableColumn::new("title", "Banner"))
        .column(TableColumn::new("placement", "Placement"))
        .column(TableColumn::new("schedule", "Schedule"))
        .column(TableColumn::new("active", "Active"))
        .column(TableColumn::new("actions", ""))
        .bulk_action(BulkAction::new("activate", "Activate"))
        .bulk_action(BulkAction::new("deactivate", "Deactivate"))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .empty_state("No banners yet", Some("Create one to feature it on the storefront"))
}

/// Build the coupons table configuration.
#[must_use]
pub fn coupons_table_config() -> DataTableConfig {
    DataTableConfig::new("coupons", "/marketing/coupons/bulk")
        .column(TableColumn::new("code", "Code"))
        .column(TableColumn::new("value", "Discount"))
        .column(TableColumn::new("usage", "Usage"))
        .column(TableColumn::new("expires", "Expires"))
        .column(TableColumn::new("active", "Active"))
        .column(TableColumn::new("actions", ""))
        .bulk_action(BulkAction::new("activate", "Activate"))
        .bulk_action(BulkAction::new("deactivate", "Deactivate"))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .empty_state("No coupons yet", None)
}

/// Build the discounts table configuration.
#[must_use]
pub fn discounts_table_config() -> DataTableConfig {
    DataTableConfig::new("discounts", "/marketing/discounts/bulk")
        .column(TableColumn::new("name", "Discount"))
        .column(TableColumn::new("value", "Value"))
        .column(TableColumn::new("scope", "Applies to"))
        .column(TableColumn::new("state", "State"))
        .column(TableColumn::new("actions", ""))
        .bulk_action(BulkAction::new("activate", "Activate"))
        .bulk_action(BulkAction::new("deactivate", "Deactivate"))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .empty_state("No discounts yet", None)
}

/// Build the email campaigns table configuration.
#[must_use]
pub fn campaigns_table_config() -> DataTableConfig {
    DataTableConfig::new("campaigns", "/marketing/campaigns/bulk")
        .column(TableColumn::new("name", "Campaign"))
        .column(TableColumn::new("segment", "Segment"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::numeric("recipients", "Recipients"))
        .column(TableColumn::numeric("open_rate", "Open rate"))
        .column(TableColumn::new("actions", ""))
        .filter(TableFilter::select(
            "status",
            "Status",
            status_options(
                CampaignStatus::ALL,
                CampaignStatus::as_str,
                CampaignStatus::label,
            ),
        ))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .empty_state("No campaigns found", None)
}

/// Build the media library table configuration.
#[must_use]
pub fn media_table_config(folders: &[&str]) -> DataTableConfig {
    DataTableConfig::new("media", "/media/bulk")
        .column(TableColumn::new("preview", ""))
        .column(TableColumn::new("file", "File"))
        .column(TableColumn::new("folder", "Folder"))
        .column(TableColumn::numeric("size", "Size"))
        .column(TableColumn::new("uploaded", "Uploaded"))
        .column(TableColumn::new("actions", ""))
        .filter(TableFilter::text("search", "Search", "File name or alt text..."))
        .filter(TableFilter::select(
            "kind",
            "Type",
            status_options(MediaKind::ALL, |k| k.as_str(), |k| k.label()),
        ))
        .filter(TableFilter::select(
            "folder",
            "Folder",
            folders.iter().map(|f| FilterOption::new(f, f)).collect(),
        ))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .empty_state("No media found", Some("Upload a file or clear the filters"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let page = Page::paginate((1..=60).collect::<Vec<_>>(), 2, 25);
        assert_eq!(page.items.first(), Some(&26));
        assert_eq!(page.items.len(), 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev() && page.has_next());

        let last = Page::paginate((1..=60).collect::<Vec<_>>(), 99, 25);
        assert_eq!(last.page, 3);
        assert_eq!(last.items.len(), 10);
        assert!(!last.has_next());

        let empty = Page::paginate(Vec::<i32>::new(), 0, 25);
        assert_eq!((empty.page, empty.total_pages), (1, 1));
    }

    #[test]
    fn test_with_value_sets_matching_filter() {
        let config = orders_table_config()
            .with_value("status", Some("shipped"))
            .with_value("missing", Some("x"));
        let status = config.filters.iter().find(|f| f.key == "status").unwrap();
        assert_eq!(status.value, "shipped");
        assert!(!status.is_text());
    }

    #[test]
    fn test_bulk_tables() {
        assert!(products_table_config(&[]).has_bulk_actions());
        assert!(!orders_table_config().has_bulk_actions());
        assert_eq!(products_table_config(&[]).colspan(), 7);
    }
}
