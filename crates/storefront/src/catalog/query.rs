//! Filter, sort and paginate pipeline for product listings.
//!
//! Every step takes a slice and returns a new vector, so the catalog's own
//! product list is never reordered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use marketplace_core::{CategoryId, Paginated, PaginationOptions, SellerId, paginate};

use crate::models::Product;

/// Category value that disables category filtering.
pub const ALL_CATEGORIES: &str = "all";

/// Listing page size when none is requested.
pub const DEFAULT_PER_PAGE: usize = 12;

/// Errors from parsing listing queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid sort order: {0}")]
    InvalidSort(String),
}

/// Listing sort orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Keep catalog order.
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "price-asc" => Ok(Self::PriceAsc),
            "price-desc" => Ok(Self::PriceDesc),
            other => Err(CatalogError::InvalidSort(other.to_owned())),
        }
    }
}

/// Keep products in `category`, or everything for [`ALL_CATEGORIES`].
#[must_use]
pub fn filter_by_category(products: &[Product], category: &str) -> Vec<Product> {
    if category == ALL_CATEGORIES {
        return products.to_vec();
    }

    products
        .iter()
        .filter(|p| p.category_id.as_str() == category)
        .cloned()
        .collect()
}

/// Keep products whose name or description contains `query`, ignoring case
/// and surrounding whitespace. A blank query keeps everything.
#[must_use]
pub fn filter_by_search(products: &[Product], query: &str) -> Vec<Product> {
    let query = query.trim();
    if query.is_empty() {
        return products.to_vec();
    }

    let query = query.to_lowercase();
    products
        .iter()
        .filter(|p| matches_text(p, &query))
        .cloned()
        .collect()
}

/// Sort a copy of `products`. Equal prices keep their relative order.
#[must_use]
pub fn sort_products(products: &[Product], order: SortOrder) -> Vec<Product> {
    let mut sorted = products.to_vec();
    match order {
        SortOrder::Default => {}
        SortOrder::PriceAsc => sorted.sort_by_key(|p| p.price),
        SortOrder::PriceDesc => sorted.sort_by(|a, b| b.price.cmp(&a.price)),
    }
    sorted
}

/// `query` must already be lowercase.
fn matches_text(product: &Product, query: &str) -> bool {
    product.name.to_lowercase().contains(query)
        || product.description.to_lowercase().contains(query)
}

/// Attribute filter over the catalog. Every criterion that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Inclusive lower bound in minor units.
    pub min_price: Option<i64>,
    /// Inclusive upper bound in minor units.
    pub max_price: Option<i64>,
    /// Case-insensitive substring of name or description. Empty matches all.
    pub search_query: Option<String>,
    pub seller_id: Option<SellerId>,
    pub is_active: Option<bool>,
}

impl ProductFilter {
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if self
            .category_id
            .as_ref()
            .is_some_and(|id| *id != product.category_id)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if self
            .search_query
            .as_deref()
            .filter(|q| !q.is_empty())
            .is_some_and(|q| !matches_text(product, &q.to_lowercase()))
        {
            return false;
        }
        if self
            .seller_id
            .as_ref()
            .is_some_and(|id| *id != product.seller_id)
        {
            return false;
        }
        if self
            .is_active
            .is_some_and(|active| active != product.is_active)
        {
            return false;
        }
        true
    }

    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}

/// A full listing request: category, then search, then sort, then page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: String,
    pub search: String,
    pub sort: SortOrder,
    pub page: usize,
    pub per_page: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: ALL_CATEGORIES.to_owned(),
            search: String::new(),
            sort: SortOrder::Default,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ProductQuery {
    /// Run the pipeline over `products`.
    #[must_use]
    pub fn run(&self, products: &[Product]) -> Paginated<Product> {
        let filtered = filter_by_category(products, &self.category);
        let filtered = filter_by_search(&filtered, &self.search);
        let sorted = sort_products(&filtered, self.sort);

        paginate(
            &sorted,
            PaginationOptions::new(self.page, sorted.len(), self.per_page),
        )
    }
}
