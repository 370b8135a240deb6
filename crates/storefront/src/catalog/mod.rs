//! In-memory product catalog.
//!
//! Products are generated once at startup and held for the life of the
//! process; nothing here touches the data directory.

pub mod mock;
pub mod query;

pub use query::{CatalogError, ProductFilter, ProductQuery, SortOrder};

use marketplace_core::CategoryId;

use crate::models::{Product, ProductCategory};

/// Read-only product source for the storefront.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    products: Vec<Product>,
    categories: Vec<ProductCategory>,
}

impl ProductCatalog {
    /// Generate a catalog of `count` random products.
    #[must_use]
    pub fn generate(count: usize) -> Self {
        let products = mock::generate_products(&mut rand::rng(), count);
        tracing::info!(products = products.len(), "generated product catalog");
        Self::from_products(products)
    }

    /// Wrap an existing product list with the standard categories.
    #[must_use]
    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            products,
            categories: mock::categories(),
        }
    }

    /// Every product, active or not, in catalog order.
    #[must_use]
    pub fn all(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id.as_str() == id)
    }

    #[must_use]
    pub fn by_category(&self, category_id: &CategoryId) -> Vec<Product> {
        self.filter(&ProductFilter {
            category_id: Some(category_id.clone()),
            ..ProductFilter::default()
        })
    }

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Product> {
        self.filter(&ProductFilter {
            search_query: Some(query.to_owned()),
            ..ProductFilter::default()
        })
    }

    #[must_use]
    pub fn active(&self) -> Vec<Product> {
        self.filter(&ProductFilter {
            is_active: Some(true),
            ..ProductFilter::default()
        })
    }

    /// An active product by ID. Inactive products are hidden from shoppers.
    #[must_use]
    pub fn get_active(&self, id: &str) -> Option<&Product> {
        self.get(id).filter(|p| p.is_active)
    }

    #[must_use]
    pub fn categories(&self) -> &[ProductCategory] {
        &self.categories
    }

    #[must_use]
    pub fn filter(&self, filter: &ProductFilter) -> Vec<Product> {
        filter.apply(&self.products)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog() -> ProductCatalog {
        let mut rng = StdRng::seed_from_u64(42);
        ProductCatalog::from_products(mock::generate_products(&mut rng, 50))
    }

    #[test]
    fn test_generate_count() {
        let catalog = ProductCatalog::generate(mock::DEFAULT_PRODUCT_COUNT);
        assert_eq!(catalog.all().len(), 50);
        assert_eq!(catalog.categories().len(), 5);
    }

    #[test]
    fn test_get_by_id() {
        let catalog = catalog();
        let first = catalog.all()[0].clone();
        assert_eq!(catalog.get(first.id.as_str()), Some(&first));
        assert!(catalog.get("prod-missing").is_none());
    }

    #[test]
    fn test_by_category_partitions_catalog() {
        let catalog = catalog();
        let total: usize = catalog
            .categories()
            .iter()
            .map(|c| catalog.by_category(&c.id).len())
            .sum();
        assert_eq!(total, catalog.all().len());
    }

    #[test]
    fn test_inactive_products_are_hidden() {
        let mut products = catalog().all().to_vec();
        products[0].is_active = false;
        let hidden = products[0].id.clone();
        let catalog = ProductCatalog::from_products(products);

        assert_eq!(catalog.active().len(), 49);
        assert!(catalog.get(hidden.as_str()).is_some());
        assert!(catalog.get_active(hidden.as_str()).is_none());
    }

    #[test]
    fn test_search_matches_name() {
        let catalog = catalog();
        let name = catalog.all()[0].name.to_uppercase();
        assert!(!catalog.search(&name).is_empty());
    }
}
