//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use marketplace_core::pagination::DEFAULT_VISIBLE_PAGES;
use marketplace_core::{Paginated, page_numbers};

use crate::catalog::query::{ALL_CATEGORIES, DEFAULT_PER_PAGE};
use crate::catalog::{CatalogError, ProductQuery, SortOrder};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductCategory};
use crate::state::AppState;

/// Largest page size a client may ask for.
pub const MAX_PER_PAGE: usize = 100;

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub category: Option<String>,
    #[serde(alias = "search")]
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl TryFrom<ListingParams> for ProductQuery {
    type Error = CatalogError;

    fn try_from(params: ListingParams) -> std::result::Result<Self, Self::Error> {
        let sort = match params.sort.as_deref().map(str::trim) {
            None | Some("") => SortOrder::Default,
            Some(sort) => sort.parse()?,
        };

        Ok(Self {
            category: params
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| ALL_CATEGORIES.to_owned()),
            search: params.q.unwrap_or_default(),
            sort,
            page: params.page.unwrap_or(1),
            per_page: params
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        })
    }
}

/// One listing page plus the page links to show around it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListResponse {
    #[serde(flatten)]
    pub page: Paginated<Product>,
    pub page_numbers: Vec<usize>,
    pub category: String,
    pub sort: SortOrder,
}

/// List active products filtered by category and search, sorted and paged.
pub async fn index(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListingParams>, QueryRejection>,
) -> Result<Json<ProductListResponse>> {
    let Query(params) = params?;
    let query = ProductQuery::try_from(params)?;
    let page = query.run(&state.catalog().active());

    let page_numbers = page_numbers(page.current_page, page.total_pages, DEFAULT_VISIBLE_PAGES);

    tracing::debug!(
        category = %query.category,
        sort = %query.sort,
        total = page.total_items,
        page = page.current_page,
        "product listing"
    );

    Ok(Json(ProductListResponse {
        page,
        page_numbers,
        category: query.category,
        sort: query.sort,
    }))
}

/// Product detail. Only signed-in users see details, and only for active
/// products.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_session): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .get_active(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
}

/// All product categories.
pub async fn categories(State(state): State<AppState>) -> Json<Vec<ProductCategory>> {
    Json(state.catalog().categories().to_vec())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let query = ProductQuery::try_from(ListingParams::default()).unwrap();
        assert_eq!(query, ProductQuery::default());
    }

    #[test]
    fn test_params_parse_sort_and_clamp_page_size() {
        let query = ProductQuery::try_from(ListingParams {
            category: Some("cat-books".to_owned()),
            q: Some("Novel".to_owned()),
            sort: Some("price-desc".to_owned()),
            page: Some(3),
            per_page: Some(10_000),
        })
        .unwrap();

        assert_eq!(query.category, "cat-books");
        assert_eq!(query.search, "Novel");
        assert_eq!(query.sort, SortOrder::PriceDesc);
        assert_eq!(query.page, 3);
        assert_eq!(query.per_page, MAX_PER_PAGE);
    }

    #[test]
    fn test_params_reject_unknown_sort() {
        let err = ProductQuery::try_from(ListingParams {
            sort: Some("newest".to_owned()),
            ..ListingParams::default()
        })
        .unwrap_err();

        assert_eq!(err, CatalogError::InvalidSort("newest".to_owned()));
    }
}
