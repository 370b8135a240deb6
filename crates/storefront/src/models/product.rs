//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{CategoryId, CurrencyCode, Price, ProductId, SellerId};

/// A product listed in the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in minor units (cents).
    pub price: i64,
    pub currency: CurrencyCode,
    pub image_url: String,
    pub category_id: CategoryId,
    pub seller_id: SellerId,
    pub stock: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price with its currency attached.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::from_minor(self.price, self.currency)
    }

    /// Formatted price, e.g. "$199.99".
    #[must_use]
    pub fn display_price(&self) -> String {
        self.unit_price().display()
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
}
