//! Generated demo catalog.
//!
//! Products are drawn at random from fixed per-category name lists so the
//! storefront has something to browse without a product database.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

use marketplace_core::{CategoryId, CurrencyCode, ProductId, SellerId};

use crate::models::{Product, ProductCategory};

/// Number of products generated at startup unless configured otherwise.
pub const DEFAULT_PRODUCT_COUNT: usize = 50;

/// Lowest generated price in minor units ($10.00).
pub const MIN_PRICE: i64 = 1000;
/// Width of the generated price range; prices fall in `1000..51000`.
const PRICE_SPREAD: i64 = 50_000;
/// Generated stock falls in `0..100`.
const MAX_STOCK: u32 = 100;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

struct CategorySeed {
    id: &'static str,
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    products: [&'static str; 8],
}

const CATEGORIES: [CategorySeed; 5] = [
    CategorySeed {
        id: "cat-electronics",
        name: "Electronics",
        slug: "electronics",
        description: "Electronic devices and gadgets",
        products: [
            "Wireless Headphones",
            "Smart Watch",
            "Laptop Stand",
            "USB-C Hub",
            "Mechanical Keyboard",
            "Webcam HD",
            "Portable Charger",
            "Bluetooth Speaker",
        ],
    },
    CategorySeed {
        id: "cat-clothing",
        name: "Clothing",
        slug: "clothing",
        description: "Apparel and fashion items",
        products: [
            "Cotton T-Shirt",
            "Denim Jeans",
            "Running Shoes",
            "Winter Jacket",
            "Casual Sneakers",
            "Leather Wallet",
            "Baseball Cap",
            "Yoga Pants",
        ],
    },
    CategorySeed {
        id: "cat-home",
        name: "Home & Garden",
        slug: "home-garden",
        description: "Home decor and garden supplies",
        products: [
            "Coffee Maker",
            "Table Lamp",
            "Throw Pillow",
            "Wall Clock",
            "Plant Pot",
            "Kitchen Knife Set",
            "Candle Set",
            "Bath Towels",
        ],
    },
    CategorySeed {
        id: "cat-books",
        name: "Books",
        slug: "books",
        description: "Books and reading materials",
        products: [
            "The Great Novel",
            "Programming Guide",
            "Cookbook Collection",
            "History of Art",
            "Science Fiction Anthology",
            "Business Strategy",
            "Travel Guide",
            "Mystery Thriller",
        ],
    },
    CategorySeed {
        id: "cat-sports",
        name: "Sports & Outdoors",
        slug: "sports-outdoors",
        description: "Sports equipment and outdoor gear",
        products: [
            "Yoga Mat",
            "Dumbbell Set",
            "Tennis Racket",
            "Camping Tent",
            "Bicycle Helmet",
            "Water Bottle",
            "Resistance Bands",
            "Running Backpack",
        ],
    },
];

const DESCRIPTIONS: [&str; 8] = [
    "High-quality product with excellent durability and performance.",
    "Perfect for everyday use, combining style and functionality.",
    "Premium materials and craftsmanship for lasting value.",
    "Designed with attention to detail and user comfort in mind.",
    "A must-have item for enthusiasts and beginners alike.",
    "Exceptional quality at an affordable price point.",
    "Innovative design meets practical functionality.",
    "Built to last with a focus on sustainability.",
];

const PLACEHOLDER_IMAGES: [&str; 8] = [
    "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=800",
    "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=800",
    "https://images.unsplash.com/photo-1572635196237-14b3f281503f?w=800",
    "https://images.unsplash.com/photo-1560343090-f0409e92791a?w=800",
    "https://images.unsplash.com/photo-1526170375885-4d8ecf77b99f?w=800",
    "https://images.unsplash.com/photo-1503602642458-232111445657?w=800",
    "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=800",
    "https://images.unsplash.com/photo-1490114538077-0a7f8cb49891?w=800",
];

/// The fixed category list.
#[must_use]
pub fn categories() -> Vec<ProductCategory> {
    CATEGORIES
        .iter()
        .map(|seed| ProductCategory {
            id: CategoryId::new(seed.id),
            name: seed.name.to_owned(),
            slug: seed.slug.to_owned(),
            description: seed.description.to_owned(),
            parent_id: None,
        })
        .collect()
}

/// Generate one active product in a random category.
pub fn generate_product<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Product {
    let category = CATEGORIES.choose(rng).unwrap_or(&CATEGORIES[0]);

    Product {
        id: ProductId::new(format!("prod-{}", base36(rng, 9))),
        name: pick(rng, &category.products).to_owned(),
        description: pick(rng, &DESCRIPTIONS).to_owned(),
        price: MIN_PRICE + rng.random_range(0..PRICE_SPREAD),
        currency: CurrencyCode::USD,
        image_url: pick(rng, &PLACEHOLDER_IMAGES).to_owned(),
        category_id: CategoryId::new(category.id),
        seller_id: SellerId::new(format!("seller-{}", base36(rng, 5))),
        stock: rng.random_range(0..MAX_STOCK),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Generate `count` products sharing one creation timestamp.
pub fn generate_products<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Product> {
    let now = Utc::now();
    (0..count).map(|_| generate_product(rng, now)).collect()
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

fn base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(*BASE36.choose(rng).unwrap_or(&b'0')))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_products_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(7);
        let products = generate_products(&mut rng, 200);
        let category_ids: Vec<_> = categories().into_iter().map(|c| c.id).collect();

        assert_eq!(products.len(), 200);
        for product in &products {
            assert!(product.id.as_str().starts_with("prod-"));
            assert_eq!(product.id.as_str().len(), "prod-".len() + 9);
            assert!(product.seller_id.as_str().starts_with("seller-"));
            assert!((MIN_PRICE..MIN_PRICE + PRICE_SPREAD).contains(&product.price));
            assert!(product.stock < MAX_STOCK);
            assert!(product.is_active);
            assert_eq!(product.currency, CurrencyCode::USD);
            assert!(category_ids.contains(&product.category_id));
        }
    }

    #[test]
    fn test_names_match_their_category() {
        let mut rng = StdRng::seed_from_u64(11);
        for product in generate_products(&mut rng, 100) {
            let seed = CATEGORIES
                .iter()
                .find(|seed| seed.id == product.category_id.as_str())
                .unwrap();
            assert!(seed.products.contains(&product.name.as_str()));
        }
    }

    #[test]
    fn test_categories_are_fixed() {
        let categories = categories();
        let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(
            slugs,
            vec![
                "electronics",
                "clothing",
                "home-garden",
                "books",
                "sports-outdoors"
            ]
        );
        assert!(categories.iter().all(|c| c.parent_id.is_none()));
    }
}
