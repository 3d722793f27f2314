/// Product model with per-size inventory buckets
///
/// Inventory is tracked as an ordered list of `{size, quantity}` buckets.
/// The only invariant-bearing operation is the decrement driven by order
/// placement, which must never push a bucket's quantity below zero. That
/// guard lives in the order manager; the model stores the data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported product brands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Brand {
    #[serde(rename = "MLB")]
    Mlb,
    Adidas,
    Crocs,
}

/// A (size, quantity-on-hand) pair within a product's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBucket {
    /// Size label, e.g. "40" or "L"
    pub size: String,

    /// Units on hand for this size
    ///
    /// Unsigned on purpose: the decrement path fails rather than storing a
    /// negative quantity.
    pub quantity: u32,
}

/// Catalog product document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product ID
    pub id: Uuid,

    /// Product name
    pub name: String,

    /// Image URL
    pub image: String,

    /// Unit price
    pub price: f64,

    /// Per-size inventory, ordered as provided at creation
    pub sizes: Vec<SizeBucket>,

    /// Optional free-form description
    pub description: Option<String>,

    /// Brand, constrained to the supported set
    pub brand: Option<Brand>,

    /// Quality/category label
    pub quality: Option<String>,

    /// Whether the product is visible in the catalog
    pub is_active: bool,

    /// When the product was created
    pub created_at: DateTime<Utc>,

    /// When the product was last updated
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Looks up the bucket for a size label
    pub fn size_bucket(&self, size: &str) -> Option<&SizeBucket> {
        self.sizes.iter().find(|b| b.size == size)
    }
}

/// Input for creating a new product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub image: String,
    pub price: f64,
    pub sizes: Vec<SizeBucket>,
    pub description: Option<String>,
    pub brand: Option<Brand>,
    pub quality: Option<String>,
}

impl CreateProduct {
    /// Materializes a product document with generated ID and timestamps
    pub fn into_product(self) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: self.name,
            image: self.image,
            price: self.price,
            sizes: self.sizes,
            description: self.description,
            brand: self.brand,
            quality: self.quality,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
