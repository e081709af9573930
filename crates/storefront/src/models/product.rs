//! Product catalog models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crystal_atelier_core::{ProductId, Tone};

/// One image in a product's ordered gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// A catalog product.
///
/// `price` is the live price; order items copy it at checkout so later
/// edits never alter past orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub subtitle: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub tone: Tone,
    pub tag: Option<String>,
    pub category: Option<String>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
