//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crystal_atelier_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::ProductImage;

/// An immutable snapshot of a completed checkout.
///
/// `status` is the only field mutated after creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub discount_code: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub discount_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// One line of an order with its frozen price.
///
/// `price` is copied from the product at checkout, never referenced, so
/// later price edits cannot retroactively alter the order. The product
/// name and first image are denormalized for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub product_name: String,
    pub product_image: Option<ProductImage>,
}

/// An order with its items, as served by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
