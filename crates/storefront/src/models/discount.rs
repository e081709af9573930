//! Discount code model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crystal_atelier_core::{DiscountCodeId, DiscountType};

/// A discount code as stored.
///
/// `code` is always uppercase; lookups uppercase their input. `used_count`
/// never exceeds `usage_limit` when the limit is set - the checkout
/// transaction increments it conditionally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: DiscountCodeId,
    pub code: String,
    pub discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_value: Decimal,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub created_at: DateTime<Utc>,
}
