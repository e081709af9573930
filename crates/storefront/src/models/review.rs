//! Review model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crystal_atelier_core::{ProductId, ReviewId, UserId};

/// A verified-purchase review. One per (user, product), enforced by a
/// database unique constraint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: i32,
    pub comment: Option<String>,
    pub reviewer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
