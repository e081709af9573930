//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crystal_atelier_core::{Email, UserId};

/// A customer account, created on first identity-provider sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
