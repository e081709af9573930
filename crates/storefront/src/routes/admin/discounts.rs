use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crystal_atelier_core::types::{DiscountCodeId, DiscountType};

use crate::db::discounts::{DiscountPatch, DiscountRepository, NewDiscountCode};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::DiscountCode;
use crate::state::AppState;

pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<DiscountCode>>> {
    let codes = DiscountRepository::new(state.pool()).list().await?;
    Ok(Json(codes))
}

fn validate_value(discount_type: DiscountType, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(AppError::InvalidArgument(
            "discountValue must be positive".to_owned(),
        ));
    }
    if discount_type == DiscountType::Percentage && value > Decimal::from(100) {
        return Err(AppError::InvalidArgument(
            "percentage discounts cannot exceed 100".to_owned(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountRequest {
    code: String,
    discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::str")]
    discount_value: Decimal,
    #[serde(default = "default_active")]
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    usage_limit: Option<i32>,
}

const fn default_active() -> bool {
    true
}

pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<DiscountCode>)> {
    if body.code.trim().is_empty() {
        return Err(AppError::InvalidArgument(
            "code must not be empty".to_owned(),
        ));
    }
    validate_value(body.discount_type, body.discount_value)?;
    if let Some(limit) = body.usage_limit
        && limit < 1
    {
        return Err(AppError::InvalidArgument(
            "usageLimit must be at least 1".to_owned(),
        ));
    }

    let input = NewDiscountCode {
        code: body.code,
        discount_type: body.discount_type,
        discount_value: body.discount_value,
        is_active: body.is_active,
        expires_at: body.expires_at,
        usage_limit: body.usage_limit,
    };
    let code = DiscountRepository::new(state.pool()).create(&input).await?;
    tracing::info!(admin = %admin, code = %code.code, "discount code created");
    Ok((StatusCode::CREATED, Json(code)))
}

/// Distinguishes an absent field (no change) from an explicit `null` (clear).
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn opt_decimal_str<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscountRequest {
    discount_type: Option<DiscountType>,
    #[serde(default, deserialize_with = "opt_decimal_str")]
    discount_value: Option<Decimal>,
    is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    expires_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    usage_limit: Option<Option<i32>>,
}

pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DiscountCodeId>,
    Json(body): Json<UpdateDiscountRequest>,
) -> Result<Json<DiscountCode>> {
    let repo = DiscountRepository::new(state.pool());
    let current = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("discount code not found".to_owned()))?;

    if let Some(value) = body.discount_value {
        // Validate against the new type when both change together.
        validate_value(body.discount_type.unwrap_or(current.discount_type), value)?;
    }
    if let Some(Some(limit)) = body.usage_limit {
        if limit < 1 {
            return Err(AppError::InvalidArgument(
                "usageLimit must be at least 1".to_owned(),
            ));
        }
        // The limit can never drop below what has already been redeemed.
        if limit < current.used_count {
            return Err(AppError::InvalidArgument(format!(
                "usageLimit cannot be below the current use count ({})",
                current.used_count
            )));
        }
    }

    let patch = DiscountPatch {
        discount_type: body.discount_type,
        discount_value: body.discount_value,
        is_active: body.is_active,
        expires_at: body.expires_at,
        usage_limit: body.usage_limit,
    };
    let code = repo.update(id, &patch).await?;
    tracing::info!(admin = %admin, code = %code.code, "discount code updated");
    Ok(Json(code))
}

pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DiscountCodeId>,
) -> Result<StatusCode> {
    DiscountRepository::new(state.pool()).delete(id).await?;
    tracing::info!(admin = %admin, id = %id, "discount code deleted");
    Ok(StatusCode::NO_CONTENT)
}
