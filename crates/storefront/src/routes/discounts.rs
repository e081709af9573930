use axum::extract::State;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crystal_atelier_core::types::{format_amount, DiscountType};

use crate::db::discounts::DiscountRepository;
use crate::error::{AppError, Result};
use crate::services::discount::{self, DiscountError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    code: String,
    #[serde(with = "rust_decimal::serde::str")]
    cart_total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    code: String,
    discount_type: DiscountType,
    #[serde(with = "rust_decimal::serde::str")]
    discount_value: Decimal,
    discount_amount: String,
    final_total: String,
}

/// Pre-checkout validation. Read-only: `used_count` only moves inside
/// the checkout transaction, so a validate here is no reservation.
pub async fn validate(
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>> {
    if body.cart_total < Decimal::ZERO {
        return Err(AppError::InvalidArgument(
            "cartTotal must not be negative".to_owned(),
        ));
    }

    let code = DiscountRepository::new(state.pool())
        .get_by_code(&body.code)
        .await?
        .ok_or(AppError::Discount(DiscountError::NotFound))?;

    let eval = discount::evaluate(&code, body.cart_total, Utc::now())?;

    Ok(Json(ValidateResponse {
        final_total: format_amount(body.cart_total - eval.amount),
        discount_amount: format_amount(eval.amount),
        code: eval.code,
        discount_type: eval.discount_type,
        discount_value: eval.discount_value,
    }))
}
