use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crystal_atelier_core::types::ProductId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::OrderView;
use crate::state::AppState;

const MAX_PAGE_SIZE: i64 = 50;
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    /// When set, the response is a purchase check instead of a page.
    product_id: Option<ProductId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    orders: Vec<OrderView>,
    total: i64,
    page: i64,
    limit: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseCheck {
    has_purchased: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse {
    Page(OrderPage),
    PurchaseCheck(PurchaseCheck),
}

pub async fn list(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>> {
    let orders = OrderRepository::new(state.pool());

    if let Some(product_id) = query.product_id {
        let has_purchased = orders.has_delivered_product(user_id, product_id).await?;
        return Ok(Json(ListResponse::PurchaseCheck(PurchaseCheck {
            has_purchased,
        })));
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (views, total) = orders.list_for_user(user_id, page, limit).await?;
    Ok(Json(ListResponse::Page(OrderPage {
        orders: views,
        total,
        page,
        limit,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    shipping_address: String,
    discount_code: Option<String>,
}

pub async fn create(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    if body.shipping_address.trim().is_empty() {
        return Err(AppError::InvalidArgument(
            "shipping address must not be empty".to_owned(),
        ));
    }

    let view = OrderRepository::new(state.pool())
        .checkout(
            user_id,
            body.shipping_address.trim(),
            body.discount_code.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}
