use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crystal_atelier_core::types::ProductId;

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::CartView;
use crate::state::AppState;

pub async fn get_cart(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CartView>> {
    let view = CartRepository::new(state.pool()).get_view(user_id).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    product_id: ProductId,
    #[serde(default = "default_quantity")]
    quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

pub async fn add_item(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    if body.quantity < 1 {
        return Err(AppError::InvalidArgument(
            "quantity must be at least 1".to_owned(),
        ));
    }
    if !ProductRepository::new(state.pool())
        .exists(body.product_id)
        .await?
    {
        return Err(AppError::NotFound("product not found".to_owned()));
    }

    let carts = CartRepository::new(state.pool());
    carts.add(user_id, body.product_id, body.quantity).await?;
    Ok(Json(carts.get_view(user_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    product_id: ProductId,
    quantity: i32,
}

pub async fn set_quantity(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    if body.quantity < 1 {
        return Err(AppError::InvalidArgument(
            "quantity must be at least 1".to_owned(),
        ));
    }

    let carts = CartRepository::new(state.pool());
    carts
        .set_quantity(user_id, body.product_id, body.quantity)
        .await?;
    Ok(Json(carts.get_view(user_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemQuery {
    product_id: ProductId,
}

pub async fn remove_item(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Query(query): Query<RemoveItemQuery>,
) -> Result<StatusCode> {
    CartRepository::new(state.pool())
        .remove(user_id, query.product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
