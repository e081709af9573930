use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crystal_atelier_core::types::ProductId;

use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::reviews::ReviewRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::Review;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    product_id: ProductId,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Review>>> {
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(query.product_id)
        .await?;
    Ok(Json(reviews))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    product_id: ProductId,
    rating: i32,
    comment: Option<String>,
}

pub async fn create(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<Review>)> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::InvalidArgument(
            "rating must be between 1 and 5".to_owned(),
        ));
    }
    if !ProductRepository::new(state.pool())
        .exists(body.product_id)
        .await?
    {
        return Err(AppError::NotFound("product not found".to_owned()));
    }

    // The purchase gate: only buyers of a DELIVERED order may review.
    let delivered = OrderRepository::new(state.pool())
        .has_delivered_product(user_id, body.product_id)
        .await?;
    if !delivered {
        return Err(AppError::Forbidden(
            "reviews require a delivered purchase of the product".to_owned(),
        ));
    }

    let review = ReviewRepository::new(state.pool())
        .create(
            user_id,
            body.product_id,
            body.rating,
            body.comment.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}
