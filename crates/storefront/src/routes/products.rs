use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crystal_atelier_core::types::{parse_amount, ProductId, Tone};

use crate::db::products::{
    NewProduct, ProductFilter, ProductPatch, ProductRepository, ProductSort, SortOrder,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Product, ProductImage};
use crate::state::AppState;

const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    q: Option<String>,
    tag: Option<String>,
    tone: Option<Tone>,
    sort_by: Option<ProductSort>,
    order: Option<SortOrder>,
    skip: Option<i64>,
    take: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter {
        q: query.q,
        tag: query.tag,
        tone: query.tone,
        sort_by: query.sort_by.unwrap_or_default(),
        order: query.order.unwrap_or_default(),
        skip: query.skip.unwrap_or(0).max(0),
        take: query
            .take
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
    };

    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_owned()))?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    name: String,
    #[serde(default)]
    subtitle: String,
    /// Decimal string, e.g. "500.00".
    price: String,
    tone: Tone,
    tag: Option<String>,
    category: Option<String>,
    #[serde(default)]
    images: Vec<ProductImage>,
}

pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::InvalidArgument(
            "name must not be empty".to_owned(),
        ));
    }
    let price = parse_amount(&body.price)
        .map_err(|e| AppError::InvalidArgument(format!("invalid price: {e}")))?;

    let input = NewProduct {
        name: body.name,
        subtitle: body.subtitle,
        price,
        tone: body.tone,
        tag: body.tag,
        category: body.category,
        images: body.images,
    };
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Distinguishes an absent field (no change) from an explicit `null` (clear).
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    name: Option<String>,
    subtitle: Option<String>,
    price: Option<String>,
    tone: Option<Tone>,
    #[serde(default, deserialize_with = "double_option")]
    tag: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    category: Option<Option<String>>,
    images: Option<Vec<ProductImage>>,
}

pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    if let Some(name) = &body.name
        && name.trim().is_empty()
    {
        return Err(AppError::InvalidArgument(
            "name must not be empty".to_owned(),
        ));
    }
    let price = body
        .price
        .as_deref()
        .map(parse_amount)
        .transpose()
        .map_err(|e| AppError::InvalidArgument(format!("invalid price: {e}")))?;

    let patch = ProductPatch {
        name: body.name,
        subtitle: body.subtitle,
        price,
        tone: body.tone,
        tag: body.tag,
        category: body.category,
        images: body.images,
    };
    let product = ProductRepository::new(state.pool())
        .update(id, &patch)
        .await?;
    Ok(Json(product))
}

pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
