use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crystal_atelier_core::types::{OrderId, OrderStatus};

use crate::db::orders::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::OrderView;
use crate::state::AppState;

const MAX_PAGE_SIZE: i64 = 50;
const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderView {
    #[serde(flatten)]
    order: OrderView,
    user_email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderPage {
    orders: Vec<AdminOrderView>,
    total: i64,
    page: i64,
    limit: i64,
}

pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<AdminOrderPage>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (rows, total) = OrderRepository::new(state.pool())
        .list_all(page, limit)
        .await?;
    let orders = rows
        .into_iter()
        .map(|(order, user_email)| AdminOrderView { order, user_email })
        .collect();

    Ok(Json(AdminOrderPage {
        orders,
        total,
        page,
        limit,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    order_id: OrderId,
    status: OrderStatus,
}

pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<OrderView>> {
    let view = OrderRepository::new(state.pool())
        .update_status(body.order_id, body.status)
        .await?;
    tracing::info!(
        admin = %admin,
        order_id = %body.order_id,
        status = %body.status,
        "order status updated",
    );
    Ok(Json(view))
}
