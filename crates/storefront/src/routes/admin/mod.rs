//! Back-office routes, nested under `/api/admin`. Everything except
//! `login` requires an admin bearer token.

pub mod discounts;
pub mod login;
pub mod orders;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login::login))
        .route("/orders", get(orders::list).put(orders::update_status))
        .route(
            "/discounts",
            get(discounts::list).post(discounts::create),
        )
        .route(
            "/discounts/{id}",
            axum::routing::patch(discounts::update).delete(discounts::delete),
        )
}
