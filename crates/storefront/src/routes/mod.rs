//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (DB ping)
//!
//! # Catalog (public read, admin write)
//! GET    /api/products             - List products (q/tag/tone/sort/skip/take)
//! GET    /api/product/{id}         - Product detail
//! PUT    /api/product              - Create product (admin)
//! PATCH  /api/product/{id}         - Update product (admin)
//! DELETE /api/product/{id}         - Delete product (admin)
//!
//! # Cart (bearer user token)
//! GET    /api/cart                 - Cart with live prices and subtotal
//! POST   /api/cart                 - Add line (increments on repeat add)
//! PUT    /api/cart                 - Set line quantity
//! DELETE /api/cart?productId=      - Remove line
//!
//! # Orders (bearer user token)
//! GET  /api/orders                 - Own orders, paginated; ?productId= purchase check
//! POST /api/orders                 - Checkout {shippingAddress, discountCode?}
//!
//! # Discounts
//! POST /api/discounts              - Validate {code, cartTotal}
//!
//! # Reviews
//! GET  /api/reviews?productId=     - Public read
//! POST /api/reviews                - Create (bearer + purchase-gated)
//!
//! # Sessions
//! PUT  /api/user                   - Identity-provider token -> token pair
//! POST /api/user                   - Refresh token -> rotated pair
//! GET  /api/mock-login?email=      - Test-only backdoor (secret header gated)
//!
//! # Admin (admin bearer token)
//! POST   /api/admin/login          - Username/password -> admin token
//! GET    /api/admin/orders         - All orders, paginated
//! PUT    /api/admin/orders         - Set order status
//! GET    /api/admin/discounts      - List codes
//! POST   /api/admin/discounts      - Create code
//! PATCH  /api/admin/discounts/{id} - Update code
//! DELETE /api/admin/discounts/{id} - Delete code
//! ```

pub mod admin;
pub mod cart;
pub mod discounts;
pub mod mock_login;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

/// Create the public API router.
pub fn routes(state: &AppState) -> Router<AppState> {
    let mut router = Router::new()
        .route("/api/products", get(products::list))
        .route(
            "/api/product/{id}",
            get(products::get_one)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/api/product", put(products::create))
        .route(
            "/api/cart",
            get(cart::get_cart)
                .post(cart::add_item)
                .put(cart::set_quantity)
                .delete(cart::remove_item),
        )
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/discounts", post(discounts::validate))
        .route("/api/reviews", get(reviews::list).post(reviews::create))
        .route("/api/user", put(users::sign_in).post(users::refresh))
        .nest("/api/admin", admin::routes());

    // Test-only backdoor; absent unless the shared secret is configured.
    if state.config().mock_login_secret.is_some() {
        router = router.route("/api/mock-login", get(mock_login::mock_login));
    }

    router
}
