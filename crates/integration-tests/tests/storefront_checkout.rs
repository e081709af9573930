//! Integration tests for the cart and checkout flow.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running with `MOCK_LOGIN_SECRET` set
//!
//! Run with: cargo test -p crystal-atelier-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use crystal_atelier_integration_tests::{Session, TestContext};

async fn add_to_cart(ctx: &TestContext, session: &Session, product_id: i64, quantity: i64) {
    let resp = ctx
        .client
        .post(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "quantity": quantity }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

async fn create_discount(ctx: &TestContext, admin: &str, body: Value) -> Value {
    let resp = ctx
        .client
        .post(format!("{}/api/admin/discounts", ctx.base_url))
        .bearer_auth(admin)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn checkout_applies_percentage_discount_and_clears_cart() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let session = ctx.login_fresh_user().await;

    let a = ctx
        .create_product(&admin, &format!("Cluster {}", Uuid::new_v4()), "500.00")
        .await;
    let b = ctx
        .create_product(&admin, &format!("Point {}", Uuid::new_v4()), "250.00")
        .await;
    let code = format!("IT{}", Uuid::new_v4().simple());
    create_discount(
        &ctx,
        &admin,
        json!({ "code": code, "discountType": "PERCENTAGE", "discountValue": "10" }),
    )
    .await;

    // Two of A at 500.00, one of B at 250.00
    add_to_cart(&ctx, &session, a["id"].as_i64().unwrap(), 2).await;
    add_to_cart(&ctx, &session, b["id"].as_i64().unwrap(), 1).await;

    let resp = ctx
        .client
        .get(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .send()
        .await
        .unwrap();
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["subtotal"], "1250.00");

    let resp = ctx
        .client
        .post(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "shippingAddress": "1 Quartz Way", "discountCode": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();

    // 10% of 1250.00 off
    assert_eq!(order["discountAmount"], "125.00");
    assert_eq!(order["total"], "1125.00");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    // The cart is emptied by checkout
    let resp = ctx
        .client
        .get(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .send()
        .await
        .unwrap();
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["subtotal"], "0.00");
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn order_items_keep_price_frozen_after_product_change() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let session = ctx.login_fresh_user().await;

    let product = ctx
        .create_product(&admin, &format!("Sphere {}", Uuid::new_v4()), "80.00")
        .await;
    let id = product["id"].as_i64().unwrap();

    add_to_cart(&ctx, &session, id, 1).await;
    let resp = ctx
        .client
        .post(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "shippingAddress": "1 Quartz Way" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.unwrap();

    // Raise the price after the sale
    let resp = ctx
        .client
        .patch(format!("{}/api/product/{id}", ctx.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "price": "120.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The order still shows the price paid
    let resp = ctx
        .client
        .get(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&session.access_token)
        .send()
        .await
        .unwrap();
    let page: Value = resp.json().await.unwrap();
    let listed = page["orders"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["id"] == order["id"])
        .unwrap();
    assert_eq!(listed["items"][0]["price"], "80.00");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn checkout_with_empty_cart_is_rejected() {
    let ctx = TestContext::new();
    let session = ctx.login_fresh_user().await;

    let resp = ctx
        .client
        .post(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "shippingAddress": "1 Quartz Way" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn expired_discount_is_rejected_with_reason() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let session = ctx.login_fresh_user().await;

    let product = ctx
        .create_product(&admin, &format!("Wand {}", Uuid::new_v4()), "30.00")
        .await;
    let code = format!("OLD{}", Uuid::new_v4().simple());
    create_discount(
        &ctx,
        &admin,
        json!({
            "code": code,
            "discountType": "FIXED",
            "discountValue": "5.00",
            "expiresAt": "2020-01-01T00:00:00Z",
        }),
    )
    .await;

    add_to_cart(&ctx, &session, product["id"].as_i64().unwrap(), 1).await;
    let resp = ctx
        .client
        .post(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "shippingAddress": "1 Quartz Way", "discountCode": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reason"], "EXPIRED");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn usage_limited_discount_stops_at_the_limit() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;

    let product = ctx
        .create_product(&admin, &format!("Egg {}", Uuid::new_v4()), "10.00")
        .await;
    let code = format!("ONE{}", Uuid::new_v4().simple());
    create_discount(
        &ctx,
        &admin,
        json!({
            "code": code,
            "discountType": "FIXED",
            "discountValue": "1.00",
            "usageLimit": 1,
        }),
    )
    .await;

    // First redemption succeeds
    let first = ctx.login_fresh_user().await;
    add_to_cart(&ctx, &first, product["id"].as_i64().unwrap(), 1).await;
    let resp = ctx
        .client
        .post(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&first.access_token)
        .json(&json!({ "shippingAddress": "1 Quartz Way", "discountCode": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Second redemption is over the limit
    let second = ctx.login_fresh_user().await;
    add_to_cart(&ctx, &second, product["id"].as_i64().unwrap(), 1).await;
    let resp = ctx
        .client
        .post(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&second.access_token)
        .json(&json!({ "shippingAddress": "1 Quartz Way", "discountCode": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["reason"], "LIMIT_EXCEEDED");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn cart_lines_merge_update_and_remove() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let session = ctx.login_fresh_user().await;

    let product = ctx
        .create_product(&admin, &format!("Sphere {}", Uuid::new_v4()), "60.00")
        .await;
    let product_id = product["id"].as_i64().unwrap();

    // Adding the same product twice merges into one line
    add_to_cart(&ctx, &session, product_id, 1).await;
    add_to_cart(&ctx, &session, product_id, 1).await;

    let resp = ctx
        .client
        .get(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .send()
        .await
        .unwrap();
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 2);
    assert_eq!(cart["subtotal"], "120.00");

    // Quantities below one are rejected and the line is untouched
    let resp = ctx
        .client
        .put(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .client
        .get(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .send()
        .await
        .unwrap();
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["items"][0]["quantity"], 2);

    let resp = ctx
        .client
        .put(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "quantity": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["items"][0]["quantity"], 5);

    // Removal empties the line; removing again misses
    let resp = ctx
        .client
        .delete(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .query(&[("productId", product_id)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ctx
        .client
        .delete(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .query(&[("productId", product_id)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx
        .client
        .get(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .send()
        .await
        .unwrap();
    let cart: Value = resp.json().await.unwrap();
    assert!(cart["items"].as_array().unwrap().is_empty());
}
