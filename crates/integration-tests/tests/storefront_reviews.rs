//! Integration tests for the review purchase gate.
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

use crystal_atelier_integration_tests::TestContext;

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn review_requires_a_delivered_order() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let session = ctx.login_fresh_user().await;

    let product = ctx
        .create_product(&admin, &format!("Tower {}", Uuid::new_v4()), "65.00")
        .await;
    let product_id = product["id"].as_i64().unwrap();

    // No purchase at all: forbidden
    let resp = ctx
        .client
        .post(format!("{}/api/reviews", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "rating": 5, "comment": "lovely" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Buy it
    let resp = ctx
        .client
        .post(format!("{}/api/cart", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
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

    // Still PENDING: the gate stays closed
    let resp = ctx
        .client
        .post(format!("{}/api/reviews", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "rating": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Admin marks the order delivered
    let resp = ctx
        .client
        .put(format!("{}/api/admin/orders", ctx.base_url))
        .bearer_auth(&admin)
        .json(&json!({ "orderId": order["id"], "status": "DELIVERED" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The purchase check now reports true
    let resp = ctx
        .client
        .get(format!("{}/api/orders", ctx.base_url))
        .bearer_auth(&session.access_token)
        .query(&[("productId", product_id.to_string())])
        .send()
        .await
        .unwrap();
    let check: Value = resp.json().await.unwrap();
    assert_eq!(check["hasPurchased"], true);

    // First review goes through
    let resp = ctx
        .client
        .post(format!("{}/api/reviews", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "rating": 4, "comment": "sparkles" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Second review of the same product is a conflict
    let resp = ctx
        .client
        .post(format!("{}/api/reviews", ctx.base_url))
        .bearer_auth(&session.access_token)
        .json(&json!({ "productId": product_id, "rating": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The review is publicly readable
    let resp = ctx
        .client
        .get(format!("{}/api/reviews", ctx.base_url))
        .query(&[("productId", product_id.to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reviews: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], 4);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn review_rating_must_be_in_range() {
    let ctx = TestContext::new();
    let admin = ctx.admin_token().await;
    let session = ctx.login_fresh_user().await;

    let product = ctx
        .create_product(&admin, &format!("Slab {}", Uuid::new_v4()), "15.00")
        .await;

    for rating in [0, 6] {
        let resp = ctx
            .client
            .post(format!("{}/api/reviews", ctx.base_url))
            .bearer_auth(&session.access_token)
            .json(&json!({ "productId": product["id"], "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
