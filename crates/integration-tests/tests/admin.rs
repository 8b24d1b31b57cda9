//! Administrative routes over HTTP.

use axum::http::{Method, StatusCode};
use serde_json::json;
use tierstore_core::ProductId;
use tierstore_integration_tests::{TestContext, admin, customer, order_body, product};

async fn placed_order(ctx: &TestContext) -> i64 {
    ctx.store.insert_product(product(1, 100, 80, 5));
    let cookie = ctx.sign_in(customer(2)).await;
    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(order_body(&[(1, 2)])))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    res.body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let ctx = TestContext::new();
    let id = placed_order(&ctx).await;
    let uri = format!("/api/admin/orders/{id}/status");
    let body = json!({ "status": "confirmed" });

    let anonymous = ctx.send(Method::POST, &uri, None, Some(body.clone())).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let shopper = ctx.sign_in(customer(3)).await;
    let forbidden = ctx.send(Method::POST, &uri, Some(&shopper), Some(body)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_status_moves_forward_and_cancel_restocks() {
    let ctx = TestContext::new();
    let id = placed_order(&ctx).await;
    let cookie = ctx.sign_in(admin(99)).await;
    let uri = format!("/api/admin/orders/{id}/status");
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(3));

    let confirmed = ctx
        .send(Method::POST, &uri, Some(&cookie), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(confirmed.status, StatusCode::OK, "{}", confirmed.text);
    assert_eq!(confirmed.body["status"], "confirmed");

    let backwards = ctx
        .send(Method::POST, &uri, Some(&cookie), Some(json!({ "status": "pending" })))
        .await;
    assert_eq!(backwards.status, StatusCode::CONFLICT);

    let cancelled = ctx
        .send(Method::POST, &uri, Some(&cookie), Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(5));

    let again = ctx
        .send(Method::POST, &uri, Some(&cookie), Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(5));
}

#[tokio::test]
async fn test_admin_can_read_any_order() {
    let ctx = TestContext::new();
    let id = placed_order(&ctx).await;
    let cookie = ctx.sign_in(admin(99)).await;

    let res = ctx
        .send(Method::GET, &format!("/api/orders/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_payment_override_is_final() {
    let ctx = TestContext::new();
    let id = placed_order(&ctx).await;
    let cookie = ctx.sign_in(admin(99)).await;
    let uri = format!("/api/admin/orders/{id}/payment");

    let paid = ctx
        .send(
            Method::POST,
            &uri,
            Some(&cookie),
            Some(json!({ "paymentStatus": "paid", "transactionId": "bank-1" })),
        )
        .await;
    assert_eq!(paid.status, StatusCode::OK, "{}", paid.text);
    assert_eq!(paid.body["paymentStatus"], "paid");
    assert_eq!(paid.body["status"], "confirmed");
    assert_eq!(paid.body["paymentTransactionId"], "bank-1");

    let again = ctx
        .send(
            Method::POST,
            &uri,
            Some(&cookie),
            Some(json!({ "paymentStatus": "failed" })),
        )
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let unknown = ctx
        .send(
            Method::POST,
            "/api/admin/orders/999/payment",
            Some(&cookie),
            Some(json!({ "paymentStatus": "paid" })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
