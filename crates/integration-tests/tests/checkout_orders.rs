//! Order placement over HTTP.

use axum::http::{Method, StatusCode};
use serde_json::json;
use tierstore_core::{DealerTier, ProductId, Visibility};
use tierstore_integration_tests::{TestContext, customer, dealer, order_body, product};

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();

    let live = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.text, "ok");

    let ready = ctx.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_large_dealer_order_uses_tier_price() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 5));
    let cookie = ctx.sign_in(dealer(1, DealerTier::Large)).await;

    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(order_body(&[(1, 3)])))
        .await;

    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(res.body["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(res.body["items"][0]["quantity"], 3);
    assert_eq!(res.body["items"][0]["price"], "80");
    assert_eq!(res.body["totalAmount"], "240");
    assert_eq!(res.body["status"], "pending");
    assert_eq!(res.body["paymentStatus"], "unpaid");
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(2));
}

#[tokio::test]
async fn test_client_prices_are_ignored() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 5));
    let cookie = ctx.sign_in(customer(2)).await;

    let mut body = order_body(&[(1, 1)]);
    body["items"][0]["price"] = json!("1");
    body["totalAmount"] = json!("1");

    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(body))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(res.body["totalAmount"], "100");
}

#[tokio::test]
async fn test_requires_session() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 5));

    let res = ctx
        .send(Method::POST, "/api/orders", None, Some(order_body(&[(1, 1)])))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(5));
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_and_names_product() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 5));
    ctx.store.insert_product(product(2, 50, 40, 1));
    let cookie = ctx.sign_in(customer(2)).await;

    let res = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&cookie),
            Some(order_body(&[(1, 2), (2, 3)])),
        )
        .await;

    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body["productId"], 2);
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(5));
    assert_eq!(ctx.store.stock(ProductId::new(2)), Some(1));
    assert_eq!(ctx.store.order_count(), 0);
}

#[tokio::test]
async fn test_validation_names_field() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 5));
    let cookie = ctx.sign_in(customer(2)).await;

    let mut body = order_body(&[(1, 1)]);
    body["shippingAddress"]["city"] = json!("");
    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(body))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["field"], "shippingAddress.city");

    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(json!({ "items": "nope" })))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hidden_product_is_not_found() {
    let ctx = TestContext::new();
    let mut dealer_only = product(1, 100, 80, 5);
    dealer_only.visibility = Visibility {
        customer: false,
        dealer: true,
        dealer_main: true,
    };
    ctx.store.insert_product(dealer_only);
    let cookie = ctx.sign_in(customer(2)).await;

    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(order_body(&[(1, 1)])))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = ctx
        .send(Method::GET, "/api/products/1/price", Some(&cookie), None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_price_lookup_follows_identity() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 5));

    let anonymous = ctx.send(Method::GET, "/api/products/1/price", None, None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["price"], "100");

    let cookie = ctx.sign_in(dealer(1, DealerTier::Large)).await;
    let large = ctx
        .send(Method::GET, "/api/products/1/price", Some(&cookie), None)
        .await;
    assert_eq!(large.body["price"], "80");
}

#[tokio::test]
async fn test_last_unit_sold_once() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 1));
    let first = ctx.sign_in(customer(2)).await;
    let second = ctx.sign_in(customer(3)).await;

    let (a, b) = tokio::join!(
        ctx.send(Method::POST, "/api/orders", Some(&first), Some(order_body(&[(1, 1)]))),
        ctx.send(Method::POST, "/api/orders", Some(&second), Some(order_body(&[(1, 1)]))),
    );

    let mut statuses = [a.status, b.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(0));
    assert_eq!(ctx.store.order_count(), 1);
}

#[tokio::test]
async fn test_orders_are_private() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 100, 80, 5));
    let owner = ctx.sign_in(customer(2)).await;
    let other = ctx.sign_in(customer(3)).await;

    let created = ctx
        .send(Method::POST, "/api/orders", Some(&owner), Some(order_body(&[(1, 1)])))
        .await;
    let uri = format!("/api/orders/{}", created.body["id"]);

    let own = ctx.send(Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["id"], created.body["id"]);

    let foreign = ctx.send(Method::GET, &uri, Some(&other), None).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
}
