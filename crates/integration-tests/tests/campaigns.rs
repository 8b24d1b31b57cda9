//! Campaign preview and attachment over HTTP.

use std::collections::BTreeSet;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;
use tierstore_core::campaign::{
    AudienceSegment, Campaign, CampaignRule, CartDiscount, DiscountType, TargetAudience,
    UsageLimit,
};
use tierstore_core::{CampaignId, DealerTier, ProductId};
use tierstore_integration_tests::{
    TestContext, customer, dealer, decimal, live_window, order_body, product,
};

/// 5% off carts of 2500 or more, capped at 500.
fn five_percent(audience: BTreeSet<AudienceSegment>, usage_limit: UsageLimit) -> Campaign {
    let (start_date, end_date) = live_window();
    Campaign {
        id: CampaignId::new(7),
        name: "Five percent".to_string(),
        start_date,
        end_date,
        is_active: true,
        target_audience: TargetAudience {
            user_types: audience,
            dealer_tiers: BTreeSet::new(),
        },
        usage_limit,
        rule: CampaignRule::CartDiscount(CartDiscount {
            discount_type: DiscountType::Percentage,
            value: Decimal::from(5),
            min_cart_amount: Decimal::from(2500),
            max_discount: Some(Decimal::from(500)),
        }),
    }
}

fn preview_body(total: i64) -> serde_json::Value {
    json!({
        "campaignId": 7,
        "cart": { "total": total.to_string(), "items": [{ "productId": 1, "subtotal": total.to_string() }] }
    })
}

#[tokio::test]
async fn test_preview_caps_discount() {
    let ctx = TestContext::new();
    ctx.store
        .insert_campaign(five_percent(BTreeSet::new(), UsageLimit::default()));

    let res = ctx
        .send(Method::POST, "/api/campaigns/preview", None, Some(preview_body(20000)))
        .await;

    assert_eq!(res.status, StatusCode::OK, "{}", res.text);
    assert_eq!(res.body["outcome"], "applied");
    assert_eq!(res.body["campaignType"], "cart_discount");
    assert_eq!(decimal(&res.body["discount"]), Decimal::from(500));
    assert_eq!(decimal(&res.body["newTotal"]), Decimal::from(19500));
    assert_eq!(ctx.store.campaign_usage(CampaignId::new(7)), Some(0));
}

#[tokio::test]
async fn test_preview_below_threshold_reports_shortfall() {
    let ctx = TestContext::new();
    ctx.store
        .insert_campaign(five_percent(BTreeSet::new(), UsageLimit::default()));

    let res = ctx
        .send(Method::POST, "/api/campaigns/preview", None, Some(preview_body(2000)))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(decimal(&res.body["discount"]), Decimal::ZERO);
    assert_eq!(decimal(&res.body["newTotal"]), Decimal::from(2000));
    assert_eq!(decimal(&res.body["amountToQualify"]), Decimal::from(500));
}

#[tokio::test]
async fn test_preview_rejection_is_a_typed_result() {
    let ctx = TestContext::new();
    ctx.store.insert_campaign(five_percent(
        [AudienceSegment::Dealer].into_iter().collect(),
        UsageLimit::default(),
    ));

    let anonymous = ctx
        .send(Method::POST, "/api/campaigns/preview", None, Some(preview_body(20000)))
        .await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["outcome"], "rejected");
    assert_eq!(anonymous.body["reason"]["code"], "audience_mismatch");

    let cookie = ctx.sign_in(dealer(1, DealerTier::Small)).await;
    let as_dealer = ctx
        .send(
            Method::POST,
            "/api/campaigns/preview",
            Some(&cookie),
            Some(preview_body(20000)),
        )
        .await;
    assert_eq!(as_dealer.body["outcome"], "applied");
}

#[tokio::test]
async fn test_preview_unknown_campaign() {
    let ctx = TestContext::new();
    let res = ctx
        .send(Method::POST, "/api/campaigns/preview", None, Some(preview_body(100)))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_discount_is_recomputed_and_counted() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 1000, 900, 10));
    ctx.store
        .insert_campaign(five_percent(BTreeSet::new(), UsageLimit::default()));
    let cookie = ctx.sign_in(customer(2)).await;

    let mut body = order_body(&[(1, 3)]);
    body["campaignId"] = json!(7);
    body["discountAmount"] = json!("2999");

    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(body))
        .await;

    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(decimal(&res.body["totalAmount"]), Decimal::from(3000));
    assert_eq!(decimal(&res.body["discountAmount"]), Decimal::from(150));
    assert_eq!(res.body["campaignId"], 7);
    assert_eq!(ctx.store.campaign_usage(CampaignId::new(7)), Some(1));
}

#[tokio::test]
async fn test_exhausted_campaign_fails_order_without_side_effects() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 1000, 900, 10));
    ctx.store.insert_campaign(five_percent(
        BTreeSet::new(),
        UsageLimit {
            total_usage: Some(1),
            per_user: None,
            current_usage: 1,
        },
    ));
    let cookie = ctx.sign_in(customer(2)).await;

    let mut body = order_body(&[(1, 3)]);
    body["campaignId"] = json!(7);
    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(body))
        .await;

    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(10));
    assert_eq!(ctx.store.campaign_usage(CampaignId::new(7)), Some(1));
    assert_eq!(ctx.store.order_count(), 0);
}

#[tokio::test]
async fn test_preview_rejects_oversized_total() {
    let ctx = TestContext::new();
    ctx.store
        .insert_campaign(five_percent(BTreeSet::new(), UsageLimit::default()));

    let body = json!({
        "campaignId": 7,
        "cart": { "total": Decimal::MAX.to_string(), "items": [] }
    });
    let res = ctx
        .send(Method::POST, "/api/campaigns/preview", None, Some(body))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", res.text);
    assert_eq!(res.body["field"], "cart.total");
}

#[tokio::test]
async fn test_order_below_minimum_does_not_spend_a_redemption() {
    let ctx = TestContext::new();
    ctx.store.insert_product(product(1, 1000, 900, 10));
    ctx.store.insert_campaign(five_percent(
        BTreeSet::new(),
        UsageLimit {
            total_usage: None,
            per_user: Some(1),
            current_usage: 0,
        },
    ));
    let cookie = ctx.sign_in(customer(2)).await;

    let mut body = order_body(&[(1, 1)]);
    body["campaignId"] = json!(7);
    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(body))
        .await;

    assert_eq!(res.status, StatusCode::CONFLICT, "{}", res.text);
    assert_eq!(ctx.store.stock(ProductId::new(1)), Some(10));
    assert_eq!(ctx.store.campaign_usage(CampaignId::new(7)), Some(0));

    let mut body = order_body(&[(1, 3)]);
    body["campaignId"] = json!(7);
    let res = ctx
        .send(Method::POST, "/api/orders", Some(&cookie), Some(body))
        .await;

    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    assert_eq!(decimal(&res.body["discountAmount"]), Decimal::from(150));
    assert_eq!(ctx.store.campaign_usage(CampaignId::new(7)), Some(1));
}
