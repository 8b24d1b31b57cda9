//! Integration tests for the Tierstore checkout API.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`
//! against [`MemoryStore`]. Sessions use the tower-sessions memory store; a
//! test-only route signs users in the way the authentication service would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tierstore-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Form, Json, Router,
    body::{Body, to_bytes},
    extract::Path,
    http::{Method, Request, StatusCode, header},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use sha2::Sha256;
use tierstore_checkout::config::PaytrConfig;
use tierstore_checkout::middleware::{SESSION_COOKIE_NAME, set_session_user};
use tierstore_checkout::paytr::PaytrClient;
use tierstore_checkout::routes;
use tierstore_checkout::state::AppState;
use tierstore_checkout::store::MemoryStore;
use tierstore_core::{
    DealerTier, PriceTable, Product, ProductId, UserId, UserIdentity, UserType, Visibility,
};
use tower::ServiceExt;
use tower_sessions::{Session, SessionManagerLayer};

/// Merchant credentials used by every test gateway.
pub const MERCHANT_KEY: &str = "kQ7vX2pL9mZ4tR8w";
pub const MERCHANT_SALT: &str = "Hn3Jd8Ks5Lq1Wc6b";

/// A checkout service wired to an in-memory store.
pub struct TestContext {
    pub store: MemoryStore,
    pub paytr: Option<PaytrClient>,
    router: Router,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestContext {
    /// Context without payment configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_paytr(None)
    }

    /// Context with an optional PayTR client.
    #[must_use]
    pub fn with_paytr(paytr: Option<PaytrClient>) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(store.clone(), paytr.clone());

        let sessions = SessionManagerLayer::new(tower_sessions::MemoryStore::default())
            .with_name(SESSION_COOKIE_NAME)
            .with_secure(false);

        let router = routes::routes::<MemoryStore>(false)
            .route("/test/login/{id}", post(login))
            .layer(sessions)
            .with_state(state);

        Self {
            store,
            paytr,
            router,
        }
    }

    /// Register `identity` and return a session cookie for it.
    pub async fn sign_in(&self, identity: UserIdentity) -> String {
        self.store.insert_user(identity);

        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/test/login/{}", identity.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    /// Send a request with an optional JSON body and session cookie.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.dispatch(builder.body(body).unwrap()).await
    }

    /// Send a form-encoded POST.
    pub async fn post_form(&self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let encoded = form
            .iter()
            .map(|(k, v)| format!("{k}={}", form_escape(v)))
            .collect::<Vec<_>>()
            .join("&");

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encoded))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        TestResponse { status, body, text }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

async fn login(session: Session, Path(id): Path<i32>) -> StatusCode {
    set_session_user(&session, UserId::new(id)).await.unwrap();
    StatusCode::NO_CONTENT
}

/// Percent-encode the characters base64 hashes contain.
fn form_escape(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
        .replace(' ', "+")
}

/// PayTR settings pointing at `api_base`.
#[must_use]
pub fn paytr_config(api_base: &str) -> PaytrConfig {
    PaytrConfig {
        merchant_id: "100001".to_string(),
        merchant_key: SecretString::from(MERCHANT_KEY),
        merchant_salt: SecretString::from(MERCHANT_SALT),
        api_base: api_base.to_string(),
        ok_url: "https://shop.test/checkout/success".to_string(),
        fail_url: "https://shop.test/checkout/failed".to_string(),
        test_mode: true,
        currency: "TL".to_string(),
        max_installment: 0,
        no_installment: false,
        timeout_limit: 30,
        lang: "tr".to_string(),
        debug: false,
        request_timeout: Duration::from_secs(2),
    }
}

/// Fields of the token form covered by `paytr_token`, in signing order.
const TOKEN_HASH_FIELDS: [&str; 10] = [
    "merchant_id",
    "user_ip",
    "merchant_oid",
    "email",
    "payment_amount",
    "user_basket",
    "no_installment",
    "max_installment",
    "currency",
    "test_mode",
];

/// An in-process stand-in for the PayTR token endpoint.
///
/// Every request's `paytr_token` is recomputed from the posted form with the
/// test merchant credentials. A request whose token does not match gets a
/// `failed` reply; accepted forms are kept for inspection.
pub struct FakePaytr {
    /// Base URL to put in [`PaytrConfig::api_base`].
    pub base_url: String,
    received: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl FakePaytr {
    /// The most recent form that carried a valid `paytr_token`.
    #[must_use]
    pub fn last_form(&self) -> Option<HashMap<String, String>> {
        self.received.lock().unwrap().last().cloned()
    }

    /// A client configured against this endpoint.
    #[must_use]
    pub fn client(&self) -> PaytrClient {
        PaytrClient::new(paytr_config(&self.base_url)).unwrap()
    }
}

/// `paytr_token` PayTR expects for `form`.
#[must_use]
pub fn expected_paytr_token(form: &HashMap<String, String>) -> String {
    let mut data = TOKEN_HASH_FIELDS
        .iter()
        .map(|name| form.get(*name).map_or("", String::as_str))
        .collect::<String>();
    data.push_str(MERCHANT_SALT);

    let mut mac = Hmac::<Sha256>::new_from_slice(MERCHANT_KEY.as_bytes()).unwrap();
    mac.update(data.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Serve a fake PayTR token endpoint answering `reply` to correctly signed
/// requests.
pub async fn fake_paytr(reply: Value) -> FakePaytr {
    let received = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&received);

    let app = Router::new().route(
        "/odeme/api/get-token",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let reply = reply.clone();
            let seen = Arc::clone(&seen);
            async move {
                let valid = form
                    .get("paytr_token")
                    .is_some_and(|token| *token == expected_paytr_token(&form));
                if !valid {
                    return Json(serde_json::json!({
                        "status": "failed",
                        "reason": "paytr_token mismatch",
                    }));
                }
                seen.lock().unwrap().push(form);
                Json(reply)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakePaytr {
        base_url: format!("http://{addr}"),
        received,
    }
}

/// A product where every dealer tier below `large` pays retail.
#[must_use]
pub fn product(id: i32, retail: i64, dealer_large: i64, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        sku: format!("SKU-{id}"),
        category_id: None,
        prices: PriceTable {
            retail: Decimal::from(retail),
            dealer_small: Decimal::from(retail),
            dealer_medium: Decimal::from(retail),
            dealer_large: Decimal::from(dealer_large),
            dealer_main: Decimal::from(dealer_large),
        },
        visibility: Visibility::default(),
        stock,
    }
}

#[must_use]
pub const fn customer(id: i32) -> UserIdentity {
    UserIdentity::customer(UserId::new(id))
}

#[must_use]
pub const fn dealer(id: i32, tier: DealerTier) -> UserIdentity {
    UserIdentity::dealer(UserId::new(id), tier)
}

#[must_use]
pub const fn admin(id: i32) -> UserIdentity {
    UserIdentity {
        id: UserId::new(id),
        user_type: UserType::Admin,
        dealer_tier: None,
    }
}

/// A valid order body for the given `(productId, quantity)` lines.
#[must_use]
pub fn order_body(lines: &[(i32, u32)]) -> Value {
    serde_json::json!({
        "items": lines
            .iter()
            .map(|(id, qty)| serde_json::json!({ "productId": id, "quantity": qty }))
            .collect::<Vec<_>>(),
        "shippingAddress": {
            "fullName": "Mehmet Kaya",
            "email": "mehmet@example.com",
            "phone": "05550000000",
            "addressLine": "Cumhuriyet Blv. 4",
            "city": "Ankara"
        }
    })
}

/// A window containing the current time.
#[must_use]
pub fn live_window() -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    (now - chrono::Duration::days(1), now + chrono::Duration::days(30))
}

/// Read a decimal serialized as a JSON string or number.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}
