//! Integration tests for the Llama Treats storefront.
//!
//! The tests drive the real router in-process against the in-memory bakery
//! API, so they need no server, network or credentials.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p llama-treats-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `cart_flow` - Adding, changing and pricing cart lines
//! - `catalog` - Product lists, search, sorting and product pages
//! - `favorites_flow` - Saving products for later
//! - `specials_flow` - Eligibility, promo codes and free item picks
//! - `checkout_flow` - Submitting a checkout and confirming the order

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use llama_treats_storefront::app;
use llama_treats_storefront::bakery::fake::FakeBakeryApi;
use llama_treats_storefront::testing::test_state;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::task::JoinSet;
use tower::ServiceExt;

/// One visitor's browser: the app plus the session cookie it was handed.
pub struct Visitor {
    app: Router,
    cookie: Option<String>,
    api: Arc<FakeBakeryApi>,
}

impl Visitor {
    /// A fresh visitor on the sample catalog.
    #[must_use]
    pub fn new() -> Self {
        let (state, api) = test_state();
        Self {
            app: app(state),
            cookie: None,
            api,
        }
    }

    /// Someone else browsing the same storefront, with their own session.
    #[must_use]
    pub fn another_visitor(&self) -> Self {
        Self {
            app: self.app.clone(),
            cookie: None,
            api: Arc::clone(&self.api),
        }
    }

    /// The bakery API this visitor's storefront talks to.
    #[must_use]
    pub fn api(&self) -> &FakeBakeryApi {
        &self.api
    }

    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Send the same request `count` times at once, all with this
    /// visitor's cookie, as a double-clicking browser would.
    ///
    /// # Panics
    ///
    /// Panics if a request task fails.
    #[allow(clippy::unwrap_used)]
    pub async fn post_together(
        &self,
        count: usize,
        uri: &str,
        body: Value,
    ) -> Vec<(StatusCode, Value)> {
        let mut requests = JoinSet::new();
        for _ in 0..count {
            let app = self.app.clone();
            let cookie = self.cookie.clone();
            let uri = uri.to_owned();
            let body = body.clone();
            requests.spawn(async move {
                let (status, _, json) =
                    exchange(app, cookie.as_deref(), Method::POST, &uri, Some(body)).await;
                (status, json)
            });
        }
        let mut responses = Vec::with_capacity(count);
        while let Some(response) = requests.join_next().await {
            responses.push(response.unwrap());
        }
        responses
    }

    async fn send(&mut self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, cookie, json) =
            exchange(self.app.clone(), self.cookie.as_deref(), method, uri, body).await;
        if cookie.is_some() {
            self.cookie = cookie;
        }
        (status, json)
    }
}

/// One request through the router. Returns the status, the session cookie
/// if one was set, and the body.
#[allow(clippy::unwrap_used)]
async fn exchange(
    app: Router,
    cookie: Option<&str>,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().split(';').next().unwrap().to_string());

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // Plain-text bodies (health checks) come back as a JSON string.
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, set_cookie, json)
}

impl Default for Visitor {
    fn default() -> Self {
        Self::new()
    }
}

/// A pickup checkout form for tomorrow morning, relative to the sample clock.
#[must_use]
pub fn pickup_form() -> Value {
    serde_json::json!({
        "email": "pat@example.com",
        "phone": "555-0100",
        "firstName": "Pat",
        "lastName": "Baker",
        "orderType": "pickup",
        "pickupDate": "2024-06-16",
        "pickupTime": "9:30 AM"
    })
}

/// Decimal amounts are serialized as strings; compare them as numbers.
///
/// # Panics
///
/// Panics if `value` is not a decimal string.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn amount(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}
