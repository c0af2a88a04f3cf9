//! In-memory [`BakeryApi`] for tests.
//!
//! Serves a fixed catalog, records every checkout request, and can be told
//! to fail catalog reads or order confirmation, or to answer slowly.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use llama_treats_core::{
    Banner, Catalog, Category, ConfirmedOrder, Product, Promotion, Settings, Special,
};
use serde_json::json;

use super::types::{ConfirmOrderRequest, CreateSessionRequest};
use super::{ApiError, BakeryApi, CodeStatus};

/// How the fake answers `confirm-order`.
#[derive(Debug, Clone)]
pub enum ConfirmBehavior {
    /// Answer with a paid order numbered `order_number` for the requested session.
    Paid { order_number: String },
    /// Answer with this exact order.
    Order(ConfirmedOrder),
    /// Fail as if the API were down.
    Unavailable,
}

#[derive(Debug)]
struct State {
    catalog: Catalog,
    catalog_down: bool,
    latency: Duration,
    /// Codes whose last use was taken after the catalog was served.
    used_up_codes: Vec<String>,
    code_checks: Vec<String>,
    checkout_url: String,
    confirm: ConfirmBehavior,
    checkout_requests: Vec<CreateSessionRequest>,
    confirm_requests: Vec<ConfirmOrderRequest>,
}

/// A fake bakery API backed by a [`Catalog`].
#[derive(Debug)]
pub struct FakeBakeryApi {
    state: Mutex<State>,
}

impl FakeBakeryApi {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            state: Mutex::new(State {
                catalog,
                catalog_down: false,
                latency: Duration::ZERO,
                used_up_codes: Vec::new(),
                code_checks: Vec::new(),
                checkout_url: "https://pay.example.test/session/cs_test_a1b2c3d4e5f6g7h8".to_owned(),
                confirm: ConfirmBehavior::Paid {
                    order_number: "LT-1001".to_owned(),
                },
                checkout_requests: Vec::new(),
                confirm_requests: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every catalog read fail.
    pub fn set_catalog_down(&self, down: bool) {
        self.lock().catalog_down = down;
    }

    /// Delay every product read and order confirmation by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Use up `code` on the API side only. The served specials keep their
    /// old usage count, as a cached catalog would.
    pub fn use_up_code(&self, code: &str) {
        self.lock().used_up_codes.push(code.to_uppercase());
    }

    /// Every code sent to `validate-code`, oldest first.
    #[must_use]
    pub fn code_checks(&self) -> Vec<String> {
        self.lock().code_checks.clone()
    }

    pub fn set_confirm_behavior(&self, behavior: ConfirmBehavior) {
        self.lock().confirm = behavior;
    }

    /// Every `create-session` body received, oldest first.
    #[must_use]
    pub fn checkout_requests(&self) -> Vec<CreateSessionRequest> {
        self.lock().checkout_requests.clone()
    }

    /// Every `confirm-order` body received, oldest first.
    #[must_use]
    pub fn confirm_requests(&self) -> Vec<ConfirmOrderRequest> {
        self.lock().confirm_requests.clone()
    }

    async fn wait(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Catalog) -> T) -> Result<T, ApiError> {
        let state = self.lock();
        if state.catalog_down {
            return Err(ApiError::Api {
                status: 503,
                message: "catalog unavailable".to_owned(),
            });
        }
        Ok(f(&state.catalog))
    }
}

#[async_trait]
impl BakeryApi for FakeBakeryApi {
    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.wait().await;
        self.read(|c| c.products.clone())
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.read(|c| c.categories.clone())
    }

    async fn specials(&self) -> Result<Vec<Special>, ApiError> {
        self.read(|c| c.specials.clone())
    }

    async fn promotions(&self) -> Result<Vec<Promotion>, ApiError> {
        self.read(|c| c.promotions.clone())
    }

    async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.read(|c| c.banners.clone())
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.read(|c| c.settings.clone())
    }

    async fn validate_code(&self, code: &str) -> Result<CodeStatus, ApiError> {
        let code = code.trim().to_uppercase();
        let mut state = self.lock();
        state.code_checks.push(code.clone());
        if state.catalog_down {
            return Err(ApiError::Api {
                status: 503,
                message: "specials unavailable".to_owned(),
            });
        }

        let Some(special) = state
            .catalog
            .specials
            .iter()
            .find(|s| s.active && s.matches_code(&code))
        else {
            return Ok(CodeStatus::Invalid);
        };
        if special.is_exhausted() || state.used_up_codes.contains(&code) {
            Ok(CodeStatus::Exhausted)
        } else {
            Ok(CodeStatus::Valid)
        }
    }

    async fn create_checkout_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<String, ApiError> {
        let mut state = self.lock();
        state.checkout_requests.push(request.clone());
        Ok(state.checkout_url.clone())
    }

    async fn confirm_order(
        &self,
        request: &ConfirmOrderRequest,
    ) -> Result<ConfirmedOrder, ApiError> {
        self.wait().await;
        let mut state = self.lock();
        state.confirm_requests.push(request.clone());
        match &state.confirm {
            ConfirmBehavior::Paid { order_number } => Ok(ConfirmedOrder {
                order_number: Some(order_number.clone()),
                session_id: Some(request.session_id.clone()),
                status: Some("pending".to_owned()),
                payment_status: Some("paid".to_owned()),
                total: None,
            }),
            ConfirmBehavior::Order(order) => Ok(order.clone()),
            ConfirmBehavior::Unavailable => Err(ApiError::Timeout),
        }
    }
}

/// Moment the sample catalog is evaluated at: Saturday 15 June 2024, 10:00 UTC.
#[must_use]
pub fn sample_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A small bakery menu with one special of every kind.
///
/// - Specials: 20% off cakes (1), buy 12 pastries get 1 free (2), `BRUNCH5`
///   bundle with one use left (3), baguettes for $3.00 (4), and one that
///   ended last year (5).
/// - Product 8 is inactive.
///
/// # Panics
///
/// Panics if the embedded fixture stops matching the catalog types.
#[must_use]
#[allow(clippy::too_many_lines, clippy::unwrap_used)]
pub fn sample_catalog() -> Catalog {
    let products = json!([
        { "id": 1, "name": "Croissant", "slug": "croissant", "price": "2.99", "categoryId": 1,
          "images": ["products/croissant.jpg"], "featured": true, "active": true },
        { "id": 2, "name": "Pain au Chocolat", "slug": "pain-au-chocolat", "price": "3.49",
          "categoryId": 1, "images": null, "active": true },
        { "id": 3, "name": "Sourdough Loaf", "slug": "sourdough-loaf", "price": "8.50",
          "description": "Naturally leavened and baked every morning",
          "categoryId": 2, "featured": true, "active": true },
        { "id": 4, "name": "Baguette", "slug": "baguette", "price": "4.25", "categoryId": 2,
          "active": true },
        { "id": 5, "name": "Carrot Cake Slice", "slug": "carrot-cake-slice", "price": "5.75",
          "categoryId": 3, "active": true },
        { "id": 6, "name": "Cold Brew", "slug": "cold-brew", "price": "4.00", "categoryId": 4,
          "active": true },
        { "id": 7, "name": "Spinach Quiche", "slug": "spinach-quiche", "price": "9.00",
          "categoryId": 5, "active": true },
        { "id": 8, "name": "Pumpkin Scone", "slug": "pumpkin-scone", "price": "3.25",
          "categoryId": 1, "active": false },
    ]);
    let categories = json!([
        { "id": 1, "name": "Pastries", "slug": "pastries", "order": 1, "active": true },
        { "id": 2, "name": "Breads", "slug": "breads", "order": 2, "active": true },
        { "id": 3, "name": "Cakes", "slug": "cakes", "order": 3, "active": true },
        { "id": 4, "name": "Drinks", "slug": "drinks", "order": 4, "active": true },
        { "id": 5, "name": "Brunch", "slug": "brunch", "order": 5, "active": true },
    ]);
    let specials = json!([
        { "id": 1, "name": "Spring Cake Sale", "type": "percentage_discount", "value": 20,
          "categoryIds": [3], "startDate": "2024-01-01T00:00:00Z",
          "endDate": "2024-12-31T23:59:59Z", "active": true },
        { "id": 2, "name": "Baker's Dozen", "type": "buy_x_get_y",
          "value": { "buyQuantity": 12, "getQuantity": 1 }, "categoryIds": [1],
          "startDate": "2024-01-01T00:00:00Z", "endDate": "2024-12-31T23:59:59Z",
          "active": true },
        { "id": 3, "name": "Weekend Brunch Bundle", "type": "bundle_discount", "value": 5,
          "categoryIds": [4, 5], "startDate": "2024-01-01T00:00:00Z",
          "endDate": "2024-12-31T23:59:59Z", "active": true, "minPurchase": 15,
          "maxUses": 100, "usedCount": 99, "code": "BRUNCH5" },
        { "id": 4, "name": "Baguette Day", "type": "fixed_price", "value": 3,
          "productIds": [4], "startDate": "2024-01-01T00:00:00Z",
          "endDate": "2024-12-31T23:59:59Z", "active": true },
        { "id": 5, "name": "New Year Clearance", "type": "percentage_discount", "value": 50,
          "startDate": "2023-12-26T00:00:00Z", "endDate": "2023-12-31T23:59:59Z",
          "active": true },
    ]);
    let promotions = json!([
        { "id": 1, "title": "Fresh every morning", "displayLocation": "homepage_hero",
          "order": 2, "startDate": "2024-01-01T00:00:00Z", "endDate": "2024-12-31T23:59:59Z",
          "active": true },
        { "id": 2, "title": "Brunch is back", "buttonText": "See specials",
          "buttonLink": "/specials", "displayLocation": "specials_page", "order": 1,
          "startDate": "2024-01-01T00:00:00Z", "endDate": "2024-12-31T23:59:59Z",
          "active": true },
    ]);
    let banners = json!([
        { "id": 1, "title": "Holiday hours", "message": "Closed July 4th", "type": "info",
          "dismissible": true, "displayLocation": "site_wide",
          "startDate": "2024-06-01T00:00:00Z", "endDate": "2024-07-05T00:00:00Z",
          "active": true },
        { "id": 2, "title": "Allergy notice", "message": "Our kitchen handles nuts",
          "type": "warning", "dismissible": false, "displayLocation": "site_wide",
          "startDate": "2024-01-01T00:00:00Z", "endDate": "2024-12-31T23:59:59Z",
          "active": true },
    ]);

    Catalog {
        products: serde_json::from_value(products).unwrap(),
        categories: serde_json::from_value(categories).unwrap(),
        specials: serde_json::from_value(specials).unwrap(),
        promotions: serde_json::from_value(promotions).unwrap(),
        banners: serde_json::from_value(banners).unwrap(),
        settings: serde_json::from_value(json!({
            "store_name": "Llama Treats",
            "delivery_enabled": true,
        }))
        .unwrap(),
    }
}
