//! Wire types for the bakery API.
//!
//! List endpoints wrap their payload in a named envelope. Missing envelope
//! fields are treated as empty lists.

use chrono::NaiveDate;
use llama_treats_core::{
    Banner, Category, ConfirmedOrder, CustomerId, FulfillmentType, Product, ProductId, Promotion,
    Settings, SpecialId, specials::FreeItem,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Specials stay raw JSON here so one bad record cannot sink the list.
#[derive(Debug, Deserialize)]
pub struct SpecialsResponse {
    #[serde(default)]
    pub specials: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct PromotionsResponse {
    #[serde(default)]
    pub promotions: Vec<Promotion>,
}

#[derive(Debug, Deserialize)]
pub struct BannersResponse {
    #[serde(default)]
    pub banners: Vec<Banner>,
}

#[derive(Debug, Deserialize)]
pub struct SettingsResponse {
    #[serde(default)]
    pub settings: Settings,
}

/// Body of `POST /specials/validate-code`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateCodeRequest<'a> {
    pub code: &'a str,
}

const fn valid_by_default() -> bool {
    true
}

/// A 2xx answer from `validate-code`. Older builds answer with the special
/// alone, which counts as valid.
#[derive(Debug, Deserialize)]
pub struct ValidateCodeResponse {
    #[serde(default = "valid_by_default")]
    pub valid: bool,
    #[serde(default, alias = "limitReached")]
    pub exhausted: bool,
}

/// One cart line as the order API prices it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionItem {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    pub image: Option<String>,
}

/// Pickup or delivery fields, flattened into [`CustomerInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FulfillmentDetails {
    Pickup {
        pickup_date: NaiveDate,
        pickup_time: String,
    },
    Delivery {
        address: String,
        apartment: Option<String>,
        city: String,
        state: String,
        zip_code: String,
        delivery_instructions: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerInfo {
    pub email: String,
    pub phone: String,
    pub order_type: FulfillmentType,
    pub customer_id: Option<CustomerId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    #[serde(flatten)]
    pub details: FulfillmentDetails,
}

/// Body of `POST /checkout/create-session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateSessionRequest {
    pub items: Vec<SessionItem>,
    pub customer_info: CustomerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_id: Option<SpecialId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub free_items: Vec<FreeItem>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /checkout/confirm-order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmOrderRequest {
    pub session_id: String,
    pub customer_id: Option<CustomerId>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmOrderResponse {
    #[serde(default)]
    pub order: Option<ConfirmedOrder>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error body the API sends with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
