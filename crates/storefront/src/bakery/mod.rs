//! Bakery REST API client.
//!
//! # Architecture
//!
//! - The bakery API is the source of truth for the catalog and for orders;
//!   the storefront keeps nothing but per-visitor session state
//! - Catalog lists are cached in-memory via `moka` (configurable TTL)
//! - Checkout and order confirmation are never cached
//! - Handlers depend on the [`BakeryApi`] trait so tests can swap in a fake
//!
//! # Endpoints
//!
//! ```text
//! GET  /products                    { products: [...] }
//! GET  /categories                  { categories: [...] }
//! GET  /specials                    { specials: [...] }
//! GET  /promotions                  { promotions: [...] }
//! GET  /banners                     { banners: [...] }
//! GET  /settings                    { settings: {...} }
//! POST /specials/validate-code      { valid, exhausted? } | 4xx { error }
//! POST /checkout/create-session     { url } | { error }
//! POST /checkout/confirm-order      { order } | { error }
//! ```

mod cache;
mod client;
pub mod conversions;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod types;

pub use client::HttpBakeryClient;
pub use types::{ConfirmOrderRequest, CreateSessionRequest, CustomerInfo, SessionItem};

use async_trait::async_trait;
use llama_treats_core::{Banner, Category, ConfirmedOrder, Product, Promotion, Settings, Special};
use thiserror::Error;

/// Errors that can occur when talking to the bakery API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request to the bakery API timed out")]
    Timeout,

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl ApiError {
    /// Whether the API rejected the request itself (4xx), as opposed to
    /// being unreachable or failing internally.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }
}

/// The bakery API's verdict on a promo code.
///
/// Usage counts move with every order, so this is asked live and never
/// served from the catalog cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStatus {
    Valid,
    /// Unknown, switched off or outside its dates.
    Invalid,
    /// Known, but its usage limit is reached.
    Exhausted,
}

/// Operations the storefront needs from the bakery API.
#[async_trait]
pub trait BakeryApi: Send + Sync {
    /// All products, active or not.
    async fn products(&self) -> Result<Vec<Product>, ApiError>;

    async fn categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Specials in canonical form. Records that fail to parse are dropped.
    async fn specials(&self) -> Result<Vec<Special>, ApiError>;

    async fn promotions(&self) -> Result<Vec<Promotion>, ApiError>;

    async fn banners(&self) -> Result<Vec<Banner>, ApiError>;

    async fn settings(&self) -> Result<Settings, ApiError>;

    /// Ask the API whether `code` can be redeemed right now.
    async fn validate_code(&self, code: &str) -> Result<CodeStatus, ApiError>;

    /// Open a payment session and return the URL to send the buyer to.
    async fn create_checkout_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<String, ApiError>;

    /// Record the order for a completed payment session.
    async fn confirm_order(&self, request: &ConfirmOrderRequest)
    -> Result<ConfirmedOrder, ApiError>;
}
