//! HTTP implementation of [`BakeryApi`].
//!
//! Uses `reqwest` with a per-request timeout and caches catalog lists using
//! `moka`. Checkout calls always go to the network.

use std::sync::Arc;

use async_trait::async_trait;
use llama_treats_core::{Banner, Category, ConfirmedOrder, Product, Promotion, Settings, Special};
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheKey, CacheValue};
use super::conversions::parse_specials;
use super::types::{
    BannersResponse, CategoriesResponse, ConfirmOrderRequest, ConfirmOrderResponse,
    CreateSessionRequest, CreateSessionResponse, ErrorResponse, ProductsResponse,
    PromotionsResponse, SettingsResponse, SpecialsResponse, ValidateCodeRequest,
    ValidateCodeResponse,
};
use super::{ApiError, BakeryApi, CodeStatus};
use crate::config::BakeryApiConfig;

/// Client for the bakery REST API.
///
/// Cheaply cloneable; clones share the connection pool and the cache.
#[derive(Clone)]
pub struct HttpBakeryClient {
    inner: Arc<HttpBakeryClientInner>,
}

struct HttpBakeryClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl HttpBakeryClient {
    /// Create a new bakery API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BakeryApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(HttpBakeryClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.endpoint(path)?).send().await?;
        read_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .inner
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }
}

/// Check the status and decode the body.
///
/// Error bodies of the form `{ "error": "..." }` keep their message.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |e| e.error,
        );
        tracing::warn!(status = %status, message = %message, "Bakery API returned non-success status");
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse bakery API response"
        );
        ApiError::Parse(e.to_string())
    })
}

#[async_trait]
impl BakeryApi for HttpBakeryClient {
    #[instrument(skip(self))]
    async fn products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let response: ProductsResponse = self.get_json("products").await?;
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(response.products.clone()))
            .await;
        Ok(response.products)
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let response: CategoriesResponse = self.get_json("categories").await?;
        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(response.categories.clone()),
            )
            .await;
        Ok(response.categories)
    }

    #[instrument(skip(self))]
    async fn specials(&self) -> Result<Vec<Special>, ApiError> {
        if let Some(CacheValue::Specials(specials)) = self.inner.cache.get(&CacheKey::Specials).await
        {
            debug!("Cache hit for specials");
            return Ok(specials);
        }

        let response: SpecialsResponse = self.get_json("specials").await?;
        let specials = parse_specials(response.specials);
        self.inner
            .cache
            .insert(CacheKey::Specials, CacheValue::Specials(specials.clone()))
            .await;
        Ok(specials)
    }

    #[instrument(skip(self))]
    async fn promotions(&self) -> Result<Vec<Promotion>, ApiError> {
        if let Some(CacheValue::Promotions(promotions)) =
            self.inner.cache.get(&CacheKey::Promotions).await
        {
            debug!("Cache hit for promotions");
            return Ok(promotions);
        }

        let response: PromotionsResponse = self.get_json("promotions").await?;
        self.inner
            .cache
            .insert(
                CacheKey::Promotions,
                CacheValue::Promotions(response.promotions.clone()),
            )
            .await;
        Ok(response.promotions)
    }

    #[instrument(skip(self))]
    async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        if let Some(CacheValue::Banners(banners)) = self.inner.cache.get(&CacheKey::Banners).await {
            debug!("Cache hit for banners");
            return Ok(banners);
        }

        let response: BannersResponse = self.get_json("banners").await?;
        self.inner
            .cache
            .insert(CacheKey::Banners, CacheValue::Banners(response.banners.clone()))
            .await;
        Ok(response.banners)
    }

    #[instrument(skip(self))]
    async fn settings(&self) -> Result<Settings, ApiError> {
        if let Some(CacheValue::Settings(settings)) = self.inner.cache.get(&CacheKey::Settings).await
        {
            debug!("Cache hit for settings");
            return Ok(settings);
        }

        let response: SettingsResponse = self.get_json("settings").await?;
        self.inner
            .cache
            .insert(CacheKey::Settings, CacheValue::Settings(response.settings.clone()))
            .await;
        Ok(response.settings)
    }

    #[instrument(skip_all)]
    async fn validate_code(&self, code: &str) -> Result<CodeStatus, ApiError> {
        let result: Result<ValidateCodeResponse, ApiError> = self
            .post_json("specials/validate-code", &ValidateCodeRequest { code })
            .await;
        code_status(result)
    }

    #[instrument(skip(self, request), fields(items = request.items.len()))]
    async fn create_checkout_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<String, ApiError> {
        let response: CreateSessionResponse =
            self.post_json("checkout/create-session", request).await?;

        match (response.url, response.error) {
            (Some(url), _) => Ok(url),
            (None, error) => Err(ApiError::Api {
                status: 502,
                message: error.unwrap_or_else(|| "Failed to create checkout session".to_string()),
            }),
        }
    }

    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn confirm_order(
        &self,
        request: &ConfirmOrderRequest,
    ) -> Result<ConfirmedOrder, ApiError> {
        let response: ConfirmOrderResponse =
            self.post_json("checkout/confirm-order", request).await?;

        match (response.order, response.error) {
            (Some(order), _) => Ok(order),
            (None, error) => Err(ApiError::Api {
                status: 502,
                message: error.unwrap_or_else(|| "Order response had no order".to_string()),
            }),
        }
    }
}

/// Read a `validate-code` answer. 410 means used up, any other 4xx means the
/// code is not redeemable; everything else is a transport failure.
fn code_status(result: Result<ValidateCodeResponse, ApiError>) -> Result<CodeStatus, ApiError> {
    match result {
        Ok(response) if response.exhausted => Ok(CodeStatus::Exhausted),
        Ok(response) if response.valid => Ok(CodeStatus::Valid),
        Ok(_) => Ok(CodeStatus::Invalid),
        Err(ApiError::Api { status: 410, .. }) => Ok(CodeStatus::Exhausted),
        Err(e) if e.is_rejection() => Ok(CodeStatus::Invalid),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(base: &str) -> BakeryApiConfig {
        BakeryApiConfig {
            base_url: Url::parse(base).unwrap(),
            token: None,
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpBakeryClient::new(&config("http://localhost:4000/api/")).unwrap();
        assert_eq!(
            client.endpoint("checkout/create-session").unwrap().as_str(),
            "http://localhost:4000/api/checkout/create-session"
        );
        assert_eq!(
            client.endpoint("products").unwrap().as_str(),
            "http://localhost:4000/api/products"
        );
    }

    #[test]
    fn test_rejection_is_client_error_only() {
        let rejected = ApiError::Api {
            status: 400,
            message: "Invalid items".to_string(),
        };
        assert!(rejected.is_rejection());
        assert!(
            !ApiError::Api {
                status: 503,
                message: String::new()
            }
            .is_rejection()
        );
        assert!(!ApiError::Timeout.is_rejection());
    }

    fn answer(json: &str) -> Result<ValidateCodeResponse, ApiError> {
        Ok(serde_json::from_str(json).unwrap())
    }

    fn rejected(status: u16) -> Result<ValidateCodeResponse, ApiError> {
        Err(ApiError::Api {
            status,
            message: "Invalid promo code".to_string(),
        })
    }

    #[test]
    fn test_code_status_from_answers() {
        assert_eq!(code_status(answer(r#"{"valid":true}"#)).unwrap(), CodeStatus::Valid);
        assert_eq!(
            code_status(answer(r#"{"special":{"id":3}}"#)).unwrap(),
            CodeStatus::Valid
        );
        assert_eq!(code_status(answer(r#"{"valid":false}"#)).unwrap(), CodeStatus::Invalid);
        assert_eq!(
            code_status(answer(r#"{"valid":false,"limitReached":true}"#)).unwrap(),
            CodeStatus::Exhausted
        );
    }

    #[test]
    fn test_code_status_from_rejections() {
        assert_eq!(code_status(rejected(404)).unwrap(), CodeStatus::Invalid);
        assert_eq!(code_status(rejected(400)).unwrap(), CodeStatus::Invalid);
        assert_eq!(code_status(rejected(410)).unwrap(), CodeStatus::Exhausted);
        assert!(matches!(
            code_status(rejected(503)),
            Err(ApiError::Api { status: 503, .. })
        ));
        assert!(matches!(code_status(Err(ApiError::Timeout)), Err(ApiError::Timeout)));
    }
}
