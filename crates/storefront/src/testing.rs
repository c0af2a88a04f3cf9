//! Helpers for tests that need a storefront without a real bakery API.

use std::sync::Arc;
use std::time::Duration;

use llama_treats_core::TaxRate;
use url::Url;

use crate::bakery::fake::{FakeBakeryApi, sample_catalog, sample_now};
use crate::config::{BakeryApiConfig, StorefrontConfig};
use crate::state::AppState;

/// Config pointing at a bakery API that is never contacted.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "https://shop.llamatreats.com".to_string(),
        tax_rate: TaxRate::default(),
        bakery: BakeryApiConfig {
            base_url: Url::parse("http://localhost:3000/api/").expect("static url parses"),
            token: None,
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// State over the sample catalog, frozen at [`sample_now`].
///
/// The fake is returned too so tests can script the order API.
#[must_use]
pub fn test_state() -> (AppState, Arc<FakeBakeryApi>) {
    let api = Arc::new(FakeBakeryApi::new(sample_catalog()));
    let state = AppState::with_fixed_clock(test_config(), api.clone(), sample_now());
    (state, api)
}
