//! Catalog loading.
//!
//! Every list is fetched concurrently. A list that fails to load is logged
//! and treated as empty so the rest of the storefront keeps working.

use llama_treats_core::{Catalog, Product, ProductId};
use tracing::instrument;

use crate::bakery::{ApiError, BakeryApi};
use crate::error::AppError;

/// Fetch every catalog list, falling back to empty per list.
#[instrument(skip(api))]
pub async fn load_catalog(api: &dyn BakeryApi) -> Catalog {
    let (products, categories, specials, promotions, banners, settings) = tokio::join!(
        api.products(),
        api.categories(),
        api.specials(),
        api.promotions(),
        api.banners(),
        api.settings(),
    );

    Catalog {
        products: or_empty("products", products),
        categories: or_empty("categories", categories),
        specials: or_empty("specials", specials),
        promotions: or_empty("promotions", promotions),
        banners: or_empty("banners", banners),
        settings: or_empty("settings", settings),
    }
}

fn or_empty<T: Default>(resource: &str, result: Result<T, ApiError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(resource, error = %e, "Catalog fetch failed, using empty list");
        T::default()
    })
}

/// Look up a product that can be added to the cart.
///
/// Unlike the catalog lists this does not fall back: if the product list
/// cannot be fetched the caller gets the API error.
///
/// # Errors
///
/// Returns `AppError::Api` if the product list cannot be fetched and
/// `AppError::NotFound` if the product is unknown or no longer for sale.
pub async fn find_active_product(
    api: &dyn BakeryApi,
    product_id: ProductId,
) -> Result<Product, AppError> {
    api.products()
        .await?
        .into_iter()
        .find(|p| p.id == product_id && p.active)
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))
}
