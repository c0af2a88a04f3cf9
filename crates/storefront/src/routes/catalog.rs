//! Catalog route handlers: products, categories, promotions, banners and
//! store settings.
//!
//! These never fail on a bakery API outage; the lists just come back empty.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use llama_treats_core::{
    Banner, BannerId, Category, CategoryId, DisplayLocation, Product, ProductSort, Promotion,
    Settings,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::services::{catalog, session_state};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub featured: bool,
    pub category: Option<CategoryId>,
    /// Free-text search over name and description.
    pub q: Option<String>,
    /// Catalog order when absent.
    pub sort: Option<ProductSort>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// GET /api/products?featured=&category=&q=&sort=
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<ProductsResponse> {
    let catalog = catalog::load_catalog(state.api()).await;
    let search = query.q.as_deref().unwrap_or_default();
    let mut products: Vec<&Product> = catalog
        .active_products()
        .filter(|p| !query.featured || p.featured)
        .filter(|p| query.category.is_none_or(|c| p.category_id == Some(c)))
        .filter(|p| p.matches_search(search))
        .collect();
    if let Some(sort) = query.sort {
        sort.apply(&mut products);
    }
    Json(ProductsResponse {
        products: products.into_iter().cloned().collect(),
    })
}

/// How many same-category products a product page suggests.
const RELATED_PRODUCTS: usize = 4;

#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    pub product: Product,
    pub category: Option<Category>,
    pub related: Vec<Product>,
}

/// GET /api/products/{id or slug}
///
/// # Errors
///
/// Returns `NotFound` if no product for sale has that id or slug.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ProductDetailResponse>, AppError> {
    let catalog = catalog::load_catalog(state.api()).await;
    let product = catalog
        .find_active_product(&key)
        .ok_or_else(|| AppError::NotFound(format!("product {key}")))?;

    Ok(Json(ProductDetailResponse {
        category: product
            .category_id
            .and_then(|id| catalog.category(id))
            .cloned(),
        related: catalog
            .related_products(product, RELATED_PRODUCTS)
            .into_iter()
            .cloned()
            .collect(),
        product: product.clone(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

/// GET /api/categories
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let catalog = catalog::load_catalog(state.api()).await;
    let mut categories: Vec<_> = catalog
        .categories
        .into_iter()
        .filter(|c| c.active)
        .collect();
    categories.sort_by_key(|c| (c.order, c.id));
    Json(CategoriesResponse { categories })
}

#[derive(Debug, Default, Deserialize)]
pub struct PromotionQuery {
    pub location: Option<DisplayLocation>,
}

#[derive(Debug, Serialize)]
pub struct PromotionsResponse {
    pub promotions: Vec<Promotion>,
}

/// GET /api/promotions?location=
#[instrument(skip(state))]
pub async fn promotions(
    State(state): State<AppState>,
    Query(query): Query<PromotionQuery>,
) -> Json<PromotionsResponse> {
    let catalog = catalog::load_catalog(state.api()).await;
    let promotions = catalog
        .active_promotions(state.now(), query.location)
        .into_iter()
        .cloned()
        .collect();
    Json(PromotionsResponse { promotions })
}

#[derive(Debug, Serialize)]
pub struct BannersResponse {
    pub banners: Vec<Banner>,
}

/// GET /api/banners
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn banners(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<BannersResponse>, AppError> {
    let dismissed = session_state::dismissed_banners(&session).await?;
    let catalog = catalog::load_catalog(state.api()).await;
    let banners = catalog
        .active_banners(state.now(), &dismissed)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(BannersResponse { banners }))
}

/// POST /api/banners/{id}/dismiss
///
/// # Errors
///
/// Returns `NotFound` for an unknown banner and `BadRequest` for one that
/// cannot be dismissed.
#[instrument(skip(state, session))]
pub async fn dismiss_banner(
    State(state): State<AppState>,
    session: Session,
    Path(banner_id): Path<BannerId>,
) -> Result<Json<BannersResponse>, AppError> {
    let catalog = catalog::load_catalog(state.api()).await;
    let banner = catalog
        .banners
        .iter()
        .find(|b| b.id == banner_id)
        .ok_or_else(|| AppError::NotFound(format!("banner {banner_id}")))?;
    if !banner.dismissible {
        return Err(AppError::BadRequest(format!(
            "banner {banner_id} cannot be dismissed"
        )));
    }

    session_state::dismiss_banner(&session, banner_id).await?;
    let dismissed = session_state::dismissed_banners(&session).await?;
    let banners = catalog
        .active_banners(state.now(), &dismissed)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(BannersResponse { banners }))
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: Settings,
}

/// GET /api/settings
#[instrument(skip(state))]
pub async fn settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    let catalog = catalog::load_catalog(state.api()).await;
    Json(SettingsResponse {
        settings: catalog.settings,
    })
}
