//! Favorites route handlers.
//!
//! Favorites hold product ids only; every response resolves them against the
//! current catalog, so products taken off sale drop out of the list shown.

use axum::{
    Json,
    extract::{Path, State},
};
use llama_treats_core::{Favorites, Product, ProductId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::services::catalog;
use crate::services::favorites::{load_favorites, save_favorites};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct FavoritesView {
    pub product_ids: Vec<ProductId>,
    pub products: Vec<Product>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub product_id: ProductId,
    pub favorite: bool,
    pub count: usize,
}

async fn view(state: &AppState, favorites: &Favorites) -> Json<FavoritesView> {
    let catalog = catalog::load_catalog(state.api()).await;
    Json(FavoritesView {
        product_ids: favorites.product_ids().to_vec(),
        products: favorites.resolve(&catalog).into_iter().cloned().collect(),
        count: favorites.len(),
    })
}

/// GET /api/favorites
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<FavoritesView>, AppError> {
    let favorites = load_favorites(&session).await?;
    Ok(view(&state, &favorites).await)
}

/// GET /api/favorites/{product_id}
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(session))]
pub async fn status(
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<FavoriteStatus>, AppError> {
    let favorites = load_favorites(&session).await?;
    Ok(Json(FavoriteStatus {
        product_id,
        favorite: favorites.contains(product_id),
        count: favorites.len(),
    }))
}

/// POST /api/favorites/add
///
/// # Errors
///
/// Returns `NotFound` if the product is not for sale.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoritesView>, AppError> {
    catalog::find_active_product(state.api(), request.product_id).await?;
    let mut favorites = load_favorites(&session).await?;
    if favorites.add(request.product_id) {
        save_favorites(&session, &favorites).await?;
    }
    Ok(view(&state, &favorites).await)
}

/// POST /api/favorites/remove
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoritesView>, AppError> {
    let mut favorites = load_favorites(&session).await?;
    favorites.remove(request.product_id);
    save_favorites(&session, &favorites).await?;
    Ok(view(&state, &favorites).await)
}

/// POST /api/favorites/toggle
///
/// Removing always works; saving needs the product to be for sale.
///
/// # Errors
///
/// Returns `NotFound` when saving a product that is not for sale.
#[instrument(skip(state, session))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<FavoriteRequest>,
) -> Result<Json<FavoriteStatus>, AppError> {
    let mut favorites = load_favorites(&session).await?;
    if !favorites.contains(request.product_id) {
        catalog::find_active_product(state.api(), request.product_id).await?;
    }
    let favorite = favorites.toggle(request.product_id);
    save_favorites(&session, &favorites).await?;
    Ok(Json(FavoriteStatus {
        product_id: request.product_id,
        favorite,
        count: favorites.len(),
    }))
}

/// POST /api/favorites/clear
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<FavoritesView>, AppError> {
    let favorites = Favorites::new();
    save_favorites(&session, &favorites).await?;
    Ok(view(&state, &favorites).await)
}
