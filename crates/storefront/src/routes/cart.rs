//! Cart route handlers.
//!
//! Every mutation loads the cart from the session, applies one change and
//! saves it back, then answers with the full cart view so the client never
//! has to recompute totals.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use llama_treats_core::{Cart, Catalog, ProductId, SpecialEvaluator, SpecialId, round_cents};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::services::{cart_store, catalog};
use crate::state::AppState;

/// One cart line as shown to the buyer.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub image: Option<String>,
}

/// How close the cart is to a special.
#[derive(Debug, Clone, Serialize)]
pub struct SpecialProgress {
    pub special_id: SpecialId,
    pub name: String,
    pub label: String,
    pub satisfied: bool,
    pub remaining: u64,
    pub message: Option<String>,
}

/// The cart with display totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub tax_rate: Decimal,
    /// Live, code-less specials the cart has started on.
    pub specials: Vec<SpecialProgress>,
}

impl CartView {
    #[must_use]
    pub fn build(cart: &Cart, catalog: &Catalog, now: DateTime<Utc>) -> Self {
        let totals = cart.totals().rounded();
        let evaluator = SpecialEvaluator::new(&catalog.products, now);
        let specials = evaluator
            .evaluate_all(&catalog.specials, cart)
            .into_iter()
            .filter(|(special, result)| special.code.is_none() && result.qualifying_cart_count > 0)
            .map(|(special, result)| SpecialProgress {
                special_id: special.id,
                name: special.name.clone(),
                label: special.label(),
                satisfied: result.satisfied,
                remaining: result.remaining,
                message: result.progress_message(),
            })
            .collect();

        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    line_total: round_cents(line.line_total()),
                    image: line.image_ref.clone(),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            tax_rate: cart.tax_rate().as_decimal(),
            specials,
        }
    }
}

const fn one() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Body of the remove, increment and decrement routes.
#[derive(Debug, Deserialize)]
pub struct CartLineRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

async fn view(state: &AppState, cart: &Cart) -> Json<CartView> {
    let catalog = catalog::load_catalog(state.api()).await;
    Json(CartView::build(cart, &catalog, state.now()))
}

/// Save `cart` and answer with its view.
async fn saved(
    state: &AppState,
    session: &Session,
    cart: &Cart,
) -> Result<Json<CartView>, AppError> {
    cart_store::save_cart(session, cart).await?;
    Ok(view(state, cart).await)
}

/// GET /api/cart
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartView>, AppError> {
    let cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    Ok(view(&state, &cart).await)
}

/// POST /api/cart/add
///
/// Prices come from the catalog, never from the request.
///
/// # Errors
///
/// Returns `NotFound` for unknown or inactive products and `CartError`
/// variants for a bad quantity.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>, AppError> {
    let product = catalog::find_active_product(state.api(), request.product_id).await?;
    let mut cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    cart.add_item(&product, request.quantity)?;
    tracing::debug!(product_id = %request.product_id, quantity = request.quantity, "Added to cart");
    saved(&state, &session, &cart).await
}

/// POST /api/cart/update
///
/// # Errors
///
/// Returns `CartError::QuantityTooLarge` above the per-line maximum.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    cart.set_quantity(request.product_id, request.quantity)?;
    saved(&state, &session, &cart).await
}

/// POST /api/cart/remove
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartLineRequest>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    cart.remove_item(request.product_id);
    saved(&state, &session, &cart).await
}

/// POST /api/cart/increment
///
/// # Errors
///
/// Returns `CartError::QuantityTooLarge` if the line is already full.
#[instrument(skip(state, session))]
pub async fn increment(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartLineRequest>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    cart.increment_quantity(request.product_id)?;
    saved(&state, &session, &cart).await
}

/// POST /api/cart/decrement
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn decrement(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartLineRequest>,
) -> Result<Json<CartView>, AppError> {
    let mut cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    cart.decrement_quantity(request.product_id);
    saved(&state, &session, &cart).await
}

/// POST /api/cart/clear
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartView>, AppError> {
    let mut cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    cart.clear();
    saved(&state, &session, &cart).await
}

/// GET /api/cart/count
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn count(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartCount>, AppError> {
    let cart = cart_store::load_cart(&session, state.tax_rate()).await?;
    Ok(Json(CartCount {
        count: cart.item_count(),
    }))
}
