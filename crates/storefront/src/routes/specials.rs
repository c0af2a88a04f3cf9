//! Specials route handlers.
//!
//! Specials are shown with the visitor's progress toward each one. Promo
//! codes are never sent to the client: a view only says whether a code is
//! needed, and a code typed by the buyer is checked server-side.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use llama_treats_core::specials::{FreeItem, FreeItemSelection, SpecialType};
use llama_treats_core::{
    Cart, Catalog, EligibilityResult, ProductId, Special, SpecialEvaluator, SpecialId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::services::free_items::FreeItemAction;
use crate::services::{cart_store, catalog, free_items as picks, promo_codes, session_state};
use crate::state::AppState;

/// A special as shown to the buyer.
#[derive(Debug, Clone, Serialize)]
pub struct SpecialView {
    pub id: SpecialId,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub special_type: SpecialType,
    pub label: String,
    pub code_required: bool,
    pub image: Option<String>,
    pub categories: Vec<String>,
    pub min_purchase: Option<Decimal>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub eligibility: EligibilityResult,
    pub progress: Option<String>,
}

impl SpecialView {
    fn new(special: &Special, result: EligibilityResult, catalog: &Catalog) -> Self {
        Self {
            id: special.id,
            name: special.name.clone(),
            description: special.description.clone(),
            special_type: special.special_type(),
            label: special.label(),
            code_required: special.code.is_some(),
            image: special.image.clone(),
            categories: catalog
                .category_names(&special.scope.category_ids)
                .into_iter()
                .map(String::from)
                .collect(),
            min_purchase: special.min_purchase,
            starts_at: special.window.start,
            ends_at: special.window.end,
            progress: result.progress_message(),
            eligibility: result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SpecialsResponse {
    pub specials: Vec<SpecialView>,
}

async fn load(state: &AppState, session: &Session) -> Result<(Catalog, Cart), AppError> {
    let cart = cart_store::load_cart(session, state.tax_rate()).await?;
    let catalog = catalog::load_catalog(state.api()).await;
    Ok((catalog, cart))
}

/// GET /api/specials
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SpecialsResponse>, AppError> {
    let (catalog, cart) = load(&state, &session).await?;
    let evaluator = SpecialEvaluator::new(&catalog.products, state.now());
    let specials = evaluator
        .evaluate_all(&catalog.specials, &cart)
        .into_iter()
        .map(|(special, result)| SpecialView::new(special, result, &catalog))
        .collect();
    Ok(Json(SpecialsResponse { specials }))
}

/// GET /api/specials/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown specials and ones that are not live.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(special_id): Path<SpecialId>,
) -> Result<Json<SpecialView>, AppError> {
    let (catalog, cart) = load(&state, &session).await?;
    let evaluator = SpecialEvaluator::new(&catalog.products, state.now());
    let (special, result) = catalog
        .special(special_id)
        .and_then(|s| evaluator.evaluate(s, &cart).map(|r| (s, r)))
        .ok_or_else(|| AppError::NotFound(format!("special {special_id}")))?;
    Ok(Json(SpecialView::new(special, result, &catalog)))
}

#[derive(Debug, Deserialize)]
pub struct ValidateCodeRequest {
    #[serde(default)]
    pub code: String,
}

/// POST /api/specials/validate-code
///
/// The code is checked live with the bakery API, then against the loaded
/// specials. A valid code is remembered for checkout. The response describes
/// the special it unlocks, still without echoing the stored code.
///
/// # Errors
///
/// Returns `PromoCodeError` variants for empty, unknown or used-up codes and
/// `AppError::Api` if the bakery API cannot be asked.
#[instrument(skip_all)]
pub async fn validate_code(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ValidateCodeRequest>,
) -> Result<Json<SpecialView>, AppError> {
    let (catalog, cart) = load(&state, &session).await?;
    let now = state.now();
    let special = promo_codes::redeem(state.api(), &catalog.specials, &request.code, now).await?;

    let evaluator = SpecialEvaluator::new(&catalog.products, now);
    let result = evaluator.evaluate(special, &cart).ok_or_else(|| {
        AppError::Internal(format!("redeemed special {} is not live", special.id))
    })?;

    session_state::save_promo_code(&session, special.code.as_deref()).await?;
    tracing::info!(special_id = %special.id, "Promo code accepted");
    Ok(Json(SpecialView::new(special, result, &catalog)))
}

/// The buyer's free item picks.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionView {
    pub special_id: SpecialId,
    pub choices: Vec<ProductId>,
    pub items: Vec<FreeItem>,
    pub selected: u32,
    pub remaining: u32,
    pub complete: bool,
}

impl From<&FreeItemSelection> for SelectionView {
    fn from(selection: &FreeItemSelection) -> Self {
        Self {
            special_id: selection.special_id(),
            choices: selection.pool().to_vec(),
            items: selection.items(),
            selected: selection.selected_count(),
            remaining: selection.remaining(),
            complete: selection.is_complete(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FreeItemsRequest {
    pub action: FreeItemAction,
    #[serde(default, alias = "productId")]
    pub product_id: Option<ProductId>,
}

/// GET /api/specials/{id}/free-items
///
/// # Errors
///
/// Returns `NotFound` for unknown specials and `FreeItemError::NotAvailable`
/// until the cart satisfies the special.
#[instrument(skip(state, session))]
pub async fn free_items(
    State(state): State<AppState>,
    session: Session,
    Path(special_id): Path<SpecialId>,
) -> Result<Json<SelectionView>, AppError> {
    let selection = picks::selection(&state, &session, special_id).await?;
    Ok(Json(SelectionView::from(&selection)))
}

/// POST /api/specials/{id}/free-items
///
/// # Errors
///
/// Besides the errors of [`free_items`], returns `FreeItemError` variants for
/// products outside the pool or picks beyond the free quantity.
#[instrument(skip(state, session))]
pub async fn update_free_items(
    State(state): State<AppState>,
    session: Session,
    Path(special_id): Path<SpecialId>,
    Json(request): Json<FreeItemsRequest>,
) -> Result<Json<SelectionView>, AppError> {
    let selection = picks::update_selection(
        &state,
        &session,
        special_id,
        request.action,
        request.product_id,
    )
    .await?;
    Ok(Json(SelectionView::from(&selection)))
}
