//! Choosing free items for a satisfied buy-X-get-Y special.
//!
//! Picks are kept in the session and re-checked against the current cart on
//! every change. A visitor works on one selection at a time; starting on a
//! different special replaces it.

use llama_treats_core::specials::{EligibilityResult, FreeItemError, FreeItemSelection};
use llama_treats_core::{ProductId, SpecialEvaluator, SpecialId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::services::{cart_store, catalog, session_state};
use crate::state::AppState;

/// What to do with one free item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeItemAction {
    Add,
    Remove,
    /// Skip whatever is still unpicked.
    Forfeit,
}

/// Evaluate `special_id` against the visitor's cart.
async fn evaluate(
    state: &AppState,
    session: &Session,
    special_id: SpecialId,
) -> Result<EligibilityResult, AppError> {
    let cart = cart_store::load_cart(session, state.tax_rate()).await?;
    let catalog = catalog::load_catalog(state.api()).await;
    let special = catalog
        .special(special_id)
        .ok_or_else(|| AppError::NotFound(format!("special {special_id}")))?;

    let evaluator = SpecialEvaluator::new(&catalog.products, state.now());
    let result = evaluator
        .evaluate(special, &cart)
        .ok_or(FreeItemError::NotAvailable(special_id))?;
    Ok(result)
}

/// The stored selection for `special_id`, refreshed against `result`, or a
/// fresh one.
async fn current(
    session: &Session,
    result: &EligibilityResult,
) -> Result<FreeItemSelection, AppError> {
    let stored = session_state::load_selection(session)
        .await?
        .filter(|s| s.special_id() == result.special_id)
        .and_then(|s| s.refreshed(result));

    match stored {
        Some(selection) => Ok(selection),
        None => Ok(FreeItemSelection::for_result(result)?),
    }
}

/// The visitor's picks for `special_id`.
///
/// # Errors
///
/// Returns `NotFound` for an unknown special and `FreeItemError::NotAvailable`
/// if the cart does not satisfy it.
#[instrument(skip(state, session))]
pub async fn selection(
    state: &AppState,
    session: &Session,
    special_id: SpecialId,
) -> Result<FreeItemSelection, AppError> {
    let result = evaluate(state, session, special_id).await?;
    current(session, &result).await
}

/// Apply one change to the visitor's picks and store the result.
///
/// # Errors
///
/// Besides the errors of [`selection`], returns `BadRequest` when `Add` or
/// `Remove` comes without a product, and the `FreeItemError` from the pick
/// itself (product outside the pool, quota reached).
#[instrument(skip(state, session))]
pub async fn update_selection(
    state: &AppState,
    session: &Session,
    special_id: SpecialId,
    action: FreeItemAction,
    product_id: Option<ProductId>,
) -> Result<FreeItemSelection, AppError> {
    let result = evaluate(state, session, special_id).await?;
    let mut selection = current(session, &result).await?;

    let product = || {
        product_id.ok_or_else(|| AppError::BadRequest("product_id is required".to_string()))
    };
    match action {
        FreeItemAction::Add => selection.increment(product()?)?,
        FreeItemAction::Remove => selection.decrement(product()?),
        FreeItemAction::Forfeit => selection.forfeit_remainder(),
    }

    session_state::save_selection(session, Some(&selection)).await?;
    Ok(selection)
}
