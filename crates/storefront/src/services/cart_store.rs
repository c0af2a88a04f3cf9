//! Cart persistence in the visitor's session.
//!
//! The cart is stored as a JSON `CartSnapshot`. Handlers load it at the start
//! of a request, mutate the in-memory [`Cart`], and save it back; a snapshot
//! that no longer parses is discarded instead of failing the request.

use llama_treats_core::{Cart, TaxRate};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// Load the visitor's cart, or an empty one.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn load_cart(session: &Session, tax_rate: TaxRate) -> Result<Cart, AppError> {
    let Some(json) = session.get::<String>(session_keys::CART).await? else {
        return Ok(Cart::new(tax_rate));
    };

    match Cart::from_snapshot_json(&json, tax_rate) {
        Ok(cart) => Ok(cart),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart snapshot");
            session.remove::<String>(session_keys::CART).await?;
            Ok(Cart::new(tax_rate))
        }
    }
}

/// Persist the cart. An empty cart removes the snapshot.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), AppError> {
    if cart.is_empty() {
        session.remove::<String>(session_keys::CART).await?;
        return Ok(());
    }

    let json = serde_json::to_string(&cart.snapshot())
        .map_err(|e| AppError::Internal(format!("cart snapshot: {e}")))?;
    session.insert(session_keys::CART, json).await?;
    Ok(())
}
