//! Saved products, kept in the visitor's session like the cart.

use llama_treats_core::Favorites;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// Load the visitor's favorites. A stored list that no longer parses is
/// dropped.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn load_favorites(session: &Session) -> Result<Favorites, AppError> {
    let Some(json) = session.get::<String>(session_keys::FAVORITES).await? else {
        return Ok(Favorites::new());
    };

    match Favorites::from_json(&json) {
        Ok(favorites) => Ok(favorites),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable favorites");
            session.remove::<String>(session_keys::FAVORITES).await?;
            Ok(Favorites::new())
        }
    }
}

/// Persist the favorites. An empty list removes the key.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn save_favorites(session: &Session, favorites: &Favorites) -> Result<(), AppError> {
    if favorites.is_empty() {
        session.remove::<String>(session_keys::FAVORITES).await?;
        return Ok(());
    }

    let json = favorites
        .to_json()
        .map_err(|e| AppError::Internal(format!("favorites: {e}")))?;
    session.insert(session_keys::FAVORITES, json).await?;
    Ok(())
}
