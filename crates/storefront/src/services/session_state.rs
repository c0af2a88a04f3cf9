//! Per-visitor checkout state kept in the session alongside the cart.

use llama_treats_core::specials::FreeItemSelection;
use llama_treats_core::{BannerId, ConfirmationTracker};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session_keys;

/// The buyer's in-progress free item picks, if any.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn load_selection(session: &Session) -> Result<Option<FreeItemSelection>, AppError> {
    Ok(session.get(session_keys::FREE_ITEMS).await?)
}

/// Store the picks, or forget them when `selection` is `None`.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn save_selection(
    session: &Session,
    selection: Option<&FreeItemSelection>,
) -> Result<(), AppError> {
    match selection {
        Some(selection) => session.insert(session_keys::FREE_ITEMS, selection).await?,
        None => {
            session
                .remove::<FreeItemSelection>(session_keys::FREE_ITEMS)
                .await?;
        }
    }
    Ok(())
}

/// The promo code the buyer validated earlier.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn load_promo_code(session: &Session) -> Result<Option<String>, AppError> {
    Ok(session.get(session_keys::PROMO_CODE).await?)
}

/// Remember a validated promo code, or forget it.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn save_promo_code(session: &Session, code: Option<&str>) -> Result<(), AppError> {
    match code {
        Some(code) => session.insert(session_keys::PROMO_CODE, code).await?,
        None => {
            session.remove::<String>(session_keys::PROMO_CODE).await?;
        }
    }
    Ok(())
}

/// Confirmation attempts for this visitor.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn load_tracker(session: &Session) -> Result<ConfirmationTracker, AppError> {
    Ok(session
        .get(session_keys::CONFIRMATIONS)
        .await?
        .unwrap_or_default())
}

/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn save_tracker(session: &Session, tracker: &ConfirmationTracker) -> Result<(), AppError> {
    session.insert(session_keys::CONFIRMATIONS, tracker).await?;
    Ok(())
}

/// Banners the visitor has closed.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn dismissed_banners(session: &Session) -> Result<Vec<BannerId>, AppError> {
    Ok(session
        .get(session_keys::DISMISSED_BANNERS)
        .await?
        .unwrap_or_default())
}

/// Record that the visitor closed `banner_id`.
///
/// # Errors
///
/// Returns `AppError::Session` if the session store fails.
pub async fn dismiss_banner(session: &Session, banner_id: BannerId) -> Result<(), AppError> {
    let mut dismissed = dismissed_banners(session).await?;
    if !dismissed.contains(&banner_id) {
        dismissed.push(banner_id);
        session
            .insert(session_keys::DISMISSED_BANNERS, dismissed)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_promo_code_can_be_forgotten() {
        let session = session();
        assert_eq!(load_promo_code(&session).await.unwrap(), None);

        save_promo_code(&session, Some("BRUNCH5")).await.unwrap();
        assert_eq!(
            load_promo_code(&session).await.unwrap().as_deref(),
            Some("BRUNCH5")
        );

        save_promo_code(&session, None).await.unwrap();
        assert_eq!(load_promo_code(&session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dismissing_twice_keeps_one_entry() {
        let session = session();
        dismiss_banner(&session, BannerId::new(1)).await.unwrap();
        dismiss_banner(&session, BannerId::new(1)).await.unwrap();
        assert_eq!(
            dismissed_banners(&session).await.unwrap(),
            vec![BannerId::new(1)]
        );
    }

    #[tokio::test]
    async fn test_tracker_defaults_to_fresh() {
        let session = session();
        let mut tracker = load_tracker(&session).await.unwrap();
        tracker.begin("cs_test_1").unwrap();
        save_tracker(&session, &tracker).await.unwrap();

        let restored = load_tracker(&session).await.unwrap();
        assert_eq!(restored.attempts_left("cs_test_1"), 0);
        assert_eq!(
            restored.attempts_left("cs_test_2"),
            ConfirmationTracker::MAX_ATTEMPTS
        );
    }
}
