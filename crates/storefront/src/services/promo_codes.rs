//! Promo code redemption against the bakery API.
//!
//! The API owns usage counts, so it is asked first on every redemption. The
//! catalog copy of the specials is then checked as well, both to find the
//! special the code unlocks and to refuse codes the cached list already
//! knows are dead.

use chrono::{DateTime, Utc};
use llama_treats_core::Special;
use llama_treats_core::specials::{PromoCodeError, redeem as redeem_locally};
use tracing::instrument;

use crate::bakery::{BakeryApi, CodeStatus};
use crate::error::AppError;

/// Redeem `code` against the live API and the loaded `specials`.
///
/// # Errors
///
/// Returns `PromoCodeError::Empty` for a blank code, `Invalid` or
/// `Exhausted` when either the API or the local specials refuse it, and
/// `AppError::Api` when the API cannot be reached.
#[instrument(skip(api, specials, code))]
pub async fn redeem<'s>(
    api: &dyn BakeryApi,
    specials: &'s [Special],
    code: &str,
    now: DateTime<Utc>,
) -> Result<&'s Special, AppError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(PromoCodeError::Empty.into());
    }

    match api.validate_code(code).await? {
        CodeStatus::Valid => {}
        CodeStatus::Invalid => return Err(PromoCodeError::Invalid.into()),
        CodeStatus::Exhausted => {
            tracing::info!("Promo code used up according to the bakery API");
            return Err(PromoCodeError::Exhausted {
                code: code.to_uppercase(),
            }
            .into());
        }
    }

    Ok(redeem_locally(specials, code, now)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use llama_treats_core::SpecialId;

    use super::*;
    use crate::bakery::ApiError;
    use crate::bakery::fake::{FakeBakeryApi, sample_catalog, sample_now};

    #[tokio::test]
    async fn test_valid_code() {
        let api = FakeBakeryApi::new(sample_catalog());
        let catalog = sample_catalog();
        let special = redeem(&api, &catalog.specials, " brunch5 ", sample_now())
            .await
            .unwrap();
        assert_eq!(special.id, SpecialId::new(3));
        assert_eq!(api.code_checks(), vec!["BRUNCH5"]);
    }

    #[tokio::test]
    async fn test_api_usage_count_wins_over_loaded_specials() {
        let api = FakeBakeryApi::new(sample_catalog());
        let catalog = sample_catalog();
        // Loaded specials still say 99 of 100 uses.
        api.use_up_code("BRUNCH5");

        let err = redeem(&api, &catalog.specials, "BRUNCH5", sample_now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::PromoCode(PromoCodeError::Exhausted { ref code }) if code == "BRUNCH5"
        ));
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let api = FakeBakeryApi::new(sample_catalog());
        let catalog = sample_catalog();
        let err = redeem(&api, &catalog.specials, "FREECAKE", sample_now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PromoCode(PromoCodeError::Invalid)));
    }

    #[tokio::test]
    async fn test_blank_code_never_reaches_api() {
        let api = FakeBakeryApi::new(sample_catalog());
        let err = redeem(&api, &[], "   ", sample_now()).await.unwrap_err();
        assert!(matches!(err, AppError::PromoCode(PromoCodeError::Empty)));
        assert!(api.code_checks().is_empty());
    }

    #[tokio::test]
    async fn test_api_outage_is_not_a_verdict() {
        let api = FakeBakeryApi::new(sample_catalog());
        api.set_catalog_down(true);
        let catalog = sample_catalog();
        let err = redeem(&api, &catalog.specials, "BRUNCH5", sample_now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Api { status: 503, .. })));
    }
}
