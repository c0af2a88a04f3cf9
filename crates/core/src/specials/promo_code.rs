//! Promo code redemption.

use chrono::{DateTime, Utc};

use crate::specials::special::Special;

/// Why a promo code was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoCodeError {
    #[error("please enter a promo code")]
    Empty,
    /// No live special carries this code.
    #[error("invalid promo code")]
    Invalid,
    /// The special exists but its usage limit is used up.
    #[error("promo code {code} is no longer available")]
    Exhausted { code: String },
}

/// Find the live special a promo code redeems.
///
/// Matching is case-insensitive and ignores surrounding whitespace. Specials
/// that are switched off or outside their window are not candidates, so an
/// expired code is reported as invalid rather than exhausted.
///
/// # Errors
///
/// Returns `PromoCodeError::Invalid` for unknown codes and
/// `PromoCodeError::Exhausted` when the matched special has reached `max_uses`.
pub fn redeem<'s>(
    specials: &'s [Special],
    code: &str,
    now: DateTime<Utc>,
) -> Result<&'s Special, PromoCodeError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(PromoCodeError::Empty);
    }

    let special = specials
        .iter()
        .filter(|s| s.is_live(now))
        .find(|s| s.matches_code(code))
        .ok_or(PromoCodeError::Invalid)?;

    if special.is_exhausted() {
        return Err(PromoCodeError::Exhausted {
            code: special.code.clone().unwrap_or_default(),
        });
    }
    Ok(special)
}
