//! Order confirmation after the payment redirect.
//!
//! The payment provider sends the buyer back with its session id. Browsers
//! replay that return (back button, refresh), so [`ConfirmationTracker`]
//! makes sure each session id is confirmed at most once. A failed attempt
//! re-arms exactly one retry, and the cart is only cleared after the order
//! API returns an order that matches the session.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationError {
    #[error("missing checkout session id")]
    MissingSessionId,
    /// The buyer backed out of payment.
    #[error("checkout was cancelled")]
    Cancelled,
    #[error("order {reference} is already confirmed")]
    AlreadyConfirmed { reference: String },
    #[error("order confirmation is already in progress")]
    InProgress,
    #[error("could not confirm your order; please contact us with reference {reference}")]
    AttemptsExhausted { reference: String },
    /// The order API answered, but its order does not line up with this checkout.
    #[error("order could not be reconciled: {0}")]
    Reconciliation(String),
}

/// How the buyer came back from the payment page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentReturn {
    Success,
    Cancelled,
}

impl PaymentReturn {
    /// Read the provider's `success` / `canceled` flags. Anything other than
    /// an explicit success counts as cancelled.
    #[must_use]
    pub fn from_flags(success: Option<bool>, canceled: Option<bool>) -> Self {
        if success == Some(true) && canceled != Some(true) {
            Self::Success
        } else {
            Self::Cancelled
        }
    }
}

/// The order as the order API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedOrder {
    #[serde(default, alias = "orderNumber")]
    pub order_number: Option<String>,
    #[serde(default, alias = "sessionId", alias = "stripe_session_id")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "paymentStatus")]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub total: Option<Decimal>,
}

impl ConfirmedOrder {
    /// Reference to show the buyer: the order number, or failing that the
    /// tail of the payment session id.
    #[must_use]
    pub fn reference(&self, session_id: &str) -> String {
        self.order_number
            .clone()
            .unwrap_or_else(|| session_reference(session_id))
    }
}

/// Last eight characters of a session id, uppercased.
#[must_use]
pub fn session_reference(session_id: &str) -> String {
    let start = session_id
        .char_indices()
        .rev()
        .nth(7)
        .map_or(0, |(index, _)| index);
    session_id.get(start..).unwrap_or(session_id).to_uppercase()
}

/// Check that the returned order belongs to `session_id` and was paid.
///
/// # Errors
///
/// Returns `ConfirmationError::Reconciliation` if the order names a different
/// session or reports a payment status other than `paid`.
pub fn reconcile(session_id: &str, order: &ConfirmedOrder) -> Result<(), ConfirmationError> {
    if let Some(own) = order.session_id.as_deref().filter(|own| *own != session_id) {
        return Err(ConfirmationError::Reconciliation(format!(
            "order belongs to session {own}"
        )));
    }
    if let Some(status) = order
        .payment_status
        .as_deref()
        .filter(|status| !status.eq_ignore_ascii_case("paid"))
    {
        return Err(ConfirmationError::Reconciliation(format!(
            "payment status is {status}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum AttemptState {
    InFlight,
    Confirmed { reference: String },
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Attempt {
    state: AttemptState,
    count: u8,
}

/// Per-visitor record of confirmation attempts, keyed by payment session id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationTracker {
    attempts: BTreeMap<String, Attempt>,
}

impl ConfirmationTracker {
    /// The first attempt plus one retry after a failure.
    pub const MAX_ATTEMPTS: u8 = 2;

    /// Claim the right to confirm `session_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session id is blank, already confirmed,
    /// currently being confirmed, or out of retries.
    pub fn begin(&mut self, session_id: &str) -> Result<(), ConfirmationError> {
        if session_id.trim().is_empty() {
            return Err(ConfirmationError::MissingSessionId);
        }

        let attempt = self
            .attempts
            .entry(session_id.to_owned())
            .or_insert(Attempt {
                state: AttemptState::Failed,
                count: 0,
            });

        if let AttemptState::Confirmed { reference } = &attempt.state {
            return Err(ConfirmationError::AlreadyConfirmed {
                reference: reference.clone(),
            });
        }
        if attempt.state == AttemptState::InFlight {
            return Err(ConfirmationError::InProgress);
        }
        if attempt.count >= Self::MAX_ATTEMPTS {
            return Err(ConfirmationError::AttemptsExhausted {
                reference: session_reference(session_id),
            });
        }

        attempt.state = AttemptState::InFlight;
        attempt.count += 1;
        Ok(())
    }

    /// Record a successful confirmation. Ignored unless `session_id` is in flight.
    pub fn succeed(&mut self, session_id: &str, reference: &str) {
        if let Some(attempt) = self.in_flight(session_id) {
            attempt.state = AttemptState::Confirmed {
                reference: reference.to_owned(),
            };
        }
    }

    /// Record a failed attempt. Ignored unless `session_id` is in flight.
    pub fn fail(&mut self, session_id: &str) {
        if let Some(attempt) = self.in_flight(session_id) {
            attempt.state = AttemptState::Failed;
        }
    }

    /// Whether `session_id` has been confirmed.
    #[must_use]
    pub fn is_confirmed(&self, session_id: &str) -> bool {
        self.attempts
            .get(session_id)
            .is_some_and(|a| matches!(a.state, AttemptState::Confirmed { .. }))
    }

    /// Attempts left for `session_id`.
    #[must_use]
    pub fn attempts_left(&self, session_id: &str) -> u8 {
        self.attempts.get(session_id).map_or(Self::MAX_ATTEMPTS, |a| {
            match a.state {
                AttemptState::Failed => Self::MAX_ATTEMPTS.saturating_sub(a.count),
                _ => 0,
            }
        })
    }

    fn in_flight(&mut self, session_id: &str) -> Option<&mut Attempt> {
        self.attempts
            .get_mut(session_id)
            .filter(|a| a.state == AttemptState::InFlight)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SESSION: &str = "cs_test_a1b2c3d4e5f6g7h8";

    #[test]
    fn test_payment_return_flags() {
        assert_eq!(PaymentReturn::from_flags(Some(true), None), PaymentReturn::Success);
        assert_eq!(
            PaymentReturn::from_flags(Some(false), None),
            PaymentReturn::Cancelled
        );
        assert_eq!(
            PaymentReturn::from_flags(Some(true), Some(true)),
            PaymentReturn::Cancelled
        );
        assert_eq!(PaymentReturn::from_flags(None, None), PaymentReturn::Cancelled);
    }

    #[test]
    fn test_confirms_once() {
        let mut tracker = ConfirmationTracker::default();
        tracker.begin(SESSION).unwrap();
        assert_eq!(tracker.begin(SESSION), Err(ConfirmationError::InProgress));

        tracker.succeed(SESSION, "LT-1001");
        assert!(tracker.is_confirmed(SESSION));
        assert_eq!(
            tracker.begin(SESSION),
            Err(ConfirmationError::AlreadyConfirmed {
                reference: "LT-1001".to_owned()
            })
        );
    }

    #[test]
    fn test_failure_allows_one_retry() {
        let mut tracker = ConfirmationTracker::default();
        tracker.begin(SESSION).unwrap();
        tracker.fail(SESSION);
        assert_eq!(tracker.attempts_left(SESSION), 1);

        tracker.begin(SESSION).unwrap();
        tracker.fail(SESSION);
        assert_eq!(
            tracker.begin(SESSION),
            Err(ConfirmationError::AttemptsExhausted {
                reference: "E5F6G7H8".to_owned()
            })
        );
    }

    #[test]
    fn test_outcome_for_other_session_is_ignored() {
        let mut tracker = ConfirmationTracker::default();
        tracker.begin(SESSION).unwrap();
        tracker.succeed("cs_test_other", "LT-9");
        assert!(!tracker.is_confirmed(SESSION));
        assert!(!tracker.is_confirmed("cs_test_other"));
    }

    #[test]
    fn test_blank_session_id() {
        let mut tracker = ConfirmationTracker::default();
        assert_eq!(tracker.begin("  "), Err(ConfirmationError::MissingSessionId));
    }

    #[test]
    fn test_tracker_survives_serialization() {
        let mut tracker = ConfirmationTracker::default();
        tracker.begin(SESSION).unwrap();
        tracker.succeed(SESSION, "LT-1001");

        let json = serde_json::to_value(&tracker).unwrap();
        let restored: ConfirmationTracker = serde_json::from_value(json).unwrap();
        assert!(restored.is_confirmed(SESSION));
    }

    #[test]
    fn test_session_reference() {
        assert_eq!(session_reference(SESSION), "E5F6G7H8");
        assert_eq!(session_reference("abc"), "ABC");
    }

    #[test]
    fn test_reconcile() {
        let order: ConfirmedOrder = serde_json::from_value(serde_json::json!({
            "orderNumber": "LT-1001",
            "session_id": SESSION,
            "payment_status": "paid",
            "total": "12.98",
        }))
        .unwrap();
        assert_eq!(reconcile(SESSION, &order), Ok(()));
        assert_eq!(order.reference(SESSION), "LT-1001");

        assert!(matches!(
            reconcile("cs_test_other", &order),
            Err(ConfirmationError::Reconciliation(_))
        ));

        let unpaid = ConfirmedOrder {
            payment_status: Some("unpaid".to_owned()),
            ..order
        };
        assert!(matches!(
            reconcile(SESSION, &unpaid),
            Err(ConfirmationError::Reconciliation(_))
        ));
    }

    #[test]
    fn test_reference_falls_back_to_session() {
        let order = ConfirmedOrder {
            order_number: None,
            session_id: None,
            status: None,
            payment_status: None,
            total: None,
        };
        assert_eq!(order.reference(SESSION), "E5F6G7H8");
    }
}
