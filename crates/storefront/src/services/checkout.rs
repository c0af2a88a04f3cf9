//! Checkout submission and order confirmation.
//!
//! Submitting validates the cart and form, picks the one special the order
//! carries, and asks the bakery API for a payment session. The cart is left
//! alone until the buyer returns from a successful payment and the order API
//! confirms a matching, paid order.

use llama_treats_core::checkout::PaymentReturn;
use llama_treats_core::{
    Cart, CheckoutAssembler, CheckoutError, CheckoutForm, ConfirmationError, ConfirmedOrder,
    CustomerId, SpecialEvaluator, SpecialId, checkout::reconcile, round_cents,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::bakery::conversions::create_session_request;
use crate::bakery::types::ConfirmOrderRequest;
use crate::error::{AppError, add_breadcrumb};
use crate::services::{cart_store, catalog, promo_codes, session_state};
use crate::state::AppState;

/// Body of `POST /api/checkout`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub form: CheckoutForm,
    /// Overrides the code stored by `validate-code`. An empty string means
    /// "no code".
    #[serde(default, alias = "promoCode")]
    pub promo_code: Option<String>,
}

/// A payment session the buyer should be sent to.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutStarted {
    pub url: String,
    pub special_id: Option<SpecialId>,
    pub estimated_savings: Decimal,
    pub total: Decimal,
}

/// Body of `POST /api/checkout/confirm`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "cancelled")]
    pub canceled: Option<bool>,
    #[serde(default, alias = "customerId")]
    pub customer_id: Option<CustomerId>,
}

/// How a payment return was handled.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    Confirmed {
        reference: String,
        /// `None` when this session was already confirmed earlier.
        order: Option<ConfirmedOrder>,
    },
    /// The buyer backed out of payment. Their cart is untouched.
    Cancelled,
}

/// Build the checkout and open a payment session for it.
///
/// # Errors
///
/// Returns `CheckoutError` variants for an empty cart, a bad form, or a
/// special that cannot be applied, `PromoCodeError` variants when the bakery
/// API refuses the promo code, and `AppError::Api` if the bakery API refuses
/// or fails to open the session.
#[instrument(skip_all)]
pub async fn submit(
    state: &AppState,
    session: &Session,
    request: &CheckoutRequest,
) -> Result<CheckoutStarted, AppError> {
    let cart = cart_store::load_cart(session, state.tax_rate()).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let catalog = catalog::load_catalog(state.api()).await;
    let selection = session_state::load_selection(session).await?;
    let promo_code = match &request.promo_code {
        Some(code) => Some(code.clone()),
        None => session_state::load_promo_code(session).await?,
    };

    let now = state.now();
    if let Some(code) = promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
        promo_codes::redeem(state.api(), &catalog.specials, code, now).await?;
    }

    let evaluator = SpecialEvaluator::new(&catalog.products, now);
    let assembler = CheckoutAssembler::new(evaluator, &catalog.specials);
    let checkout = assembler.build_session(
        &cart,
        &request.form,
        promo_code.as_deref(),
        selection.as_ref(),
    )?;

    let config = state.config();
    let payload = create_session_request(
        &checkout,
        config.checkout_success_url(),
        config.checkout_cancel_url(),
    );
    let url = state.api().create_checkout_session(&payload).await?;

    tracing::info!(
        items = checkout.item_count(),
        fulfillment = %checkout.fulfillment_type(),
        special_id = ?checkout.special_id,
        "Checkout session created"
    );
    add_breadcrumb("checkout", "Checkout session created", None);

    Ok(CheckoutStarted {
        url,
        special_id: checkout.special_id,
        estimated_savings: round_cents(checkout.estimated_savings),
        total: checkout.totals.rounded().total,
    })
}

/// Handle the buyer's return from the payment page.
///
/// A cancelled return changes nothing. A successful one is confirmed with
/// the order API at most once per payment session; the cart, free item picks
/// and promo code are cleared only after the returned order reconciles.
///
/// # Errors
///
/// Returns `ConfirmationError` variants for a missing session id, a
/// confirmation already in flight, exhausted retries, or an order that does
/// not reconcile, and `AppError::Api` if the order API fails.
#[instrument(skip_all, fields(session_id = request.session_id.as_deref().unwrap_or_default()))]
pub async fn confirm(
    state: &AppState,
    session: &Session,
    request: &ConfirmRequest,
) -> Result<ConfirmationOutcome, AppError> {
    if PaymentReturn::from_flags(request.success, request.canceled) == PaymentReturn::Cancelled {
        tracing::info!("Payment cancelled, keeping cart");
        return Ok(ConfirmationOutcome::Cancelled);
    }

    let session_id = request.session_id.as_deref().unwrap_or_default().trim();
    let mut tracker = session_state::load_tracker(session).await?;
    match tracker.begin(session_id) {
        Ok(()) => {}
        Err(ConfirmationError::AlreadyConfirmed { reference }) => {
            return Ok(ConfirmationOutcome::Confirmed {
                reference,
                order: None,
            });
        }
        Err(e) => return Err(e.into()),
    }
    // Held until the outcome is recorded, across all sessions.
    let Some(_claim) = state.claim_confirmation(session_id) else {
        tracing::info!("Payment session already being confirmed");
        return Err(ConfirmationError::InProgress.into());
    };
    session_state::save_tracker(session, &tracker).await?;

    let confirmed = state
        .api()
        .confirm_order(&ConfirmOrderRequest {
            session_id: session_id.to_string(),
            customer_id: request.customer_id,
        })
        .await
        .map_err(AppError::from)
        .and_then(|order| {
            reconcile(session_id, &order)?;
            Ok(order)
        });

    // Re-read: the outcome is recorded only against this session id's attempt.
    let mut tracker = session_state::load_tracker(session).await?;
    match confirmed {
        Ok(order) => {
            let reference = order.reference(session_id);
            tracker.succeed(session_id, &reference);
            session_state::save_tracker(session, &tracker).await?;

            cart_store::save_cart(session, &Cart::new(state.tax_rate())).await?;
            session_state::save_selection(session, None).await?;
            session_state::save_promo_code(session, None).await?;

            tracing::info!(reference = %reference, "Order confirmed");
            Ok(ConfirmationOutcome::Confirmed {
                reference,
                order: Some(order),
            })
        }
        Err(e) => {
            tracker.fail(session_id);
            session_state::save_tracker(session, &tracker).await?;
            tracing::warn!(
                error = %e,
                attempts_left = tracker.attempts_left(session_id),
                "Order confirmation failed"
            );
            Err(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use llama_treats_core::specials::PromoCodeError;
    use llama_treats_core::{FulfillmentType, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::bakery::fake::{ConfirmBehavior, FakeBakeryApi, sample_catalog, sample_now};
    use crate::testing::test_config;

    const PAYMENT_SESSION: &str = "cs_test_a1b2c3d4e5f6g7h8";

    fn setup() -> (Arc<FakeBakeryApi>, AppState, Session) {
        let api = Arc::new(FakeBakeryApi::new(sample_catalog()));
        let state = AppState::with_fixed_clock(test_config(), api.clone(), sample_now());
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        (api, state, session)
    }

    async fn fill_cart(state: &AppState, session: &Session, items: &[(i32, i64)]) {
        let catalog = sample_catalog();
        let mut cart = cart_store::load_cart(session, state.tax_rate()).await.unwrap();
        for (id, qty) in items {
            cart.add_item(catalog.product(ProductId::new(*id)).unwrap(), *qty)
                .unwrap();
        }
        cart_store::save_cart(session, &cart).await.unwrap();
    }

    fn pickup() -> CheckoutRequest {
        CheckoutRequest {
            form: CheckoutForm {
                email: "pat@example.com".to_owned(),
                phone: "555-0100".to_owned(),
                order_type: FulfillmentType::Pickup,
                pickup_date: "2024-06-16".to_owned(),
                pickup_time: "9:30 AM".to_owned(),
                ..CheckoutForm::default()
            },
            promo_code: None,
        }
    }

    fn paid_return() -> ConfirmRequest {
        ConfirmRequest {
            session_id: Some(PAYMENT_SESSION.to_owned()),
            success: Some(true),
            ..ConfirmRequest::default()
        }
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let (api, state, session) = setup();
        let err = submit(&state, &session, &pickup()).await.unwrap_err();
        assert!(matches!(err, AppError::Checkout(CheckoutError::EmptyCart)));
        assert!(api.checkout_requests().is_empty());
    }

    #[tokio::test]
    async fn test_submit_sends_cart_and_keeps_it() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(1, 4)]).await;

        let started = submit(&state, &session, &pickup()).await.unwrap();
        assert!(started.url.starts_with("https://pay.example.test/"));
        assert_eq!(started.total, Decimal::new(1298, 2));
        assert_eq!(started.special_id, None);

        let requests = api.checkout_requests();
        let request = requests.first().unwrap();
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items.first().unwrap().quantity, 4);
        assert!(request.success_url.contains("session_id={CHECKOUT_SESSION_ID}"));

        // The cart stays until the order is confirmed.
        let cart = cart_store::load_cart(&session, state.tax_rate()).await.unwrap();
        assert_eq!(cart.item_count(), 4);
    }

    #[tokio::test]
    async fn test_stored_promo_code_is_applied() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(7, 2)]).await;
        session_state::save_promo_code(&session, Some("brunch5"))
            .await
            .unwrap();

        let started = submit(&state, &session, &pickup()).await.unwrap();
        assert_eq!(started.special_id, Some(SpecialId::new(3)));
        assert_eq!(started.estimated_savings, Decimal::from(5));

        let requests = api.checkout_requests();
        let request = requests.first().unwrap();
        assert_eq!(request.special_code.as_deref(), Some("BRUNCH5"));
    }

    #[tokio::test]
    async fn test_explicit_empty_code_overrides_stored_one() {
        let (_, state, session) = setup();
        fill_cart(&state, &session, &[(5, 2)]).await;
        session_state::save_promo_code(&session, Some("BRUNCH5"))
            .await
            .unwrap();

        let request = CheckoutRequest {
            promo_code: Some(String::new()),
            ..pickup()
        };
        let started = submit(&state, &session, &request).await.unwrap();
        // Falls back to the best automatic special: 20% off cake.
        assert_eq!(started.special_id, Some(SpecialId::new(1)));
        assert_eq!(started.estimated_savings, Decimal::new(230, 2));
    }

    #[tokio::test]
    async fn test_code_used_up_since_validation_blocks_checkout() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(7, 2)]).await;
        session_state::save_promo_code(&session, Some("BRUNCH5"))
            .await
            .unwrap();
        api.use_up_code("BRUNCH5");

        let err = submit(&state, &session, &pickup()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::PromoCode(PromoCodeError::Exhausted { .. })
        ));
        assert_eq!(api.code_checks(), vec!["BRUNCH5"]);
        assert!(api.checkout_requests().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_clears_cart_once() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(1, 4)]).await;
        session_state::save_promo_code(&session, Some("BRUNCH5"))
            .await
            .unwrap();

        let outcome = confirm(&state, &session, &paid_return()).await.unwrap();
        let ConfirmationOutcome::Confirmed { reference, order } = outcome else {
            panic!("expected confirmation");
        };
        assert_eq!(reference, "LT-1001");
        assert!(order.is_some());
        assert!(
            cart_store::load_cart(&session, state.tax_rate())
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(session_state::load_promo_code(&session).await.unwrap(), None);

        // A refresh of the confirmation page does not confirm again.
        let replay = confirm(&state, &session, &paid_return()).await.unwrap();
        assert!(matches!(
            replay,
            ConfirmationOutcome::Confirmed { order: None, .. }
        ));
        assert_eq!(api.confirm_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_confirms_reach_api_once() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(1, 4)]).await;
        // Same payment session, returned to in two browser tabs.
        let other_tab = Session::new(None, Arc::new(MemoryStore::default()), None);
        api.set_latency(std::time::Duration::from_millis(30));

        let (return_a, return_b) = (paid_return(), paid_return());
        let (first, second) = tokio::join!(
            confirm(&state, &session, &return_a),
            confirm(&state, &other_tab, &return_b),
        );

        let outcomes = [first, second];
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, Ok(ConfirmationOutcome::Confirmed { order: Some(_), .. })))
                .count(),
            1
        );
        assert!(outcomes.iter().any(|o| matches!(
            o,
            Err(AppError::Confirmation(ConfirmationError::InProgress))
        )));
        assert_eq!(api.confirm_requests().len(), 1);

        // Released once the outcome is recorded.
        assert!(state.claim_confirmation(PAYMENT_SESSION).is_some());
    }

    #[tokio::test]
    async fn test_cancelled_return_keeps_cart() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(1, 4)]).await;

        let request = ConfirmRequest {
            canceled: Some(true),
            ..paid_return()
        };
        let outcome = confirm(&state, &session, &request).await.unwrap();
        assert!(matches!(outcome, ConfirmationOutcome::Cancelled));
        assert_eq!(
            cart_store::load_cart(&session, state.tax_rate())
                .await
                .unwrap()
                .item_count(),
            4
        );
        assert!(api.confirm_requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_confirmation_allows_one_retry() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(1, 4)]).await;
        api.set_confirm_behavior(ConfirmBehavior::Unavailable);

        assert!(matches!(
            confirm(&state, &session, &paid_return()).await,
            Err(AppError::Api(_))
        ));
        assert!(matches!(
            confirm(&state, &session, &paid_return()).await,
            Err(AppError::Api(_))
        ));
        assert!(matches!(
            confirm(&state, &session, &paid_return()).await,
            Err(AppError::Confirmation(
                ConfirmationError::AttemptsExhausted { .. }
            ))
        ));
        assert_eq!(api.confirm_requests().len(), 2);

        // Nothing was cleared.
        assert_eq!(
            cart_store::load_cart(&session, state.tax_rate())
                .await
                .unwrap()
                .item_count(),
            4
        );
    }

    #[tokio::test]
    async fn test_mismatched_order_is_not_accepted() {
        let (api, state, session) = setup();
        fill_cart(&state, &session, &[(1, 4)]).await;
        api.set_confirm_behavior(ConfirmBehavior::Order(ConfirmedOrder {
            order_number: Some("LT-9999".to_owned()),
            session_id: Some("cs_test_someone_else".to_owned()),
            status: None,
            payment_status: Some("paid".to_owned()),
            total: None,
        }));

        assert!(matches!(
            confirm(&state, &session, &paid_return()).await,
            Err(AppError::Confirmation(ConfirmationError::Reconciliation(_)))
        ));
        assert!(
            !cart_store::load_cart(&session, state.tax_rate())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_missing_session_id() {
        let (_, state, session) = setup();
        let request = ConfirmRequest {
            session_id: None,
            ..paid_return()
        };
        assert!(matches!(
            confirm(&state, &session, &request).await,
            Err(AppError::Confirmation(ConfirmationError::MissingSessionId))
        ));
    }
}
