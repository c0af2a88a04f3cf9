//! Checkout route handlers.

use axum::{Json, extract::State};
use chrono::{Days, NaiveDate};
use llama_treats_core::checkout::pickup_time_slots;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::services::checkout::{
    self as checkout_service, CheckoutRequest, CheckoutStarted, ConfirmRequest,
    ConfirmationOutcome,
};
use crate::state::AppState;

/// POST /api/checkout
///
/// Answers with the payment page URL. The cart is kept until the order is
/// confirmed.
///
/// # Errors
///
/// See [`checkout_service::submit`].
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutStarted>, AppError> {
    checkout_service::submit(&state, &session, &request)
        .await
        .map(Json)
}

/// POST /api/checkout/confirm
///
/// # Errors
///
/// See [`checkout_service::confirm`].
#[instrument(skip_all)]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<ConfirmationOutcome>, AppError> {
    checkout_service::confirm(&state, &session, &request)
        .await
        .map(Json)
}

#[derive(Debug, Serialize)]
pub struct PickupSlots {
    pub slots: Vec<String>,
    /// Orders cannot be picked up the day they are placed.
    pub earliest_date: Option<NaiveDate>,
}

/// GET /api/checkout/pickup-slots
pub async fn pickup_slots(State(state): State<AppState>) -> Json<PickupSlots> {
    Json(PickupSlots {
        slots: pickup_time_slots(),
        earliest_date: state.now().date_naive().checked_add_days(Days::new(1)),
    })
}
