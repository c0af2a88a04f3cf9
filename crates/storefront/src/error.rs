//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Responses carry a JSON body of the form `{ "error": "..." }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use llama_treats_core::specials::{FreeItemError, PromoCodeError};
use llama_treats_core::{CartError, CheckoutError, ConfirmationError};
use thiserror::Error;

use crate::bakery::ApiError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout could not be assembled.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Promo code could not be redeemed.
    #[error("Promo code error: {0}")]
    PromoCode(#[from] PromoCodeError),

    /// Free item selection rejected.
    #[error("Free item error: {0}")]
    FreeItems(#[from] FreeItemError),

    /// Order confirmation failed or was refused.
    #[error("Confirmation error: {0}")]
    Confirmation(#[from] ConfirmationError),

    /// Bakery API operation failed.
    #[error("Bakery API error: {0}")]
    Api(#[from] ApiError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(CartError::CorruptSnapshot(_)) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Cart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(err) => match err {
                CheckoutError::PromoCode(err) => promo_code_status(err),
                CheckoutError::SpecialNotSatisfied { .. } => StatusCode::CONFLICT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::PromoCode(err) => promo_code_status(err),
            Self::FreeItems(FreeItemError::NotAvailable(_)) => StatusCode::CONFLICT,
            Self::FreeItems(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Confirmation(err) => match err {
                ConfirmationError::MissingSessionId => StatusCode::BAD_REQUEST,
                ConfirmationError::Reconciliation(_) => StatusCode::BAD_GATEWAY,
                ConfirmationError::AttemptsExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::CONFLICT,
            },
            Self::Api(err) if err.is_rejection() => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Api(ApiError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message safe to show the buyer.
    fn public_message(&self) -> String {
        match self {
            Self::Cart(CartError::CorruptSnapshot(_)) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Cart(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::PromoCode(err) => err.to_string(),
            Self::FreeItems(err) => err.to_string(),
            Self::Confirmation(ConfirmationError::Reconciliation(_)) => {
                "We could not confirm your order. Please contact us.".to_string()
            }
            Self::Confirmation(err) => err.to_string(),
            Self::Api(ApiError::Api { message, .. }) if self.is_api_rejection() => message.clone(),
            Self::Api(ApiError::Timeout) => {
                "The bakery is not responding. Please try again.".to_string()
            }
            Self::Api(_) => "External service error".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    const fn is_api_rejection(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_rejection())
    }

    /// Whether this error means something broke on our side or upstream.
    const fn is_server_fault(&self) -> bool {
        match self {
            Self::Cart(CartError::CorruptSnapshot(_))
            | Self::Session(_)
            | Self::Internal(_)
            | Self::Confirmation(ConfirmationError::Reconciliation(_)) => true,
            Self::Api(_) => !self.is_api_rejection(),
            _ => false,
        }
    }
}

const fn promo_code_status(err: &PromoCodeError) -> StatusCode {
    match err {
        PromoCodeError::Empty => StatusCode::BAD_REQUEST,
        PromoCodeError::Invalid => StatusCode::NOT_FOUND,
        PromoCodeError::Exhausted { .. } => StatusCode::GONE,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        // Don't expose internal error details to clients
        let body = Json(serde_json::json!({ "error": self.public_message() }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
