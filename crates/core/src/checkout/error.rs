//! Checkout errors.

use chrono::NaiveDate;

use crate::specials::{FreeItemError, PromoCodeError};
use crate::types::{EmailError, SpecialId};

/// Errors that stop a checkout session from being built.
///
/// All of these are the buyer's to fix, so messages are written for them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    /// Required contact or fulfillment fields were left blank.
    #[error("please fill in: {}", .fields.join(", "))]
    MissingFulfillmentDetails { fields: Vec<&'static str> },

    #[error("{0}")]
    InvalidEmail(#[from] EmailError),

    #[error("pickup date must be {earliest} or later")]
    InvalidPickupDate { earliest: NaiveDate },

    #[error("{0} is not an available pickup time")]
    InvalidPickupTime(String),

    #[error(transparent)]
    PromoCode(#[from] PromoCodeError),

    /// The promo code matched, but the cart does not meet its terms yet.
    #[error("your cart does not qualify for special {special_id} yet")]
    SpecialNotSatisfied { special_id: SpecialId },

    #[error(transparent)]
    FreeItems(#[from] FreeItemError),
}
