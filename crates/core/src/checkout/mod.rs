//! Checkout: from a cart and a form to an order session, and back again
//! after payment.

pub mod confirmation;
pub mod error;
pub mod form;
pub mod session;

pub use confirmation::{
    ConfirmationError, ConfirmationTracker, ConfirmedOrder, PaymentReturn, reconcile,
    session_reference,
};
pub use error::CheckoutError;
pub use form::{BuyerInfo, CheckoutForm, DeliveryAddress, Fulfillment, pickup_time_slots};
pub use session::{CheckoutAssembler, CheckoutSession};
