//! Core types for Llama Treats.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod window;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{TaxRate, TaxRateError, format_price, round_cents};
pub use status::*;
pub use window::DateWindow;
