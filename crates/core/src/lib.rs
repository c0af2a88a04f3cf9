//! Llama Treats Core - cart, specials and checkout engine.
//!
//! This crate holds everything the storefront needs to price a cart and
//! decide which specials apply to it:
//! - `storefront` - JSON service that persists carts in the session and talks
//!   to the bakery REST API
//! - `cli` - Operator tooling for previewing specials against a cart fixture
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. Callers pass `now` explicitly, so the same inputs always
//! produce the same eligibility and totals.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money helpers, email, date windows and enums
//! - [`catalog`] - Products, categories, promotions, banners and settings
//! - [`cart`] - The cart store: line items, mutations and derived totals
//! - [`favorites`] - Products the visitor saved for later
//! - [`specials`] - Special parsing, scope resolution, eligibility, promo codes,
//!   free-item selection and savings estimates
//! - [`checkout`] - Checkout session assembly and order confirmation tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod specials;
pub mod types;

pub use cart::{Cart, CartError, CartLine, CartSnapshot, CartTotals};
pub use catalog::{Banner, Catalog, Category, Product, ProductSort, Promotion, Settings};
pub use checkout::{
    BuyerInfo, CheckoutAssembler, CheckoutError, CheckoutForm, CheckoutSession,
    ConfirmationError, ConfirmationTracker, ConfirmedOrder, Fulfillment,
};
pub use favorites::Favorites;
pub use specials::{EligibilityResult, Special, SpecialEvaluator};
pub use types::*;
