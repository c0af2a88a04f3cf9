//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Catalog loading with per-list fallback to empty
//! - `cart_store` - Cart persistence in the visitor's session
//! - `session_state` - Promo code, free item picks, confirmations and
//!   dismissed banners kept in the session
//! - `favorites` - Saved products in the visitor's session
//! - `free_items` - Choosing free items for a satisfied buy-X-get-Y special
//! - `promo_codes` - Promo code redemption checked live with the bakery API
//! - `checkout` - Submitting a checkout and confirming the paid order

pub mod cart_store;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod free_items;
pub mod promo_codes;
pub mod session_state;
