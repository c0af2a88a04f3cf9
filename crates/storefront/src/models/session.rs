//! Session keys for per-visitor state.
//!
//! The storefront keeps no database. Everything a visitor builds up between
//! requests lives in their session under these keys.

/// Session keys for storefront state.
pub mod keys {
    /// JSON cart snapshot (`CartSnapshot`).
    pub const CART: &str = "cart";

    /// In-progress free item picks (`FreeItemSelection`).
    pub const FREE_ITEMS: &str = "free_items";

    /// Promo code the visitor validated, applied at checkout.
    pub const PROMO_CODE: &str = "promo_code";

    /// Order confirmation attempts (`ConfirmationTracker`).
    pub const CONFIRMATIONS: &str = "confirmations";

    /// JSON list of saved products (`Favorites`).
    pub const FAVORITES: &str = "favorites";

    /// IDs of banners the visitor dismissed.
    pub const DISMISSED_BANNERS: &str = "dismissed_banners";
}
