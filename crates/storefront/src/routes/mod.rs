//! HTTP route handlers for the storefront.
//!
//! Everything is JSON. Per-visitor state (cart, favorites, free item picks,
//! promo code, confirmation attempts, dismissed banners) lives in the
//! session. Requests on one session are handled one at a time.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//!
//! # Cart
//! GET  /api/cart                        - Cart view with totals and special progress
//! POST /api/cart/add                    - {product_id, quantity?}
//! POST /api/cart/update                 - {product_id, quantity}; 0 removes
//! POST /api/cart/remove                 - {product_id}
//! POST /api/cart/increment              - {product_id}
//! POST /api/cart/decrement              - {product_id}; at 1 removes
//! POST /api/cart/clear
//! GET  /api/cart/count                  - Header badge
//!
//! # Catalog
//! GET  /api/products                    - ?featured=true&category=&q=&sort=
//! GET  /api/products/{id or slug}       - Product, its category and related products
//! GET  /api/categories
//! GET  /api/promotions                  - ?location=homepage_hero
//! GET  /api/banners                     - Live banners the visitor has not closed
//! POST /api/banners/{id}/dismiss
//! GET  /api/settings
//!
//! # Favorites
//! GET  /api/favorites                   - Saved products still for sale
//! GET  /api/favorites/{product_id}      - {favorite, count}
//! POST /api/favorites/add               - {product_id}
//! POST /api/favorites/remove            - {product_id}
//! POST /api/favorites/toggle            - {product_id}; returns {favorite, count}
//! POST /api/favorites/clear
//!
//! # Specials
//! GET  /api/specials                    - Live specials with eligibility
//! GET  /api/specials/{id}
//! POST /api/specials/validate-code      - {code}; remembered for checkout
//! GET  /api/specials/{id}/free-items
//! POST /api/specials/{id}/free-items    - {action: add|remove|forfeit, product_id?}
//!
//! # Checkout (rate limited)
//! GET  /api/checkout/pickup-slots
//! POST /api/checkout                    - Opens a payment session, returns {url}
//! POST /api/checkout/confirm            - {session_id, success?, canceled?}
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod specials;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the catalog routes router, mounted at `/api`.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{key}", get(catalog::product))
        .route("/categories", get(catalog::categories))
        .route("/promotions", get(catalog::promotions))
        .route("/banners", get(catalog::banners))
        .route("/banners/{id}/dismiss", post(catalog::dismiss_banner))
        .route("/settings", get(catalog::settings))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::show))
        .route("/add", post(favorites::add))
        .route("/remove", post(favorites::remove))
        .route("/toggle", post(favorites::toggle))
        .route("/clear", post(favorites::clear))
        .route("/{product_id}", get(favorites::status))
}

/// Create the specials routes router.
pub fn special_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(specials::index))
        .route("/validate-code", post(specials::validate_code))
        .route("/{id}", get(specials::show))
        .route(
            "/{id}/free-items",
            get(specials::free_items).post(specials::update_free_items),
        )
}

/// Create the checkout routes router.
///
/// Returned bare so the caller decides whether to rate limit it.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::submit))
        .route("/confirm", post(checkout::confirm))
        .route("/pickup-slots", get(checkout::pickup_slots))
}
