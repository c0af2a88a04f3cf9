//! Specials: discount rules and their evaluation against a cart.
//!
//! - [`special`] - Canonical [`Special`] shape, parsed once at the API boundary
//! - [`scope`] - Resolving which products qualify for a special
//! - [`eligibility`] - Per-special progress and satisfaction
//! - [`promo_code`] - Code redemption with usage limits
//! - [`free_items`] - The buyer's picks for a buy-X-get-Y reward
//! - [`savings`] - Estimated benefit of a satisfied special
//! - [`policy`] - Choosing which special a checkout carries
//!
//! Everything here is pure. Evaluation takes the catalog, the cart and `now`
//! and recomputes from scratch; nothing is cached between calls.

pub mod eligibility;
pub mod free_items;
pub mod policy;
pub mod promo_code;
pub mod savings;
pub mod scope;
pub mod special;

pub use eligibility::{EligibilityResult, SpecialEvaluator};
pub use free_items::{FreeItem, FreeItemError, FreeItemSelection};
pub use policy::best_auto_special;
pub use promo_code::{PromoCodeError, redeem};
pub use savings::estimate_savings;
pub use scope::ResolvedScope;
pub use special::{
    BuyXGetY, PromoScopes, RawSpecial, Scope, Special, SpecialError, SpecialKind, SpecialType,
};
