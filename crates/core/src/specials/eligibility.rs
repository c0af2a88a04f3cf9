//! Eligibility and progress for each special.
//!
//! [`SpecialEvaluator`] is rebuilt for every evaluation from the latest
//! product list and clock reading. It holds no state, so results can never go
//! stale relative to the cart they were computed from.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::Cart;
use crate::catalog::Product;
use crate::specials::scope::ResolvedScope;
use crate::specials::special::{PromoScopes, Special, SpecialKind};
use crate::types::{ProductId, SpecialId, format_price};

/// How far the cart is from satisfying one special.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityResult {
    pub special_id: SpecialId,
    pub satisfied: bool,
    /// Units in the cart that count toward the special.
    pub qualifying_cart_count: u64,
    /// Units needed (buy quantity); zero for specials without a unit threshold.
    pub required: u64,
    /// Units still missing, never negative.
    pub remaining: u64,
    /// Free-item pool for buy-X-get-Y specials, empty otherwise.
    pub eligible_free_product_ids: Vec<ProductId>,
    /// Number of free units the buyer may pick once satisfied.
    pub get_quantity: Option<u32>,
    /// Subtotal of qualifying lines.
    pub qualifying_subtotal: Decimal,
    /// Spend still needed to reach the minimum purchase.
    pub amount_remaining: Decimal,
}

impl EligibilityResult {
    /// Progress line for the special's page.
    ///
    /// Buy-X-get-Y offers always have one; other specials only while a
    /// minimum purchase is still unmet.
    #[must_use]
    pub fn progress_message(&self) -> Option<String> {
        if let Some(get_quantity) = self.get_quantity {
            return Some(if self.remaining > 0 {
                format!("Add {} more item(s) to qualify!", self.remaining)
            } else {
                format!("You qualify for {get_quantity} FREE item(s)!")
            });
        }
        (self.amount_remaining > Decimal::ZERO).then(|| {
            format!(
                "Spend {} more on qualifying items to qualify!",
                format_price(self.amount_remaining)
            )
        })
    }
}

/// Evaluates specials against a cart.
#[derive(Debug, Clone, Copy)]
pub struct SpecialEvaluator<'a> {
    products: &'a [Product],
    now: DateTime<Utc>,
}

impl<'a> SpecialEvaluator<'a> {
    #[must_use]
    pub const fn new(products: &'a [Product], now: DateTime<Utc>) -> Self {
        Self { products, now }
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    #[must_use]
    pub const fn products(&self) -> &'a [Product] {
        self.products
    }

    /// Products whose cart units count toward the special.
    ///
    /// For two-part offers this is the buy side only.
    #[must_use]
    pub fn qualifying_scope(&self, special: &Special) -> ResolvedScope {
        match &special.kind {
            SpecialKind::BuyXGetY(terms) => match &terms.scopes {
                PromoScopes::TwoPart { buy, .. } => ResolvedScope::resolve(buy, self.products),
                PromoScopes::SingleScope => ResolvedScope::resolve(&special.scope, self.products),
            },
            _ => ResolvedScope::resolve(&special.scope, self.products),
        }
    }

    /// Products the buyer may pick for free; `None` unless buy-X-get-Y.
    #[must_use]
    pub fn free_pool(&self, special: &Special) -> Option<ResolvedScope> {
        let terms = special.buy_x_get_y()?;
        Some(match &terms.scopes {
            PromoScopes::TwoPart { get, .. } => ResolvedScope::resolve(get, self.products),
            PromoScopes::SingleScope => ResolvedScope::resolve(&special.scope, self.products),
        })
    }

    /// Evaluate one special. Returns `None` if it is switched off or outside
    /// its date window, whatever the cart holds.
    #[must_use]
    pub fn evaluate(&self, special: &Special, cart: &Cart) -> Option<EligibilityResult> {
        if !special.is_live(self.now) {
            return None;
        }

        let scope = self.qualifying_scope(special);
        let qualifying_cart_count = scope.cart_quantity(cart);
        let qualifying_subtotal = scope.cart_subtotal(cart);

        let result = if let Some(terms) = special.buy_x_get_y() {
            let required = u64::from(terms.buy_quantity);
            let remaining = required.saturating_sub(qualifying_cart_count);
            let pool = self.free_pool(special).unwrap_or_default();
            EligibilityResult {
                special_id: special.id,
                satisfied: remaining == 0,
                qualifying_cart_count,
                required,
                remaining,
                eligible_free_product_ids: pool.product_ids().to_vec(),
                get_quantity: Some(terms.get_quantity),
                qualifying_subtotal,
                amount_remaining: Decimal::ZERO,
            }
        } else {
            let amount_remaining = special
                .min_purchase
                .map_or(Decimal::ZERO, |min| (min - qualifying_subtotal).max(Decimal::ZERO));
            EligibilityResult {
                special_id: special.id,
                satisfied: amount_remaining.is_zero(),
                qualifying_cart_count,
                required: 0,
                remaining: 0,
                eligible_free_product_ids: Vec::new(),
                get_quantity: None,
                qualifying_subtotal,
                amount_remaining,
            }
        };
        Some(result)
    }

    /// Evaluate every live special, keeping catalog order.
    #[must_use]
    pub fn evaluate_all<'s>(
        &self,
        specials: &'s [Special],
        cart: &Cart,
    ) -> Vec<(&'s Special, EligibilityResult)> {
        specials
            .iter()
            .filter_map(|s| self.evaluate(s, cart).map(|r| (s, r)))
            .collect()
    }
}
