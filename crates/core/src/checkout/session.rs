//! Checkout session assembly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine, CartTotals};
use crate::checkout::error::CheckoutError;
use crate::checkout::form::{BuyerInfo, CheckoutForm, Fulfillment};
use crate::specials::{
    FreeItem, FreeItemError, FreeItemSelection, Special, SpecialEvaluator, best_auto_special,
    estimate_savings, redeem,
};
use crate::types::{FulfillmentType, SpecialId};

/// Everything the order API needs to open a payment session.
///
/// Built once and never touched again: it owns copies of the cart lines, so
/// later cart edits cannot leak into an order already being paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub lines: Vec<CartLine>,
    pub buyer: BuyerInfo,
    pub fulfillment: Fulfillment,
    /// Promo code the buyer entered, as stored on the special.
    pub special_code: Option<String>,
    /// The one special applied to this order, by code or automatically.
    pub special_id: Option<SpecialId>,
    pub free_items: Vec<FreeItem>,
    pub totals: CartTotals,
    /// Preview of the discount; the order API computes the real one.
    pub estimated_savings: Decimal,
}

impl CheckoutSession {
    /// Cart total (subtotal plus tax) at the moment the session was built.
    #[must_use]
    pub const fn computed_total(&self) -> Decimal {
        self.totals.total
    }

    #[must_use]
    pub const fn fulfillment_type(&self) -> FulfillmentType {
        self.fulfillment.fulfillment_type()
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Builds [`CheckoutSession`]s from the cart, the form and the specials catalog.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutAssembler<'a> {
    evaluator: SpecialEvaluator<'a>,
    specials: &'a [Special],
}

impl<'a> CheckoutAssembler<'a> {
    #[must_use]
    pub const fn new(evaluator: SpecialEvaluator<'a>, specials: &'a [Special]) -> Self {
        Self {
            evaluator,
            specials,
        }
    }

    /// Validate everything and snapshot the order.
    ///
    /// With a promo code, that code's special is the one applied and it must
    /// be satisfied. Without one, the best code-less special is applied if
    /// any saves money; buy-X-get-Y offers only qualify once the buyer has
    /// started picking free items for them.
    ///
    /// # Errors
    ///
    /// `EmptyCart` comes first, before the form is even looked at. Then form
    /// errors, promo code errors, `SpecialNotSatisfied`, and free-item errors
    /// for an incomplete or mismatched selection.
    pub fn build_session(
        &self,
        cart: &Cart,
        form: &CheckoutForm,
        promo_code: Option<&str>,
        selection: Option<&FreeItemSelection>,
    ) -> Result<CheckoutSession, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let (buyer, fulfillment) = form.validate(self.evaluator.now().date_naive())?;

        let promo_code = promo_code.map(str::trim).filter(|c| !c.is_empty());
        let applied = match promo_code {
            Some(code) => {
                let special = redeem(self.specials, code, self.evaluator.now())?;
                let satisfied = self
                    .evaluator
                    .evaluate(special, cart)
                    .is_some_and(|r| r.satisfied);
                if !satisfied {
                    return Err(CheckoutError::SpecialNotSatisfied {
                        special_id: special.id,
                    });
                }
                Some(special)
            }
            None => {
                let candidates = self.specials.iter().filter(|s| {
                    s.buy_x_get_y().is_none()
                        || selection.is_some_and(|sel| sel.special_id() == s.id)
                });
                best_auto_special(&self.evaluator, candidates, cart, selection).map(|(s, _)| s)
            }
        };

        let free_items = match applied {
            Some(special) if special.buy_x_get_y().is_some() => {
                self.finalize_free_items(special, cart, selection)?
            }
            _ => Vec::new(),
        };

        Ok(CheckoutSession {
            lines: cart.lines().to_vec(),
            buyer,
            fulfillment,
            special_code: applied.and_then(|s| s.code.clone()),
            special_id: applied.map(|s| s.id),
            free_items,
            totals: cart.totals(),
            estimated_savings: applied.map_or(Decimal::ZERO, |s| {
                estimate_savings(&self.evaluator, s, cart, selection)
            }),
        })
    }

    /// Re-check the buyer's picks against the current cart and finalize them.
    fn finalize_free_items(
        &self,
        special: &Special,
        cart: &Cart,
        selection: Option<&FreeItemSelection>,
    ) -> Result<Vec<FreeItem>, CheckoutError> {
        let result = self
            .evaluator
            .evaluate(special, cart)
            .ok_or(FreeItemError::NotAvailable(special.id))?;

        let fresh = match selection {
            Some(selection) if selection.special_id() != special.id => {
                return Err(FreeItemError::WrongSpecial {
                    selected: selection.special_id(),
                    expected: special.id,
                }
                .into());
            }
            Some(selection) => selection
                .refreshed(&result)
                .ok_or(FreeItemError::NotAvailable(special.id))?,
            None => FreeItemSelection::for_result(&result)?,
        };
        Ok(fresh.finalize()?)
    }
}
