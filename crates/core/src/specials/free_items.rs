//! Free-item selection for buy-X-get-Y rewards.
//!
//! Once a buy-X-get-Y special is satisfied the buyer picks exactly
//! `get_quantity` units from the free pool, spread across products however
//! they like. Partial picks are fine while browsing; checkout requires a
//! complete selection or an explicit forfeit of whatever is left.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::specials::eligibility::EligibilityResult;
use crate::types::{ProductId, SpecialId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FreeItemError {
    /// The special is not a buy-X-get-Y offer, or the cart does not satisfy it yet.
    #[error("special {0} has no free items available")]
    NotAvailable(SpecialId),
    #[error("product {0} is not one of the free item choices")]
    NotInPool(ProductId),
    #[error("you have already chosen all {quantity} free item(s)")]
    QuotaReached { quantity: u32 },
    #[error("choose {remaining} more free item(s) or skip them")]
    Incomplete { remaining: u32 },
    /// The selection was made for a different special.
    #[error("free items were chosen for special {selected}, not {expected}")]
    WrongSpecial { selected: SpecialId, expected: SpecialId },
}

/// One free product and how many units of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The buyer's in-progress picks for one special.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeItemSelection {
    special_id: SpecialId,
    get_quantity: u32,
    pool: Vec<ProductId>,
    picks: BTreeMap<ProductId, u32>,
    #[serde(default)]
    forfeited: bool,
}

impl FreeItemSelection {
    /// Start a selection for a satisfied buy-X-get-Y result.
    ///
    /// # Errors
    ///
    /// Returns `FreeItemError::NotAvailable` if the result is unsatisfied or
    /// carries no free quantity.
    pub fn for_result(result: &EligibilityResult) -> Result<Self, FreeItemError> {
        match result.get_quantity {
            Some(get_quantity) if result.satisfied => Ok(Self {
                special_id: result.special_id,
                get_quantity,
                pool: result.eligible_free_product_ids.clone(),
                picks: BTreeMap::new(),
                forfeited: false,
            }),
            _ => Err(FreeItemError::NotAvailable(result.special_id)),
        }
    }

    /// Carry existing picks over to a fresh evaluation.
    ///
    /// Picks for products no longer in the pool are dropped, and picks are
    /// trimmed from the highest product ID down if the quota shrank.
    #[must_use]
    pub fn refreshed(&self, result: &EligibilityResult) -> Option<Self> {
        if result.special_id != self.special_id {
            return None;
        }
        let mut fresh = Self::for_result(result).ok()?;
        for (product_id, quantity) in &self.picks {
            for _ in 0..*quantity {
                if fresh.increment(*product_id).is_err() {
                    break;
                }
            }
        }
        fresh.forfeited = self.forfeited;
        Some(fresh)
    }

    #[must_use]
    pub const fn special_id(&self) -> SpecialId {
        self.special_id
    }

    #[must_use]
    pub const fn get_quantity(&self) -> u32 {
        self.get_quantity
    }

    #[must_use]
    pub fn pool(&self) -> &[ProductId] {
        &self.pool
    }

    /// Pick one more unit of `product_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is outside the pool or the quota is full.
    pub fn increment(&mut self, product_id: ProductId) -> Result<(), FreeItemError> {
        if !self.pool.contains(&product_id) {
            return Err(FreeItemError::NotInPool(product_id));
        }
        if self.remaining() == 0 {
            return Err(FreeItemError::QuotaReached {
                quantity: self.get_quantity,
            });
        }
        *self.picks.entry(product_id).or_insert(0) += 1;
        Ok(())
    }

    /// Put back one unit of `product_id`. Unpicked products are ignored.
    pub fn decrement(&mut self, product_id: ProductId) {
        if let Some(quantity) = self.picks.get_mut(&product_id) {
            *quantity -= 1;
            if *quantity == 0 {
                self.picks.remove(&product_id);
            }
        }
    }

    /// Units picked of one product.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.picks.get(&product_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn selected_count(&self) -> u32 {
        self.picks.values().sum()
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.get_quantity.saturating_sub(self.selected_count())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Give up the units not yet picked so checkout can proceed.
    pub const fn forfeit_remainder(&mut self) {
        self.forfeited = true;
    }

    #[must_use]
    pub const fn is_forfeited(&self) -> bool {
        self.forfeited
    }

    /// Picks so far, without checking completeness.
    #[must_use]
    pub fn items(&self) -> Vec<FreeItem> {
        self.picks
            .iter()
            .map(|(product_id, quantity)| FreeItem {
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect()
    }

    /// The final picks for checkout.
    ///
    /// # Errors
    ///
    /// Returns `FreeItemError::Incomplete` if units remain and the buyer has
    /// not forfeited them.
    pub fn finalize(&self) -> Result<Vec<FreeItem>, FreeItemError> {
        let remaining = self.remaining();
        if remaining > 0 && !self.forfeited {
            return Err(FreeItemError::Incomplete { remaining });
        }
        Ok(self.items())
    }
}
