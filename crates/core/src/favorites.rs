//! The visitor's saved products.
//!
//! Only product ids are kept. Names and prices are read from the current
//! catalog when the list is shown, so a saved product never shows a stale
//! price.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Product};
use crate::types::ProductId;

/// Saved products in the order they were added, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites {
    product_ids: Vec<ProductId>,
}

impl Favorites {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            product_ids: Vec::new(),
        }
    }

    /// Parse a stored list, dropping repeated ids.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not a favorites list.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut favorites: Self = serde_json::from_str(json)?;
        let mut seen = Vec::with_capacity(favorites.product_ids.len());
        favorites.product_ids.retain(|id| {
            let fresh = !seen.contains(id);
            seen.push(*id);
            fresh
        });
        Ok(favorites)
    }

    /// JSON form stored in the session.
    ///
    /// # Errors
    ///
    /// Never in practice: a list of integer ids always serializes.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Save `product_id`. Returns `false` if it was already saved.
    pub fn add(&mut self, product_id: ProductId) -> bool {
        if self.contains(product_id) {
            return false;
        }
        self.product_ids.push(product_id);
        true
    }

    /// Forget `product_id`. No-op if absent.
    pub fn remove(&mut self, product_id: ProductId) {
        self.product_ids.retain(|id| *id != product_id);
    }

    /// Add or remove `product_id`; returns whether it is saved afterwards.
    pub fn toggle(&mut self, product_id: ProductId) -> bool {
        if self.contains(product_id) {
            self.remove(product_id);
            false
        } else {
            self.product_ids.push(product_id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.product_ids.clear();
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }

    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// The saved products still for sale, in saved order.
    #[must_use]
    pub fn resolve<'c>(&self, catalog: &'c Catalog) -> Vec<&'c Product> {
        self.product_ids
            .iter()
            .filter_map(|id| catalog.product(*id))
            .filter(|p| p.active)
            .collect()
    }
}
