//! Scope resolution: which products qualify for a special.

use rust_decimal::Decimal;

use crate::cart::{Cart, CartLine};
use crate::catalog::Product;
use crate::specials::special::Scope;
use crate::types::ProductId;

/// Concrete set of qualifying products, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedScope {
    product_ids: Vec<ProductId>,
}

impl ResolvedScope {
    /// Resolve a declared scope against the product list.
    ///
    /// Explicit product IDs take precedence; otherwise every active product in
    /// one of the declared categories; otherwise every active product. Only
    /// active products ever qualify.
    #[must_use]
    pub fn resolve(scope: &Scope, products: &[Product]) -> Self {
        let active = products.iter().filter(|p| p.active);
        let product_ids = if !scope.product_ids.is_empty() {
            active
                .filter(|p| scope.product_ids.contains(&p.id))
                .map(|p| p.id)
                .collect()
        } else if !scope.category_ids.is_empty() {
            active
                .filter(|p| {
                    p.category_id
                        .is_some_and(|c| scope.category_ids.contains(&c))
                })
                .map(|p| p.id)
                .collect()
        } else {
            active.map(|p| p.id).collect()
        };
        Self { product_ids }
    }

    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// Cart lines whose product qualifies.
    pub fn cart_lines<'a>(&'a self, cart: &'a Cart) -> impl Iterator<Item = &'a CartLine> + 'a {
        cart.lines().iter().filter(|l| self.contains(l.product_id))
    }

    /// Units of qualifying products in the cart.
    #[must_use]
    pub fn cart_quantity(&self, cart: &Cart) -> u64 {
        self.cart_lines(cart).map(|l| u64::from(l.quantity)).sum()
    }

    /// Subtotal of qualifying lines.
    #[must_use]
    pub fn cart_subtotal(&self, cart: &Cart) -> Decimal {
        self.cart_lines(cart).map(CartLine::line_total).sum()
    }
}
