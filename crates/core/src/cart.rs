//! The cart store.
//!
//! A [`Cart`] is the single authoritative record of what the buyer intends to
//! purchase. Lines keep insertion order for display and there is at most one
//! line per product. Totals are never stored: every read recomputes them from
//! the current lines with exact decimal arithmetic.
//!
//! Persistence goes through [`CartSnapshot`]. A snapshot that fails to parse
//! or violates the line invariants is discarded and the buyer starts with an
//! empty cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{ProductId, TaxRate, round_cents};

/// Errors from cart mutations and snapshot restoration.
///
/// Mutations validate before touching state, so a failed call leaves the
/// cart exactly as it was.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity passed to `add_item` was zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i64),
    /// The line would exceed the per-line maximum.
    #[error("quantity cannot exceed {max} per item")]
    QuantityTooLarge { max: u32 },
    /// The product has a zero or negative price and cannot be sold.
    #[error("product {product_id} has an invalid price ({price})")]
    InvalidPrice { product_id: ProductId, price: Decimal },
    /// A persisted snapshot could not be restored.
    #[error("corrupt cart snapshot: {0}")]
    CorruptSnapshot(String),
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Derived cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    /// Totals rounded to cents for display.
    ///
    /// Each figure is rounded independently from the exact value, so the
    /// rounded total may differ by a cent from rounded subtotal + rounded tax.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            subtotal: round_cents(self.subtotal),
            tax: round_cents(self.tax),
            total: round_cents(self.total),
        }
    }
}

/// Persisted form of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub version: u32,
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Current snapshot format.
    pub const VERSION: u32 = 1;
}

/// The buyer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    tax_rate: TaxRate,
}

impl Cart {
    /// Largest quantity a single line may hold.
    pub const MAX_LINE_QUANTITY: u32 = 999;

    /// Create an empty cart taxed at `tax_rate`.
    #[must_use]
    pub const fn new(tax_rate: TaxRate) -> Self {
        Self {
            lines: Vec::new(),
            tax_rate,
        }
    }

    /// Restore a cart from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CorruptSnapshot` if the version is unknown or any
    /// line breaks the cart invariants (duplicate product, zero quantity,
    /// non-positive price, quantity over the maximum).
    pub fn from_snapshot(snapshot: CartSnapshot, tax_rate: TaxRate) -> Result<Self, CartError> {
        if snapshot.version != CartSnapshot::VERSION {
            return Err(CartError::CorruptSnapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }

        let mut cart = Self::new(tax_rate);
        for line in snapshot.lines {
            if cart.is_in_cart(line.product_id) {
                return Err(CartError::CorruptSnapshot(format!(
                    "duplicate line for product {}",
                    line.product_id
                )));
            }
            if line.quantity == 0 || line.quantity > Self::MAX_LINE_QUANTITY {
                return Err(CartError::CorruptSnapshot(format!(
                    "product {} has quantity {}",
                    line.product_id, line.quantity
                )));
            }
            if line.unit_price <= Decimal::ZERO {
                return Err(CartError::CorruptSnapshot(format!(
                    "product {} has price {}",
                    line.product_id, line.unit_price
                )));
            }
            cart.lines.push(line);
        }
        Ok(cart)
    }

    /// Restore a cart from its JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CorruptSnapshot` if the JSON does not parse or the
    /// snapshot is invalid.
    pub fn from_snapshot_json(json: &str, tax_rate: TaxRate) -> Result<Self, CartError> {
        let snapshot: CartSnapshot = serde_json::from_str(json)
            .map_err(|e| CartError::CorruptSnapshot(e.to_string()))?;
        Self::from_snapshot(snapshot, tax_rate)
    }

    /// Restore from JSON, falling back to an empty cart on any corruption.
    #[must_use]
    pub fn restore_or_empty(json: Option<&str>, tax_rate: TaxRate) -> Self {
        json.and_then(|j| Self::from_snapshot_json(j, tax_rate).ok())
            .unwrap_or_else(|| Self::new(tax_rate))
    }

    /// Snapshot of the current lines for persistence.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            version: CartSnapshot::VERSION,
            lines: self.lines.clone(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of `product`, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if `quantity` is not positive, the product price is
    /// not positive, or the merged quantity would exceed the line maximum.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if product.price <= Decimal::ZERO {
            return Err(CartError::InvalidPrice {
                product_id: product.id,
                price: product.price,
            });
        }

        let existing = self.quantity_of(product.id);
        let merged = u32::try_from(quantity)
            .ok()
            .and_then(|q| q.checked_add(existing))
            .filter(|q| *q <= Self::MAX_LINE_QUANTITY)
            .ok_or(CartError::QuantityTooLarge {
                max: Self::MAX_LINE_QUANTITY,
            })?;

        if let Some(line) = self.line_mut(product.id) {
            line.quantity = merged;
        } else {
            self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: merged,
                image_ref: product.image_ref().map(str::to_owned),
            });
        }
        Ok(())
    }

    /// Remove a product's line. Absent products are ignored.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Replace a line's quantity. Zero or negative removes the line; absent
    /// products are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityTooLarge` if `quantity` exceeds the line maximum.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            self.remove_item(product_id);
            return Ok(());
        }
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= Self::MAX_LINE_QUANTITY)
            .ok_or(CartError::QuantityTooLarge {
                max: Self::MAX_LINE_QUANTITY,
            })?;
        if let Some(line) = self.line_mut(product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Add one unit to an existing line. Absent products are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityTooLarge` if the line is already at the maximum.
    pub fn increment_quantity(&mut self, product_id: ProductId) -> Result<(), CartError> {
        let Some(line) = self.line_mut(product_id) else {
            return Ok(());
        };
        if line.quantity >= Self::MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: Self::MAX_LINE_QUANTITY,
            });
        }
        line.quantity += 1;
        Ok(())
    }

    /// Take one unit off a line, removing it when it reaches zero.
    pub fn decrement_quantity(&mut self, product_id: ProductId) {
        match self.line_mut(product_id) {
            Some(line) if line.quantity > 1 => line.quantity -= 1,
            Some(_) => self.remove_item(product_id),
            None => {}
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    #[must_use]
    pub const fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Quantity of a product in the cart, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity)
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Tax on the subtotal.
    #[must_use]
    pub fn tax(&self) -> Decimal {
        self.tax_rate.tax_on(self.subtotal())
    }

    /// Subtotal plus tax.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let subtotal = self.subtotal();
        subtotal + self.tax_rate.tax_on(subtotal)
    }

    /// All three totals computed from one pass over the lines.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let subtotal = self.subtotal();
        let tax = self.tax_rate.tax_on(subtotal);
        CartTotals {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn product(id: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: None,
            price: Decimal::new(cents, 2),
            category_id: None,
            images: vec![format!("https://img/{id}.jpg")],
            featured: false,
            active: true,
            created_at: None,
        }
    }

    fn cookie() -> Product {
        Product {
            name: "Chocolate Chip Cookie".to_owned(),
            ..product(1, 299)
        }
    }

    #[test]
    fn test_cookie_totals() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 4).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal, Decimal::new(1196, 2));
        assert_eq!(totals.tax, Decimal::new(10166, 4));
        assert_eq!(totals.total, Decimal::new(129_766, 4));

        let rounded = totals.rounded();
        assert_eq!(rounded.tax, Decimal::new(102, 2));
        assert_eq!(rounded.total, Decimal::new(1298, 2));
    }

    #[test]
    fn test_recomputing_totals_does_not_drift() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 4).unwrap();
        let first = cart.totals();
        for _ in 0..100 {
            assert_eq!(cart.totals(), first);
        }
        assert_eq!(cart.total(), first.total);
        assert_eq!(cart.tax(), first.tax);
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 2).unwrap();
        cart.add_item(&cookie(), 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 5);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity_without_mutating() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 1).unwrap();
        let before = cart.clone();

        assert_eq!(cart.add_item(&cookie(), 0), Err(CartError::InvalidQuantity(0)));
        assert_eq!(cart.add_item(&cookie(), -3), Err(CartError::InvalidQuantity(-3)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_rejects_free_product() {
        let mut cart = Cart::new(TaxRate::default());
        let freebie = product(9, 0);
        assert!(matches!(
            cart.add_item(&freebie, 1),
            Err(CartError::InvalidPrice { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_line_overflow() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 990).unwrap();
        assert_eq!(
            cart.add_item(&cookie(), 10),
            Err(CartError::QuantityTooLarge { max: 999 })
        );
        assert_eq!(cart.quantity_of(ProductId::new(1)), 990);
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&product(3, 100), 1).unwrap();
        cart.add_item(&product(1, 100), 1).unwrap();
        cart.add_item(&product(2, 100), 1).unwrap();
        cart.add_item(&product(3, 100), 1).unwrap();

        let ids: Vec<_> = cart.lines().iter().map(|l| l.product_id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_decrement_at_one_removes_line() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 1).unwrap();
        cart.decrement_quantity(ProductId::new(1));

        assert!(!cart.is_in_cart(ProductId::new(1)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 2).unwrap();
        cart.increment_quantity(ProductId::new(1)).unwrap();
        assert_eq!(cart.quantity_of(ProductId::new(1)), 3);
        cart.decrement_quantity(ProductId::new(1));
        assert_eq!(cart.quantity_of(ProductId::new(1)), 2);
    }

    #[test]
    fn test_increment_absent_is_noop() {
        let mut cart = Cart::new(TaxRate::default());
        cart.increment_quantity(ProductId::new(42)).unwrap();
        cart.decrement_quantity(ProductId::new(42));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 3).unwrap();
        cart.set_quantity(ProductId::new(1), 7).unwrap();
        assert_eq!(cart.quantity_of(ProductId::new(1)), 7);

        cart.set_quantity(ProductId::new(1), 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 1).unwrap();
        cart.remove_item(ProductId::new(99));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_snapshot_restores() {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(&cookie(), 4).unwrap();
        cart.add_item(&product(2, 850), 1).unwrap();

        let json = serde_json::to_string(&cart.snapshot()).unwrap();
        let restored = Cart::from_snapshot_json(&json, TaxRate::default()).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_corrupt_snapshot_is_discarded() {
        let rate = TaxRate::default();
        assert!(Cart::restore_or_empty(Some("{not json"), rate).is_empty());
        assert!(Cart::restore_or_empty(None, rate).is_empty());

        let zero_qty = r#"{"version":1,"lines":[{"product_id":1,"name":"Cookie","unit_price":"2.99","quantity":0}]}"#;
        assert!(matches!(
            Cart::from_snapshot_json(zero_qty, rate),
            Err(CartError::CorruptSnapshot(_))
        ));

        let dup = r#"{"version":1,"lines":[
            {"product_id":1,"name":"Cookie","unit_price":"2.99","quantity":1},
            {"product_id":1,"name":"Cookie","unit_price":"2.99","quantity":2}]}"#;
        assert!(Cart::restore_or_empty(Some(dup), rate).is_empty());

        let future = r#"{"version":7,"lines":[]}"#;
        assert!(Cart::from_snapshot_json(future, rate).is_err());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(i32, i64),
        Remove(i32),
        Set(i32, i64),
        Increment(i32),
        Decrement(i32),
    }

    fn op() -> impl Strategy<Value = Op> {
        let id = 1..6i32;
        prop_oneof![
            (id.clone(), 1..10i64).prop_map(|(p, q)| Op::Add(p, q)),
            id.clone().prop_map(Op::Remove),
            (id.clone(), -3..20i64).prop_map(|(p, q)| Op::Set(p, q)),
            id.clone().prop_map(Op::Increment),
            id.prop_map(Op::Decrement),
        ]
    }

    proptest! {
        #[test]
        fn prop_totals_stay_consistent(ops in prop::collection::vec(op(), 0..60)) {
            let mut cart = Cart::new(TaxRate::default());
            for op in ops {
                match op {
                    Op::Add(p, q) => { cart.add_item(&product(p, 100 + i64::from(p) * 37), q).unwrap(); }
                    Op::Remove(p) => cart.remove_item(ProductId::new(p)),
                    Op::Set(p, q) => cart.set_quantity(ProductId::new(p), q).unwrap(),
                    Op::Increment(p) => cart.increment_quantity(ProductId::new(p)).unwrap(),
                    Op::Decrement(p) => cart.decrement_quantity(ProductId::new(p)),
                }

                let quantities: u64 = cart.lines().iter().map(|l| u64::from(l.quantity)).sum();
                prop_assert_eq!(cart.item_count(), quantities);

                let totals = cart.totals();
                prop_assert_eq!(totals.total, totals.subtotal + totals.tax);
                prop_assert_eq!(totals.tax, totals.subtotal * TaxRate::default().as_decimal());
                prop_assert!(cart.lines().iter().all(|l| l.quantity >= 1));

                let mut ids: Vec<_> = cart.lines().iter().map(|l| l.product_id).collect();
                ids.sort();
                ids.dedup();
                prop_assert_eq!(ids.len(), cart.lines().len());
            }
        }
    }
}
