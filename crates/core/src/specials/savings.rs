//! Savings estimates.
//!
//! These figures are a preview for the buyer. The order API prices the
//! order itself; nothing here is sent as an amount to charge.

use rust_decimal::Decimal;

use crate::cart::Cart;
use crate::specials::eligibility::SpecialEvaluator;
use crate::specials::free_items::FreeItemSelection;
use crate::specials::special::{Special, SpecialKind};

/// Estimated saving from applying `special` to `cart`, unrounded.
///
/// Zero if the special is not live or not satisfied. For buy-X-get-Y offers
/// a matching `selection` prices the actual picks; without one the estimate
/// assumes the cheapest item in the pool.
#[must_use]
pub fn estimate_savings(
    evaluator: &SpecialEvaluator<'_>,
    special: &Special,
    cart: &Cart,
    selection: Option<&FreeItemSelection>,
) -> Decimal {
    let Some(result) = evaluator.evaluate(special, cart) else {
        return Decimal::ZERO;
    };
    if !result.satisfied {
        return Decimal::ZERO;
    }

    match &special.kind {
        SpecialKind::PercentageDiscount { percent } => {
            result.qualifying_subtotal * *percent / Decimal::ONE_HUNDRED
        }
        SpecialKind::BundleDiscount { amount } => (*amount).min(result.qualifying_subtotal),
        SpecialKind::FixedPrice { price } => evaluator
            .qualifying_scope(special)
            .cart_lines(cart)
            .map(|l| (l.unit_price - *price).max(Decimal::ZERO) * Decimal::from(l.quantity))
            .sum(),
        SpecialKind::BuyXGetY(terms) => {
            let price_of = |id| {
                evaluator
                    .products()
                    .iter()
                    .find(|p| p.id == id)
                    .map_or(Decimal::ZERO, |p| p.price)
            };
            match selection.filter(|s| s.special_id() == special.id) {
                Some(selection) => selection
                    .items()
                    .iter()
                    .filter(|item| result.eligible_free_product_ids.contains(&item.product_id))
                    .map(|item| price_of(item.product_id) * Decimal::from(item.quantity))
                    .sum(),
                None => result
                    .eligible_free_product_ids
                    .iter()
                    .map(|id| price_of(*id))
                    .min()
                    .map_or(Decimal::ZERO, |cheapest| {
                        cheapest * Decimal::from(terms.get_quantity)
                    }),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::catalog::Product;
    use crate::types::{CategoryId, ProductId, TaxRate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    fn product(id: i32, category: i32, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: String::new(),
            description: None,
            price: Decimal::new(cents, 2),
            category_id: Some(CategoryId::new(category)),
            images: Vec::new(),
            featured: false,
            active: true,
            created_at: None,
        }
    }

    fn special(kind: &str, value: serde_json::Value, extra: serde_json::Value) -> Special {
        let mut raw = json!({
            "id": 1,
            "name": "Test",
            "type": kind,
            "value": value,
            "startDate": "2024-01-01T00:00:00Z",
            "endDate": "2024-12-31T23:59:59Z",
            "active": true,
        });
        if let (Some(raw), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
            raw.extend(extra.clone());
        }
        serde_json::from_value(raw).unwrap()
    }

    fn setup() -> (Vec<Product>, Cart) {
        let products = vec![product(1, 1, 299), product(2, 1, 199), product(3, 5, 850)];
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(products.first().unwrap(), 4).unwrap();
        cart.add_item(products.get(2).unwrap(), 1).unwrap();
        (products, cart)
    }

    #[test]
    fn test_percentage_of_qualifying_subtotal() {
        let (products, cart) = setup();
        let evaluator = SpecialEvaluator::new(&products, now());
        let s = special("percentage_discount", json!(20), json!({ "productIds": [1] }));
        assert_eq!(
            estimate_savings(&evaluator, &s, &cart, None),
            Decimal::new(2392, 3)
        );
    }

    #[test]
    fn test_bundle_capped_at_qualifying_subtotal() {
        let (products, cart) = setup();
        let evaluator = SpecialEvaluator::new(&products, now());
        let s = special("bundle_discount", json!(10), json!({ "categoryIds": [5] }));
        assert_eq!(
            estimate_savings(&evaluator, &s, &cart, None),
            Decimal::new(850, 2)
        );
    }

    #[test]
    fn test_fixed_price_difference() {
        let (products, cart) = setup();
        let evaluator = SpecialEvaluator::new(&products, now());
        let s = special("fixed_price", json!("2.00"), json!({ "productIds": [1] }));
        assert_eq!(
            estimate_savings(&evaluator, &s, &cart, None),
            Decimal::new(396, 2)
        );
    }

    #[test]
    fn test_buy_x_get_y_uses_selection_or_cheapest() {
        let (products, cart) = setup();
        let evaluator = SpecialEvaluator::new(&products, now());
        let s = special(
            "buy_x_get_y",
            json!({ "buyQuantity": 4, "getQuantity": 1 }),
            json!({ "categoryIds": [1] }),
        );

        assert_eq!(
            estimate_savings(&evaluator, &s, &cart, None),
            Decimal::new(199, 2)
        );

        let result = evaluator.evaluate(&s, &cart).unwrap();
        let mut selection = FreeItemSelection::for_result(&result).unwrap();
        selection.increment(ProductId::new(1)).unwrap();
        assert_eq!(
            estimate_savings(&evaluator, &s, &cart, Some(&selection)),
            Decimal::new(299, 2)
        );
    }

    #[test]
    fn test_unsatisfied_saves_nothing() {
        let (products, cart) = setup();
        let evaluator = SpecialEvaluator::new(&products, now());
        let s = special(
            "bundle_discount",
            json!(5),
            json!({ "categoryIds": [5], "minPurchase": 15 }),
        );
        assert_eq!(estimate_savings(&evaluator, &s, &cart, None), Decimal::ZERO);
    }
}
