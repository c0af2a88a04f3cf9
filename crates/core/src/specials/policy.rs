//! Which special a checkout carries.
//!
//! Specials never stack: an order gets at most one. A promo code the buyer
//! enters always names that one. Without a code, the storefront may apply the
//! best code-less special automatically.

use rust_decimal::Decimal;

use crate::cart::Cart;
use crate::specials::eligibility::SpecialEvaluator;
use crate::specials::free_items::FreeItemSelection;
use crate::specials::savings::estimate_savings;
use crate::specials::special::Special;

/// The satisfied code-less special with the largest estimated saving.
///
/// Ties go to the lowest special ID. Specials that would save nothing are
/// never picked.
#[must_use]
pub fn best_auto_special<'s>(
    evaluator: &SpecialEvaluator<'_>,
    specials: impl IntoIterator<Item = &'s Special>,
    cart: &Cart,
    selection: Option<&FreeItemSelection>,
) -> Option<(&'s Special, Decimal)> {
    specials
        .into_iter()
        .filter(|s| s.code.is_none())
        .map(|s| (s, estimate_savings(evaluator, s, cart, selection)))
        .filter(|(_, savings)| *savings > Decimal::ZERO)
        .max_by(|(a, a_savings), (b, b_savings)| {
            a_savings.cmp(b_savings).then_with(|| b.id.cmp(&a.id))
        })
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

    fn special(id: i32, value: i64, code: Option<&str>) -> Special {
        serde_json::from_value(json!({
            "id": id,
            "name": format!("Special {id}"),
            "type": "bundle_discount",
            "value": value,
            "startDate": "2024-01-01T00:00:00Z",
            "endDate": "2024-12-31T23:59:59Z",
            "active": true,
            "code": code,
        }))
        .unwrap()
    }

    fn cart() -> (Vec<Product>, Cart) {
        let products = vec![Product {
            id: ProductId::new(1),
            name: "Sourdough".to_owned(),
            slug: String::new(),
            description: None,
            price: Decimal::from(20),
            category_id: Some(CategoryId::new(5)),
            images: Vec::new(),
            featured: false,
            active: true,
            created_at: None,
        }];
        let mut cart = Cart::new(TaxRate::default());
        cart.add_item(products.first().unwrap(), 1).unwrap();
        (products, cart)
    }

    #[test]
    fn test_picks_largest_saving_without_code() {
        let (products, cart) = cart();
        let evaluator = SpecialEvaluator::new(&products, now());
        let specials = [
            special(1, 3, None),
            special(2, 8, Some("BIG8")),
            special(3, 5, None),
        ];

        let (best, savings) = best_auto_special(&evaluator, &specials, &cart, None).unwrap();
        assert_eq!(best.id.as_i32(), 3);
        assert_eq!(savings, Decimal::from(5));
    }

    #[test]
    fn test_ties_go_to_lowest_id() {
        let (products, cart) = cart();
        let evaluator = SpecialEvaluator::new(&products, now());
        let specials = [special(4, 5, None), special(2, 5, None)];

        let (best, _) = best_auto_special(&evaluator, &specials, &cart, None).unwrap();
        assert_eq!(best.id.as_i32(), 2);
    }

    #[test]
    fn test_empty_cart_gets_nothing() {
        let (products, _) = cart();
        let evaluator = SpecialEvaluator::new(&products, now());
        let specials = [special(1, 3, None)];

        assert!(
            best_auto_special(&evaluator, &specials, &Cart::new(TaxRate::default()), None)
                .is_none()
        );
    }
}
