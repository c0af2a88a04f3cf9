//! `lt-cli specials evaluate`

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use llama_treats_core::specials::{best_auto_special, estimate_savings};
use llama_treats_core::{Cart, Catalog, SpecialEvaluator, format_price};
use rust_decimal::Decimal;

use super::{CommandError, load_cart, load_json};

/// Evaluate every special in `catalog_path` against the cart in `cart_path`.
///
/// # Errors
///
/// Returns `CommandError` if either file cannot be read or parsed.
pub fn evaluate(
    catalog_path: &Path,
    cart_path: &Path,
    now: DateTime<Utc>,
    tax_rate: Decimal,
) -> Result<String, CommandError> {
    let catalog: Catalog = load_json(catalog_path)?;
    let cart = load_cart(cart_path, tax_rate)?;
    tracing::debug!(
        specials = catalog.specials.len(),
        items = cart.item_count(),
        "Evaluating specials"
    );
    Ok(report(&catalog, &cart, now))
}

fn report(catalog: &Catalog, cart: &Cart, now: DateTime<Utc>) -> String {
    let evaluator = SpecialEvaluator::new(&catalog.products, now);
    let evaluated = evaluator.evaluate_all(&catalog.specials, cart);

    // Writing to a String never fails, so the fmt results are ignored.
    let mut out = String::new();
    if evaluated.is_empty() {
        out.push_str("No live specials.");
        return out;
    }

    for (special, result) in &evaluated {
        let status = if result.satisfied { "yes" } else { "no" };
        let _ = write!(
            out,
            "#{} {} [{}] qualifies: {status}",
            special.id,
            special.name,
            special.label()
        );
        if special.code.is_some() {
            out.push_str(" (code)");
        }
        if result.satisfied {
            let savings = estimate_savings(&evaluator, special, cart, None);
            let _ = write!(out, ", saves about {}", format_price(savings));
        }
        out.push('\n');
        if let Some(progress) = result.progress_message() {
            let _ = writeln!(out, "    {progress}");
        }
    }

    match best_auto_special(&evaluator, &catalog.specials, cart, None) {
        Some((special, savings)) => {
            let _ = write!(
                out,
                "Applied automatically: #{} {} ({})",
                special.id,
                special.name,
                format_price(savings)
            );
        }
        None => out.push_str("Applied automatically: none"),
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use llama_treats_core::TaxRate;

    use super::*;

    fn catalog() -> Catalog {
        serde_json::from_str(
            r#"{
            "products": [
                {"id": 1, "name": "Croissant", "price": "2.99", "categoryId": 1, "active": true},
                {"id": 5, "name": "Carrot Cake", "price": "5.75", "categoryId": 3, "active": true}
            ],
            "categories": [
                {"id": 1, "name": "Pastries", "active": true},
                {"id": 3, "name": "Cakes", "active": true}
            ],
            "specials": [
                {"id": 1, "name": "Spring Cake Sale", "type": "percentage_discount", "value": 20,
                 "categoryIds": [3], "startDate": "2024-01-01T00:00:00Z",
                 "endDate": "2024-12-31T23:59:59Z", "active": true},
                {"id": 2, "name": "Baker's Dozen", "type": "buy_x_get_y",
                 "value": {"buyQuantity": 12, "getQuantity": 1}, "categoryIds": [1],
                 "startDate": "2024-01-01T00:00:00Z", "endDate": "2024-12-31T23:59:59Z",
                 "active": true}
            ]
        }"#,
        )
        .unwrap()
    }

    fn cart() -> Cart {
        let json = r#"{"version":1,"lines":[
            {"product_id":1,"name":"Croissant","unit_price":"2.99","quantity":8},
            {"product_id":5,"name":"Carrot Cake","unit_price":"5.75","quantity":2}
        ]}"#;
        Cart::from_snapshot_json(json, TaxRate::default()).unwrap()
    }

    fn june() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_report_lists_progress_and_auto_special() {
        let report = report(&catalog(), &cart(), june());
        assert!(report.contains("#1 Spring Cake Sale [20% OFF] qualifies: yes, saves about $2.30"));
        assert!(report.contains("#2 Baker's Dozen [Buy 12, Get 1 Free] qualifies: no"));
        assert!(report.contains("Add 4 more item(s) to qualify!"));
        assert!(report.ends_with("Applied automatically: #1 Spring Cake Sale ($2.30)"));
    }

    #[test]
    fn test_nothing_live_after_window() {
        let later = Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap();
        assert_eq!(report(&catalog(), &cart(), later), "No live specials.");
    }
}
