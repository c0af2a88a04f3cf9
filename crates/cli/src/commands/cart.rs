//! `lt-cli cart price`

use std::fmt::Write as _;
use std::path::Path;

use llama_treats_core::{Cart, format_price};
use rust_decimal::Decimal;

use super::{CommandError, load_cart};

/// Price the cart in `cart_path`.
///
/// # Errors
///
/// Returns `CommandError` if the file cannot be read or is not a valid cart.
pub fn price(cart_path: &Path, tax_rate: Decimal) -> Result<String, CommandError> {
    let cart = load_cart(cart_path, tax_rate)?;
    Ok(report(&cart))
}

fn report(cart: &Cart) -> String {
    // Writing to a String never fails, so the fmt results are ignored.
    let mut out = String::new();
    for line in cart.lines() {
        let _ = writeln!(
            out,
            "{:>4} x {:<28} {:>10} {:>10}",
            line.quantity,
            line.name,
            format_price(line.unit_price),
            format_price(line.line_total()),
        );
    }

    let totals = cart.totals();
    let rate = cart.tax_rate().as_decimal() * Decimal::ONE_HUNDRED;
    let _ = writeln!(out, "Items:    {}", cart.item_count());
    let _ = writeln!(out, "Subtotal: {}", format_price(totals.subtotal));
    let _ = writeln!(out, "Tax ({}%): {}", rate.normalize(), format_price(totals.tax));
    let _ = write!(out, "Total:    {}", format_price(totals.total));
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use llama_treats_core::TaxRate;

    use super::*;

    #[test]
    fn test_report_rounds_only_for_display() {
        let json = r#"{"version":1,"lines":[
            {"product_id":1,"name":"Croissant","unit_price":"2.99","quantity":4},
            {"product_id":3,"name":"Sourdough","unit_price":"8.50","quantity":1}
        ]}"#;
        let cart = Cart::from_snapshot_json(json, TaxRate::default()).unwrap();

        let report = report(&cart);
        assert!(report.contains("Croissant"));
        assert!(report.contains("$11.96"));
        assert!(report.contains("Items:    5"));
        assert!(report.contains("Subtotal: $20.46"));
        assert!(report.contains("Tax (8.5%): $1.74"));
        assert!(report.ends_with("Total:    $22.20"));
    }

    #[test]
    fn test_empty_cart() {
        let report = report(&Cart::new(TaxRate::default()));
        assert!(report.contains("Items:    0"));
        assert!(report.ends_with("Total:    $0.00"));
    }

    #[test]
    fn test_missing_file() {
        let err = price(Path::new("/nonexistent/cart.json"), Decimal::new(85, 3)).unwrap_err();
        assert!(matches!(err, CommandError::Read { .. }));
    }

    #[test]
    fn test_bad_tax_rate() {
        let err = price(Path::new("/nonexistent/cart.json"), Decimal::ONE).unwrap_err();
        assert!(matches!(err, CommandError::TaxRate(_)));
    }
}
