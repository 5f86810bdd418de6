//! Invoice arithmetic: numbering and totals.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::InvoiceItem;

/// Prefix of generated invoice numbers
pub const INVOICE_PREFIX: &str = "INV";

/// Width of the zero-padded numeric part
const NUMBER_WIDTH: usize = 6;

/// Next number in the `PREFIX-000123` sequence: one past the highest numeric
/// suffix among `existing`. Numbers that don't fit the pattern are ignored,
/// as are suffixes too large to have a successor.
pub fn next_invoice_number<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let next = existing
        .into_iter()
        .filter_map(|n| n.trim().strip_prefix(prefix))
        .filter_map(|rest| rest.trim_start_matches('-').parse::<u64>().ok())
        .filter_map(|n| n.checked_add(1))
        .max()
        .unwrap_or(1);
    format!("{}-{:0width$}", prefix, next, width = NUMBER_WIDTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// subtotal = sum of quantity * unit price; tax at `tax_rate` percent,
    /// rounded half away from zero to cents
    pub fn compute(items: &[InvoiceItem], tax_rate: Decimal) -> Self {
        let subtotal: Decimal = items.iter().map(InvoiceItem::line_total).sum();
        let tax = (subtotal * tax_rate / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(qty: i32, price: &str) -> InvoiceItem {
        InvoiceItem {
            description: "Line".to_string(),
            quantity: qty,
            unit_price: Decimal::from_str(price).unwrap(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_first_invoice_number() {
        assert_eq!(next_invoice_number(INVOICE_PREFIX, []), "INV-000001");
    }

    #[test]
    fn test_next_after_highest() {
        let existing = ["INV-000007", "INV-000012", "INV-000003"];
        assert_eq!(next_invoice_number("INV", existing), "INV-000013");
    }

    #[test]
    fn test_suffix_without_successor_ignored() {
        let existing = ["INV-18446744073709551615", "INV-000004"];
        assert_eq!(next_invoice_number("INV", existing), "INV-000005");
        assert_eq!(
            next_invoice_number("INV", ["INV-18446744073709551615"]),
            "INV-000001"
        );
    }

    #[test]
    fn test_foreign_numbers_ignored() {
        let existing = ["RCPT-000900", "INV-abc", "INV-000002", ""];
        assert_eq!(next_invoice_number("INV", existing), "INV-000003");
    }

    #[test]
    fn test_number_wider_than_padding() {
        assert_eq!(next_invoice_number("INV", ["INV-999999"]), "INV-1000000");
    }

    #[test]
    fn test_totals() {
        let items = [item(2, "25.00"), item(1, "9.99")];
        let totals = Totals::compute(&items, dec("16"));
        assert_eq!(totals.subtotal, dec("59.99"));
        assert_eq!(totals.tax, dec("9.60"));
        assert_eq!(totals.total, dec("69.59"));
    }

    #[test]
    fn test_totals_no_items() {
        let totals = Totals::compute(&[], dec("10"));
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 0.125 -> 0.13
        let totals = Totals::compute(&[item(1, "1.25")], dec("10"));
        assert_eq!(totals.tax, dec("0.13"));
    }
}
