use rust_decimal::Decimal;

use crate::orders::OrderLine;

/// Service for calculating order totals from line items
pub struct PriceCalculator;

impl PriceCalculator {
    /// Subtotal for a single line (unit price × quantity)
    pub fn line_subtotal(line: &OrderLine) -> Decimal {
        line.unit_price * Decimal::from(line.quantity)
    }

    /// Order total: sum of all line subtotals
    ///
    /// Computed once at placement; placed orders are never re-totalled.
    pub fn order_total(lines: &[OrderLine]) -> Decimal {
        lines.iter().map(Self::line_subtotal).sum()
    }
}
