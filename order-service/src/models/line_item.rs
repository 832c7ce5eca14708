//! Persisted invoice lines and aggregate totals.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Line item on a saved invoice. `description`, `unit_price` and `total` are
/// snapshots taken when the invoice was saved; only `service_item_id` links
/// back to the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceLine {
    pub line_id: Uuid,
    pub invoice_id: Uuid,
    pub service_item_id: Uuid,
    pub description: String,
    pub variant: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Aggregates recomputed from a set of line totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Totals {
    /// Sum line totals and apply the configured tax rate at 2-decimal
    /// precision, rounding the midpoint away from zero. Pure function of its
    /// inputs: calling it again on the same lines yields the same aggregates.
    pub fn compute(line_totals: impl IntoIterator<Item = Decimal>, tax_rate: Decimal) -> Self {
        let subtotal: Decimal = line_totals.into_iter().sum::<Decimal>().round_dp(2);
        let tax =
            (subtotal * tax_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let total = subtotal + tax;
        Totals {
            subtotal,
            tax,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn totals_match_the_reference_example() {
        // 2 × shirt wash+iron at 85.00
        let totals = Totals::compute([dec("170.00")], dec("0.18"));
        assert_eq!(totals.subtotal, dec("170.00"));
        assert_eq!(totals.tax, dec("30.60"));
        assert_eq!(totals.total, dec("200.60"));
    }

    #[test]
    fn tax_rounds_the_midpoint_up() {
        // 12.50 × 0.18 = 2.25 exactly; 13.75 × 0.18 = 2.475 → 2.48
        let totals = Totals::compute([dec("13.75")], dec("0.18"));
        assert_eq!(totals.tax, dec("2.48"));
        assert_eq!(totals.total, dec("16.23"));
    }

    #[test]
    fn totals_sum_multiple_lines_exactly() {
        let totals = Totals::compute([dec("60.00"), dec("40.00"), dec("85.00")], dec("0.18"));
        assert_eq!(totals.subtotal, dec("185.00"));
        assert_eq!(totals.tax, dec("33.30"));
        assert_eq!(totals.total, dec("218.30"));
    }

    #[test]
    fn compute_is_idempotent() {
        let lines = [dec("19.99"), dec("3.01")];
        let first = Totals::compute(lines, dec("0.18"));
        let second = Totals::compute(lines, dec("0.18"));
        assert_eq!(first, second);
    }

    #[test]
    fn other_tax_regimes_substitute_cleanly() {
        let totals = Totals::compute([dec("100.00")], dec("0.07"));
        assert_eq!(totals.tax, dec("7.00"));
        assert_eq!(totals.total, dec("107.00"));
    }

    #[test]
    fn empty_line_set_yields_zero_aggregates() {
        let totals = Totals::compute(std::iter::empty(), dec("0.18"));
        assert_eq!(totals.subtotal, dec("0.00"));
        assert_eq!(totals.tax, dec("0.00"));
        assert_eq!(totals.total, dec("0.00"));
    }
}
