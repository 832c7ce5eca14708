//! Draft invoice calculator.
//!
//! Prices line items in memory before anything is persisted. The intake form
//! adds and removes lines against this draft and re-quotes totals on every
//! change; only a save turns the draft into an invoice row.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::line_item::Totals;
use super::service_item::{ServiceItem, ServiceVariant};

/// Errors raised while assembling a draft.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Quantity {quantity} is not a positive whole number")]
    InvalidQuantity { quantity: i32 },

    #[error("Service '{name}' is disabled and cannot be added to a new invoice")]
    InactiveEntry { name: String },

    #[error("Line {line_no} does not exist on this draft")]
    LineNotFound { line_no: u32 },
}

impl From<DraftError> for service_core::error::AppError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::LineNotFound { .. } => {
                service_core::error::AppError::NotFound(anyhow::Error::new(err))
            }
            _ => service_core::error::AppError::BadRequest(anyhow::Error::new(err)),
        }
    }
}

/// A priced line on a draft, carrying the catalog snapshot that will be
/// persisted verbatim on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub line_no: u32,
    pub service_item_id: Uuid,
    pub description: String,
    pub variant: ServiceVariant,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// An unsaved invoice under construction.
#[derive(Debug, Default)]
pub struct DraftInvoice {
    lines: Vec<DraftLine>,
    next_line_no: u32,
}

impl DraftInvoice {
    pub fn new() -> Self {
        DraftInvoice {
            lines: Vec::new(),
            next_line_no: 1,
        }
    }

    /// Price and append a line, returning its line number. The unit price is
    /// snapshotted from the catalog entry at this moment; later catalog
    /// edits do not touch it.
    pub fn add_line(
        &mut self,
        item: &ServiceItem,
        variant: ServiceVariant,
        quantity: i32,
    ) -> Result<u32, DraftError> {
        if quantity <= 0 {
            return Err(DraftError::InvalidQuantity { quantity });
        }
        if !item.active {
            return Err(DraftError::InactiveEntry {
                name: item.name.clone(),
            });
        }

        let line_no = self.next_line_no;
        let unit_price = item.price_for(variant);
        let total = (unit_price * Decimal::from(quantity)).round_dp(2);
        self.lines.push(DraftLine {
            line_no,
            service_item_id: item.service_item_id,
            description: item.name.clone(),
            variant,
            quantity,
            unit_price,
            total,
        });
        self.next_line_no += 1;
        Ok(line_no)
    }

    pub fn remove_line(&mut self, line_no: u32) -> Result<(), DraftError> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.line_no == line_no)
            .ok_or(DraftError::LineNotFound { line_no })?;
        self.lines.remove(idx);
        Ok(())
    }

    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Recompute the aggregates from the current line set. Never mutates the
    /// lines; calling it any number of times yields identical values.
    pub fn recompute(&self, tax_rate: Decimal) -> Totals {
        Totals::compute(self.lines.iter().map(|l| l.total), tax_rate)
    }

    pub fn into_lines(self) -> Vec<DraftLine> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(name: &str, wash: &str, iron: &str, both: &str, active: bool) -> ServiceItem {
        ServiceItem {
            service_item_id: Uuid::new_v4(),
            name: name.to_string(),
            category: "garments".to_string(),
            price_wash: dec(wash),
            price_iron: dec(iron),
            price_wash_iron: dec(both),
            active,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn two_shirts_wash_iron_price_as_the_reference_example() {
        let shirt = item("Shirt", "60.00", "40.00", "85.00", true);
        let mut draft = DraftInvoice::new();
        draft.add_line(&shirt, ServiceVariant::WashIron, 2).unwrap();

        let line = &draft.lines()[0];
        assert_eq!(line.unit_price, dec("85.00"));
        assert_eq!(line.total, dec("170.00"));

        let totals = draft.recompute(dec("0.18"));
        assert_eq!(totals.subtotal, dec("170.00"));
        assert_eq!(totals.tax, dec("30.60"));
        assert_eq!(totals.total, dec("200.60"));
    }

    #[test]
    fn zero_or_negative_quantity_is_rejected() {
        let shirt = item("Shirt", "60.00", "40.00", "85.00", true);
        let mut draft = DraftInvoice::new();

        assert_eq!(
            draft.add_line(&shirt, ServiceVariant::Wash, 0),
            Err(DraftError::InvalidQuantity { quantity: 0 })
        );
        assert_eq!(
            draft.add_line(&shirt, ServiceVariant::Wash, -3),
            Err(DraftError::InvalidQuantity { quantity: -3 })
        );
        assert!(draft.is_empty());
    }

    #[test]
    fn inactive_entries_cannot_join_new_drafts() {
        let retired = item("Leather Jacket", "250.00", "0.00", "250.00", false);
        let mut draft = DraftInvoice::new();

        assert_eq!(
            draft.add_line(&retired, ServiceVariant::Wash, 1),
            Err(DraftError::InactiveEntry {
                name: "Leather Jacket".to_string()
            })
        );
    }

    #[test]
    fn removing_an_unknown_line_fails() {
        let mut draft = DraftInvoice::new();
        assert_eq!(
            draft.remove_line(7),
            Err(DraftError::LineNotFound { line_no: 7 })
        );
    }

    #[test]
    fn remove_then_recompute_reflects_the_remaining_lines() {
        let shirt = item("Shirt", "60.00", "40.00", "85.00", true);
        let pants = item("Pants", "70.00", "50.00", "100.00", true);
        let mut draft = DraftInvoice::new();
        draft.add_line(&shirt, ServiceVariant::WashIron, 2).unwrap();
        let pants_line_no = draft.add_line(&pants, ServiceVariant::Iron, 1).unwrap();

        draft.remove_line(pants_line_no).unwrap();

        assert_eq!(draft.lines().len(), 1);
        let totals = draft.recompute(dec("0.18"));
        assert_eq!(totals.subtotal, dec("170.00"));
    }

    #[test]
    fn line_numbers_are_not_reused_after_removal() {
        let shirt = item("Shirt", "60.00", "40.00", "85.00", true);
        let mut draft = DraftInvoice::new();
        let first = draft.add_line(&shirt, ServiceVariant::Wash, 1).unwrap();
        draft.remove_line(first).unwrap();
        let second = draft.add_line(&shirt, ServiceVariant::Wash, 1).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn recompute_is_idempotent_on_an_unchanged_draft() {
        let shirt = item("Shirt", "60.00", "40.00", "85.00", true);
        let mut draft = DraftInvoice::new();
        draft.add_line(&shirt, ServiceVariant::WashIron, 3).unwrap();

        let first = draft.recompute(dec("0.18"));
        let second = draft.recompute(dec("0.18"));
        assert_eq!(first, second);
    }

    #[test]
    fn snapshot_survives_catalog_price_edits() {
        let mut shirt = item("Shirt", "60.00", "40.00", "85.00", true);
        let mut draft = DraftInvoice::new();
        draft.add_line(&shirt, ServiceVariant::WashIron, 1).unwrap();

        // The configuration module raises prices after the line was added.
        shirt.price_wash_iron = dec("95.00");

        assert_eq!(draft.lines()[0].unit_price, dec("85.00"));
    }
}
