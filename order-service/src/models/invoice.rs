//! Invoice model for order-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use super::draft::DraftLine;
use super::line_item::Totals;

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Received,
    InProcess,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::InProcess => "in_process",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "in_process" => OrderStatus::InProcess,
            "ready" => OrderStatus::Ready,
            "delivered" => OrderStatus::Delivered,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Received,
        }
    }

    /// Delivered and cancelled orders accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Payment method on an invoice. `Pending` is the default/unset state and is
/// not accepted by the payment collection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Pending,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Pending => "pending",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "cash" => PaymentMethod::Cash,
            "card" => PaymentMethod::Card,
            "transfer" => PaymentMethod::Transfer,
            _ => PaymentMethod::Pending,
        }
    }

    pub fn is_collectible(&self) -> bool {
        !matches!(self, PaymentMethod::Pending)
    }
}

/// Payment collection failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Invoice {invoice_number} is already paid")]
    AlreadyPaid { invoice_number: String },

    #[error("'{method}' is not a collectible payment method")]
    NotCollectible { method: String },
}

impl From<PaymentError> for service_core::error::AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::AlreadyPaid { .. } => {
                service_core::error::AppError::Conflict(anyhow::Error::new(err))
            }
            PaymentError::NotCollectible { .. } => {
                service_core::error::AppError::BadRequest(anyhow::Error::new(err))
            }
        }
    }
}

/// Format a counter value as an invoice number.
///
/// Three digits minimum; counters past 999 widen (`FAC-1000`) rather than
/// truncate.
pub fn format_invoice_number(seq: i64) -> String {
    format!("FAC-{:03}", seq)
}

/// Invoice document. Customer name/phone and line descriptions are snapshots
/// taken at save time so historical invoices survive catalog and customer
/// renames.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_date: NaiveDate,
    pub status: String,
    pub payment_method: String,
    pub paid: bool,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub employee_id: Uuid,
    pub cancelled_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub paid_utc: Option<DateTime<Utc>>,
    pub delivered_utc: Option<DateTime<Utc>>,
    pub cancelled_utc: Option<DateTime<Utc>>,
}

/// Input for saving an invoice, assembled by the handlers after the draft
/// calculator has priced every line.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_date: NaiveDate,
    pub employee_id: Uuid,
    pub lines: Vec<DraftLine>,
    pub totals: Totals,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Received,
            OrderStatus::InProcess,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_string(status.as_str()), status);
        }
    }

    #[test]
    fn only_delivered_and_cancelled_are_terminal() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Received.is_terminal());
        assert!(!OrderStatus::InProcess.is_terminal());
        assert!(!OrderStatus::Ready.is_terminal());
    }

    #[test]
    fn pending_is_not_collectible() {
        assert!(!PaymentMethod::Pending.is_collectible());
        assert!(PaymentMethod::Cash.is_collectible());
        assert!(PaymentMethod::Card.is_collectible());
        assert!(PaymentMethod::Transfer.is_collectible());
    }

    #[test]
    fn invoice_numbers_are_zero_padded() {
        assert_eq!(format_invoice_number(1), "FAC-001");
        assert_eq!(format_invoice_number(42), "FAC-042");
        assert_eq!(format_invoice_number(999), "FAC-999");
    }

    #[test]
    fn invoice_numbers_widen_past_three_digits() {
        assert_eq!(format_invoice_number(1000), "FAC-1000");
        assert_eq!(format_invoice_number(12345), "FAC-12345");
    }
}
