//! Request and response DTOs for the HTTP surface.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    Customer, DraftLine, Invoice, InvoiceLine, OrderStatus, PaymentMethod, ServiceItem,
    ServiceVariant, Totals,
};

// -------------------------------------------------------------------------
// Requests
// -------------------------------------------------------------------------

/// One requested line on a draft or invoice.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LineRequest {
    pub service_item_id: Uuid,
    pub variant: ServiceVariant,
    #[validate(range(min = 1, message = "quantity must be a positive whole number"))]
    pub quantity: i32,
}

/// Price a draft without saving anything.
#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    #[validate(length(min = 1, message = "at least one line is required"), nested)]
    pub lines: Vec<LineRequest>,
}

/// Save an invoice.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "customer name is required"))]
    pub customer_name: String,
    #[validate(length(min = 4, message = "customer phone is required"))]
    pub customer_phone: String,
    #[validate(email(message = "customer email is not valid"))]
    pub customer_email: Option<String>,
    pub delivery_date: NaiveDate,
    #[validate(length(min = 1, message = "an invoice needs at least one line"), nested)]
    pub lines: Vec<LineRequest>,
}

/// Request a status change.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
    pub reason: Option<String>,
}

/// Collect payment for an invoice.
#[derive(Debug, Deserialize)]
pub struct CollectPaymentRequest {
    pub method: PaymentMethod,
}

/// Query parameters for the customer matcher.
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub fragment: String,
}

/// Query parameters for listing invoices.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
    pub page_size: Option<i32>,
    pub page_token: Option<Uuid>,
}

// -------------------------------------------------------------------------
// Responses
// -------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ServiceItemResponse {
    pub service_item_id: Uuid,
    pub name: String,
    pub category: String,
    pub price_wash: Decimal,
    pub price_iron: Decimal,
    pub price_wash_iron: Decimal,
}

impl From<ServiceItem> for ServiceItemResponse {
    fn from(item: ServiceItem) -> Self {
        Self {
            service_item_id: item.service_item_id,
            name: item.name,
            category: item.category,
            price_wash: item.price_wash,
            price_iron: item.price_iron,
            price_wash_iron: item.price_wash_iron,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub customer_id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub order_count: i64,
    pub total_spent: Decimal,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            customer_id: customer.customer_id,
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            order_count: customer.order_count,
            total_spent: customer.total_spent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LineResponse {
    pub line_no: u32,
    pub service_item_id: Uuid,
    pub description: String,
    pub variant: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

impl From<&DraftLine> for LineResponse {
    fn from(line: &DraftLine) -> Self {
        Self {
            line_no: line.line_no,
            service_item_id: line.service_item_id,
            description: line.description.clone(),
            variant: line.variant.as_str().to_string(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            total: line.total,
        }
    }
}

impl From<&InvoiceLine> for LineResponse {
    fn from(line: &InvoiceLine) -> Self {
        Self {
            line_no: (line.sort_order + 1) as u32,
            service_item_id: line.service_item_id,
            description: line.description.clone(),
            variant: line.variant.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            total: line.total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub lines: Vec<LineResponse>,
    pub totals: Totals,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
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
    pub lines: Vec<LineResponse>,
}

impl InvoiceResponse {
    pub fn from_invoice(invoice: Invoice, lines: Vec<InvoiceLine>) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            invoice_number: invoice.invoice_number,
            customer_id: invoice.customer_id,
            customer_name: invoice.customer_name,
            customer_phone: invoice.customer_phone,
            customer_email: invoice.customer_email,
            delivery_date: invoice.delivery_date,
            status: invoice.status,
            payment_method: invoice.payment_method,
            paid: invoice.paid,
            subtotal: invoice.subtotal,
            tax: invoice.tax,
            total: invoice.total,
            employee_id: invoice.employee_id,
            cancelled_reason: invoice.cancelled_reason,
            cancelled_by: invoice.cancelled_by,
            created_utc: invoice.created_utc,
            paid_utc: invoice.paid_utc,
            delivered_utc: invoice.delivered_utc,
            cancelled_utc: invoice.cancelled_utc,
            lines: lines.iter().map(LineResponse::from).collect(),
        }
    }
}

/// Listing entry: the invoice header without its lines.
#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_date: NaiveDate,
    pub status: String,
    pub paid: bool,
    pub total: Decimal,
    pub created_utc: DateTime<Utc>,
}

impl From<Invoice> for InvoiceSummary {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            invoice_number: invoice.invoice_number,
            customer_name: invoice.customer_name,
            customer_phone: invoice.customer_phone,
            delivery_date: invoice.delivery_date,
            status: invoice.status,
            paid: invoice.paid,
            total: invoice.total,
            created_utc: invoice.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceSummary>,
    pub next_page_token: Option<Uuid>,
}
