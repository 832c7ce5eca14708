//! Domain models for order-service.

mod customer;
mod draft;
mod invoice;
mod lifecycle;
mod line_item;
mod service_item;

pub use customer::{fragment_ready, normalize_phone, Customer, MIN_PHONE_FRAGMENT_LEN};
pub use draft::{DraftError, DraftInvoice, DraftLine};
pub use invoice::{
    format_invoice_number, CreateInvoice, Invoice, ListInvoicesFilter, OrderStatus, PaymentError,
    PaymentMethod,
};
pub use lifecycle::{check_transition, ActorRole, TransitionError};
pub use line_item::{InvoiceLine, Totals};
pub use service_item::{ServiceItem, ServiceVariant};
