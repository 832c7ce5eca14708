//! Customer-facing notification dispatch.
//!
//! The engine only hands a status-change event to the external messaging
//! dispatcher (WhatsApp/SMS templating lives there). Dispatch is
//! fire-and-forget: a failed or slow webhook never delays or fails the
//! operator's request.

use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::Invoice;

#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            webhook_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Dispatch a status-change event for an invoice.
    pub fn order_status_changed(&self, invoice: &Invoice) {
        let Some(url) = self.webhook_url.clone() else {
            debug!(
                invoice_number = %invoice.invoice_number,
                "Notifier not configured, skipping status-change dispatch"
            );
            return;
        };

        let payload = json!({
            "event": "order_status_changed",
            "invoice_number": invoice.invoice_number,
            "customer_name": invoice.customer_name,
            "customer_phone": invoice.customer_phone,
            "status": invoice.status,
            "delivery_date": invoice.delivery_date,
        });

        let client = self.client.clone();
        let invoice_number = invoice.invoice_number.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(response) if !response.status().is_success() => {
                    warn!(
                        invoice_number = %invoice_number,
                        status = %response.status(),
                        "Notification webhook rejected status-change event"
                    );
                }
                Err(e) => {
                    warn!(
                        invoice_number = %invoice_number,
                        error = %e,
                        "Failed to dispatch status-change notification"
                    );
                }
                _ => {}
            }
        });
    }
}
