//! Metrics module for order-service.
//! Prometheus metrics for order intake, lifecycle transitions and payments.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter, register_int_counter_vec,
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("orders_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Invoices created counter
pub static INVOICES_CREATED_TOTAL: OnceLock<IntCounter> = OnceLock::new();

/// Order status transitions counter
pub static ORDER_TRANSITIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Payments collected counter
pub static PAYMENTS_COLLECTED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Customer match lookups counter
pub static CUSTOMER_MATCHES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    INVOICES_CREATED_TOTAL.get_or_init(|| {
        register_int_counter!(opts!(
            "orders_invoices_created_total",
            "Total invoices created"
        ))
        .expect("Failed to register INVOICES_CREATED_TOTAL")
    });

    ORDER_TRANSITIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "orders_status_transitions_total",
                "Total order status transitions by source and target status"
            ),
            &["from", "to"]
        )
        .expect("Failed to register ORDER_TRANSITIONS_TOTAL")
    });

    PAYMENTS_COLLECTED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "orders_payments_collected_total",
                "Total payments collected by method"
            ),
            &["method"]
        )
        .expect("Failed to register PAYMENTS_COLLECTED_TOTAL")
    });

    CUSTOMER_MATCHES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "orders_customer_matches_total",
                "Phone-fragment match lookups by outcome"
            ),
            &["outcome"]
        )
        .expect("Failed to register CUSTOMER_MATCHES_TOTAL")
    });
}

/// Render every registered metric in the Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).ok();
    String::from_utf8(buffer).unwrap_or_else(|_| "# Failed to encode metrics\n".to_string())
}

/// Record a completed status transition.
pub fn record_transition(from: &str, to: &str) {
    if let Some(counter) = ORDER_TRANSITIONS_TOTAL.get() {
        counter.with_label_values(&[from, to]).inc();
    }
}

/// Record a collected payment for metering.
pub fn record_payment(method: &str) {
    if let Some(counter) = PAYMENTS_COLLECTED_TOTAL.get() {
        counter.with_label_values(&[method]).inc();
    }
}

/// Record the outcome of a phone-fragment match lookup.
pub fn record_customer_match(outcome: &str) {
    if let Some(counter) = CUSTOMER_MATCHES_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}
