//! Invoice lifecycle handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{
    CollectPaymentRequest, CreateInvoiceRequest, InvoiceListResponse, InvoiceResponse,
    InvoiceSummary, LineRequest, LineResponse, ListInvoicesQuery, QuoteRequest, QuoteResponse,
    TransitionRequest,
};
use crate::middleware::ActorContext;
use crate::models::{CreateInvoice, DraftInvoice, ListInvoicesFilter, ServiceItem};
use crate::services::Database;
use crate::AppState;

const DEFAULT_PAGE_SIZE: i32 = 50;

/// Price the requested lines against the live catalog.
///
/// Unknown entries fail the whole request; the draft itself rejects inactive
/// entries and non-positive quantities.
async fn price_lines(db: &Database, lines: &[LineRequest]) -> Result<DraftInvoice, AppError> {
    let ids: Vec<Uuid> = lines.iter().map(|l| l.service_item_id).collect();
    let items = db.get_service_items(&ids).await?;
    let by_id: HashMap<Uuid, ServiceItem> = items
        .into_iter()
        .map(|item| (item.service_item_id, item))
        .collect();

    let mut draft = DraftInvoice::new();
    for line in lines {
        let item = by_id.get(&line.service_item_id).ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "Unknown service item {}",
                line.service_item_id
            ))
        })?;
        draft.add_line(item, line.variant, line.quantity)?;
    }
    Ok(draft)
}

/// Price a draft without saving anything.
///
/// The intake form calls this as the operator adds and removes lines, so the
/// totals on screen always come from the same calculator that prices the
/// final save.
pub async fn quote(
    State(state): State<AppState>,
    _actor: ActorContext,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    payload.validate()?;

    let draft = price_lines(&state.db, &payload.lines).await?;
    let totals = draft.recompute(state.config.pricing.tax_rate);

    Ok(Json(QuoteResponse {
        lines: draft.lines().iter().map(LineResponse::from).collect(),
        totals,
    }))
}

/// Save an invoice: price the draft, resolve the customer, assign the next
/// number and persist everything atomically. The new order starts in
/// `received`.
pub async fn create_invoice(
    State(state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    payload.validate()?;

    let draft = price_lines(&state.db, &payload.lines).await?;
    let totals = draft.recompute(state.config.pricing.tax_rate);

    let input = CreateInvoice {
        customer_name: payload.customer_name.trim().to_string(),
        customer_phone: payload.customer_phone.trim().to_string(),
        customer_email: payload
            .customer_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        delivery_date: payload.delivery_date,
        employee_id: actor.employee_id,
        lines: draft.into_lines(),
        totals,
    };

    let (invoice, lines) = state.db.create_invoice(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(InvoiceResponse::from_invoice(invoice, lines)),
    ))
}

/// Get an invoice with its line snapshots.
pub async fn get_invoice(
    State(state): State<AppState>,
    _actor: ActorContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;
    let lines = state.db.get_invoice_lines(invoice_id).await?;

    Ok(Json(InvoiceResponse::from_invoice(invoice, lines)))
}

/// List invoices with optional status/customer filters.
pub async fn list_invoices(
    State(state): State<AppState>,
    _actor: ActorContext,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<InvoiceListResponse>, AppError> {
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let filter = ListInvoicesFilter {
        status: query.status,
        customer_id: query.customer_id,
        page_size,
        page_token: query.page_token,
    };

    let invoices = state.db.list_invoices(&filter).await?;

    let next_page_token = if invoices.len() as i64 == page_size.clamp(1, 100) as i64 {
        invoices.last().map(|inv| inv.invoice_id)
    } else {
        None
    };

    Ok(Json(InvoiceListResponse {
        invoices: invoices.into_iter().map(InvoiceSummary::from).collect(),
        next_page_token,
    }))
}

/// Change an order's lifecycle status.
///
/// Guard violations come back as typed failures with their specific message
/// ("Cannot deliver an unpaid order", ...) so the counter UI can show them
/// verbatim. A successful change is handed to the notification dispatcher.
pub async fn transition(
    State(state): State<AppState>,
    actor: ActorContext,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<TransitionRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .db
        .transition_status(
            invoice_id,
            payload.status,
            actor.role,
            actor.employee_id,
            payload.reason.as_deref(),
        )
        .await?;

    state.notifier.order_status_changed(&invoice);

    let lines = state.db.get_invoice_lines(invoice_id).await?;
    Ok(Json(InvoiceResponse::from_invoice(invoice, lines)))
}

/// Collect payment for an invoice, exactly once.
pub async fn collect_payment(
    State(state): State<AppState>,
    _actor: ActorContext,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<CollectPaymentRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state.db.collect_payment(invoice_id, payload.method).await?;

    let lines = state.db.get_invoice_lines(invoice_id).await?;
    Ok(Json(InvoiceResponse::from_invoice(invoice, lines)))
}
