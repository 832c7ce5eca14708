//! Pricing catalog handlers.
//!
//! The catalog itself is maintained by the configuration module; this
//! service only reads it to drive the intake form.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::ServiceItemResponse;
use crate::middleware::ActorContext;
use crate::AppState;

/// List the active catalog entries available for new line items.
pub async fn list_services(
    State(state): State<AppState>,
    _actor: ActorContext,
) -> Result<Json<Vec<ServiceItemResponse>>, AppError> {
    let items = state.db.list_service_items(true).await?;
    Ok(Json(items.into_iter().map(ServiceItemResponse::from).collect()))
}
