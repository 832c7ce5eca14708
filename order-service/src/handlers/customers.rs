//! Customer matcher handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::{CustomerResponse, MatchQuery};
use crate::middleware::ActorContext;
use crate::services::metrics::record_customer_match;
use crate::AppState;

/// Suggest an existing customer for a partially typed phone number.
///
/// Returns `null` until the fragment is long enough to match, and the first
/// customer by insertion order when several match. The form uses this to
/// pre-fill invoice fields; it is a suggestion, not an authoritative lookup.
pub async fn match_customer(
    State(state): State<AppState>,
    _actor: ActorContext,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Option<CustomerResponse>>, AppError> {
    let customer = state
        .db
        .find_customer_by_phone_fragment(&query.fragment)
        .await?;

    record_customer_match(if customer.is_some() { "hit" } else { "miss" });

    Ok(Json(customer.map(CustomerResponse::from)))
}
