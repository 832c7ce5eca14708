//! Actor identity extractor.
//!
//! The authenticating gateway fronting this service resolves the employee
//! session and forwards the identity as headers; the engine itself keeps no
//! ambient "current employee" state. Every business operation receives the
//! acting employee and role explicitly through this extractor.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::ActorRole;

/// Acting employee extracted from request headers.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    pub employee_id: Uuid,
    pub role: ActorRole,
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let employee_id = parts
            .headers
            .get("X-Employee-Id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-Employee-Id header (set by the gateway)"
                ))
            })?;
        let employee_id = Uuid::parse_str(employee_id).map_err(|_| {
            AppError::Unauthorized(anyhow::anyhow!("X-Employee-Id is not a valid id"))
        })?;

        let role = parts
            .headers
            .get("X-Employee-Role")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-Employee-Role header (set by the gateway)"
                ))
            })?;
        let role = ActorRole::parse(role).ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Unknown employee role '{}'", role))
        })?;

        let span = tracing::Span::current();
        span.record("employee_id", employee_id.to_string().as_str());
        span.record("employee_role", role.as_str());

        Ok(ActorContext { employee_id, role })
    }
}
