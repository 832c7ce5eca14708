//! Order status transition rules.
//!
//! The guard is a pure function so the rules can be tested without a
//! database; the persistence layer evaluates it under a row lock before
//! committing any status change.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::invoice::OrderStatus;

/// Role attached to the acting employee by the authenticating gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Manager,
    Supervisor,
    Employee,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Manager => "manager",
            ActorRole::Supervisor => "supervisor",
            ActorRole::Employee => "employee",
        }
    }

    /// Strict parse: an unknown role is an authentication problem, not a
    /// default.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manager" => Some(ActorRole::Manager),
            "supervisor" => Some(ActorRole::Supervisor),
            "employee" => Some(ActorRole::Employee),
            _ => None,
        }
    }
}

/// Guard violations for a requested status change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot deliver an unpaid order")]
    PaymentRequired,

    #[error("Order is already {} and cannot change further", .0.as_str())]
    TerminalState(OrderStatus),

    #[error("Only a manager may cancel an order")]
    Unauthorized(ActorRole),

    #[error("A cancellation reason is required")]
    MissingReason,
}

impl From<TransitionError> for service_core::error::AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Unauthorized(_) => {
                service_core::error::AppError::Forbidden(anyhow::Error::new(err))
            }
            _ => service_core::error::AppError::BadRequest(anyhow::Error::new(err)),
        }
    }
}

/// Check whether `target` is reachable from `current` for this actor.
///
/// Ordering across the non-terminal statuses is advisory: the counter flow
/// may skip straight from received to ready. Only the payment guard, the
/// terminal lock and the cancellation rules are enforced.
pub fn check_transition(
    current: OrderStatus,
    target: OrderStatus,
    paid: bool,
    role: ActorRole,
    reason: Option<&str>,
) -> Result<(), TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::TerminalState(current));
    }

    match target {
        OrderStatus::Delivered if !paid => Err(TransitionError::PaymentRequired),
        OrderStatus::Cancelled => {
            if role != ActorRole::Manager {
                return Err(TransitionError::Unauthorized(role));
            }
            match reason {
                Some(r) if !r.trim().is_empty() => Ok(()),
                _ => Err(TransitionError::MissingReason),
            }
        }
        _ => Ok(()),
    }
}
