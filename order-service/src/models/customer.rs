//! Customer model and phone matching rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fragments shorter than this are not matched against the customer base.
pub const MIN_PHONE_FRAGMENT_LEN: usize = 4;

/// Customer record.
///
/// `order_count` and `total_spent` are maintained at the persistence layer,
/// not by this service; they are read back only to enrich match suggestions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub customer_id: Uuid,
    pub name: String,
    pub phone: String,
    pub phone_digits: String,
    pub email: Option<String>,
    pub order_count: i64,
    pub total_spent: Decimal,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Strip formatting from a phone number, keeping ASCII digits only.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whether a typed fragment is long enough to be worth matching.
pub fn fragment_ready(fragment: &str) -> bool {
    fragment.trim().chars().count() >= MIN_PHONE_FRAGMENT_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_formatting() {
        assert_eq!(normalize_phone("(809) 555-1234"), "8095551234");
        assert_eq!(normalize_phone("+1 809.555.1234"), "18095551234");
        assert_eq!(normalize_phone("ext"), "");
    }

    #[test]
    fn short_fragments_are_not_ready() {
        assert!(!fragment_ready(""));
        assert!(!fragment_ready("80"));
        assert!(!fragment_ready("  809  "));
        assert!(fragment_ready("8095"));
        assert!(fragment_ready("555-1234"));
    }
}
