//! Pricing catalog model for order-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Service variant selected for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceVariant {
    Wash,
    Iron,
    WashIron,
}

impl ServiceVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceVariant::Wash => "wash",
            ServiceVariant::Iron => "iron",
            ServiceVariant::WashIron => "wash_iron",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "iron" => ServiceVariant::Iron,
            "wash_iron" => ServiceVariant::WashIron,
            _ => ServiceVariant::Wash,
        }
    }
}

/// Pricing catalog entry for a garment or service type.
///
/// Entries are mutated by the configuration module, never by this service.
/// An inactive entry cannot be selected for new line items but stays
/// referenced by historical invoices, which snapshot name and price.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceItem {
    pub service_item_id: Uuid,
    pub name: String,
    pub category: String,
    pub price_wash: Decimal,
    pub price_iron: Decimal,
    pub price_wash_iron: Decimal,
    pub active: bool,
    pub created_utc: DateTime<Utc>,
}

impl ServiceItem {
    /// Unit price for the selected variant.
    pub fn price_for(&self, variant: ServiceVariant) -> Decimal {
        match variant {
            ServiceVariant::Wash => self.price_wash,
            ServiceVariant::Iron => self.price_iron,
            ServiceVariant::WashIron => self.price_wash_iron,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shirt() -> ServiceItem {
        ServiceItem {
            service_item_id: Uuid::new_v4(),
            name: "Shirt".to_string(),
            category: "garments".to_string(),
            price_wash: Decimal::new(6000, 2),
            price_iron: Decimal::new(4000, 2),
            price_wash_iron: Decimal::new(8500, 2),
            active: true,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn price_for_picks_the_variant_column() {
        let item = shirt();
        assert_eq!(item.price_for(ServiceVariant::Wash), Decimal::new(6000, 2));
        assert_eq!(item.price_for(ServiceVariant::Iron), Decimal::new(4000, 2));
        assert_eq!(
            item.price_for(ServiceVariant::WashIron),
            Decimal::new(8500, 2)
        );
    }

    #[test]
    fn variant_round_trips_through_strings() {
        for variant in [
            ServiceVariant::Wash,
            ServiceVariant::Iron,
            ServiceVariant::WashIron,
        ] {
            assert_eq!(ServiceVariant::from_string(variant.as_str()), variant);
        }
    }
}
