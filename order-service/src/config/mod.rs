use anyhow::{Context, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Deserialize, Clone, Debug)]
pub struct OrderConfig {
    pub service_name: String,
    pub log_level: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pricing: PricingConfig,
    pub notifier: NotifierConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PricingConfig {
    /// Flat tax rate applied to invoice subtotals (ITBIS in the reference
    /// deployment). Configurable so other tax regimes substitute cleanly.
    pub tax_rate: Decimal,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NotifierConfig {
    /// Webhook of the customer-messaging dispatcher. Unset disables dispatch.
    pub webhook_url: Option<String>,
}

impl OrderConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("ORDER_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ORDER_SERVICE_PORT")
            .unwrap_or_else(|_| "3006".to_string())
            .parse()
            .context("ORDER_SERVICE_PORT must be a valid port number")?;

        let db_url =
            env::var("ORDER_DATABASE_URL").context("ORDER_DATABASE_URL must be set")?;
        let max_connections = env::var("ORDER_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("ORDER_DATABASE_MAX_CONNECTIONS must be a number")?;
        let min_connections = env::var("ORDER_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("ORDER_DATABASE_MIN_CONNECTIONS must be a number")?;

        let tax_rate = Decimal::from_str(
            &env::var("APP_TAX_RATE").unwrap_or_else(|_| "0.18".to_string()),
        )
        .context("APP_TAX_RATE must be a decimal fraction such as 0.18")?;

        let webhook_url = env::var("NOTIFIER_WEBHOOK_URL").ok().filter(|s| !s.is_empty());

        let log_level = env::var("ORDER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            service_name: "order-service".to_string(),
            log_level,
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections,
                min_connections,
            },
            pricing: PricingConfig { tax_rate },
            notifier: NotifierConfig { webhook_url },
        })
    }
}
