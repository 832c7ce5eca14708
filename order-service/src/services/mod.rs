pub mod database;
pub mod metrics;
pub mod notifier;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use notifier::Notifier;
