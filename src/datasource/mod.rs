//! Read-only data sources

pub mod authentication;
pub mod site;

pub use authentication::{CatalogEntry, StrategyCatalog};
pub use site::SiteDataSource;

use chrono::Utc;

/// Data sources have no remote identity; each read is keyed by its Unix time
fn read_id() -> String {
    Utc::now().timestamp().to_string()
}
