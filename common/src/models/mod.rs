//! Shared data models.

pub mod connection;
pub mod query;
pub mod record;
pub mod sale;

pub use connection::ConnectionConfig;
pub use query::QueryCatalog;
pub use record::{decimal_to_f64, FieldValue, QueryParams, Record};
pub use sale::{AverageSpend, SALE_FIELDS};
