//! Application state for shop service.

use std::sync::Arc;

use common::config::AppConfig;
use common::errors::AppResult;
use common::models::{ConnectionConfig, QueryCatalog};

use crate::connection::{Connector, PgConnector};
use crate::executor::QueryExecutor;
use crate::queries;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub executor: Arc<QueryExecutor>,
}

impl AppState {
    /// Loads database settings and the query table, and wires the
    /// PostgreSQL connector.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let connection = ConnectionConfig::from_env()?;
        let catalog = queries::build_catalog(config.query_catalog_path.as_deref())?;
        let connector = Arc::new(PgConnector::new(config.connect_timeout()));
        Ok(Self::with_connector(config, connection, catalog, connector))
    }

    /// Creates a state around an arbitrary connector.
    pub fn with_connector(
        config: AppConfig,
        connection: ConnectionConfig,
        catalog: QueryCatalog,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            executor: Arc::new(QueryExecutor::new(connector, connection, Arc::new(catalog))),
            config,
        }
    }
}
