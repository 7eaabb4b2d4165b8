//! 查询执行模块

use std::sync::Arc;

use common::errors::AppResult;
use common::models::{ConnectionConfig, QueryCatalog, QueryParams, Record};

use crate::connection::Connector;

/// Runs queries over a fresh connection and returns rows as records.
pub struct QueryExecutor {
    connector: Arc<dyn Connector>,
    config: ConnectionConfig,
    catalog: Arc<QueryCatalog>,
}

impl QueryExecutor {
    /// 创建新的查询执行器实例
    pub fn new(
        connector: Arc<dyn Connector>,
        config: ConnectionConfig,
        catalog: Arc<QueryCatalog>,
    ) -> Self {
        Self {
            connector,
            config,
            catalog,
        }
    }

    /// Executes `sql` and returns one record per row, in row order.
    ///
    /// `params` reach the driver exactly as given. The connection is closed
    /// before returning, whether or not the query succeeded. No rows yields
    /// an empty vector; connection and query failures are returned as errors.
    pub async fn process_query(&self, sql: &str, params: QueryParams) -> AppResult<Vec<Record>> {
        let mut session = self.connector.connect(&self.config).await?;
        let outcome = session.run(sql, &params).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close database connection");
        }

        let records = outcome?.into_records()?;
        tracing::debug!(rows = records.len(), "query executed");
        Ok(records)
    }

    /// Looks `name` up in the catalog and runs it.
    pub async fn run_named(&self, name: &str, params: QueryParams) -> AppResult<Vec<Record>> {
        let sql = self.catalog.get(name)?;
        tracing::debug!(query = name, params = params.len(), "running named query");
        self.process_query(sql, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ResultSet;
    use crate::testing::{result_set, RecordedCall, RecordingConnector};
    use common::errors::AppError;
    use common::models::FieldValue;

    fn executor(connector: &RecordingConnector) -> QueryExecutor {
        let catalog = QueryCatalog::new([("categories", "SELECT * FROM categories")]).unwrap();
        QueryExecutor::new(
            Arc::new(connector.clone()),
            crate::testing::connection_config(),
            Arc::new(catalog),
        )
    }

    fn sample() -> ResultSet {
        result_set(
            &["user_id", "first_name", "last_name"],
            vec![
                vec![1.into(), "Afton".into(), "Kuhn".into()],
                vec![2.into(), "Rosalyn".into(), "Bergnaum".into()],
            ],
        )
    }

    #[tokio::test]
    async fn test_rows_become_records_keyed_by_column() {
        let connector = RecordingConnector::returning(sample());
        let records = executor(&connector)
            .process_query("test query", QueryParams::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(
                record.columns().collect::<Vec<_>>(),
                vec!["user_id", "first_name", "last_name"]
            );
        }
        assert_eq!(records[1].get("last_name"), Some(&FieldValue::from("Bergnaum")));
    }

    #[tokio::test]
    async fn test_no_rows_is_empty_not_error() {
        let connector = RecordingConnector::returning(ResultSet::default());
        let records = executor(&connector)
            .process_query("test query", QueryParams::new())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_params_reach_driver_unmodified() {
        let connector = RecordingConnector::returning(sample());
        let params = QueryParams::new().with("param1", "x").with("user_id", 10);

        executor(&connector)
            .process_query("test params", params.clone())
            .await
            .unwrap();

        assert_eq!(
            connector.calls(),
            vec![RecordedCall {
                sql: "test params".to_string(),
                params,
            }]
        );
    }

    #[tokio::test]
    async fn test_connection_failure_propagates() {
        let connector = RecordingConnector::refusing("Awful error");
        let err = executor(&connector)
            .process_query("test query", QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DatabaseConnection(msg) if msg == "Awful error"));
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_propagates_and_closes() {
        let connector = RecordingConnector::new(|_, _| {
            Err(AppError::DatabaseQuery("relation \"sale\" does not exist".into()))
        });
        let err = executor(&connector)
            .process_query("SELECT * FROM sale", QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DatabaseQuery(_)));
        assert_eq!(connector.connections_opened(), 1);
        assert_eq!(connector.connections_closed(), 1);
    }

    #[tokio::test]
    async fn test_each_call_uses_its_own_connection() {
        let connector = RecordingConnector::returning(sample());
        let executor = executor(&connector);
        executor.process_query("a", QueryParams::new()).await.unwrap();
        executor.process_query("b", QueryParams::new()).await.unwrap();

        assert_eq!(connector.connections_opened(), 2);
        assert_eq!(connector.connections_closed(), 2);
    }

    #[tokio::test]
    async fn test_run_named_resolves_catalog() {
        let connector = RecordingConnector::returning(ResultSet::default());
        executor(&connector)
            .run_named("categories", QueryParams::new())
            .await
            .unwrap();
        assert_eq!(connector.calls()[0].sql, "SELECT * FROM categories");
    }

    #[tokio::test]
    async fn test_unknown_name_does_not_connect() {
        let connector = RecordingConnector::returning(ResultSet::default());
        let err = executor(&connector)
            .run_named("orders", QueryParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnknownQuery(_)));
        assert_eq!(connector.connections_opened(), 0);
    }
}
