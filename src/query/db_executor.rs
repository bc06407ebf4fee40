use async_trait::async_trait;
use neo4rs::{ConfigBuilder, Graph, Query, Row};

use crate::config::DatabaseConfig;
use crate::errors::ExecutionError;

use super::Record;

/// Runs a single Cypher statement and returns its rows
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<Vec<Record>, ExecutionError>;
}

/// Executes queries against Neo4j, opening a fresh connection for every
/// statement. The graph handle is dropped when `execute` returns, so no
/// connection outlives the call.
pub struct Neo4jExecutor {
    config: DatabaseConfig,
    fetch_size: usize,
}

impl Neo4jExecutor {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            fetch_size: 200,
        }
    }

    async fn connect(&self) -> Result<Graph, ExecutionError> {
        let neo4j_config = ConfigBuilder::default()
            .uri(self.config.endpoint.as_str())
            .user(self.config.username.as_str())
            .password(self.config.password.as_str())
            .db(self.config.database_name.as_str())
            .max_connections(1)
            .fetch_size(self.fetch_size)
            .build()
            .map_err(|e| ExecutionError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo4j_config)
            .await
            .map_err(|e| ExecutionError::Connection(e.to_string()))?;

        // The pool is lazy; force the handshake so connection problems are
        // reported as such rather than as query failures.
        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(|e| ExecutionError::Connection(e.to_string()))?;

        Ok(graph)
    }
}

#[async_trait]
impl QueryExecutor for Neo4jExecutor {
    async fn execute(&self, query: &str) -> Result<Vec<Record>, ExecutionError> {
        tracing::debug!("Executing Cypher against {}: {}", self.config.endpoint, query);

        let graph = self.connect().await?;

        let mut stream = graph
            .execute(Query::new(query.to_string()))
            .await
            .map_err(|e| ExecutionError::Query(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| ExecutionError::Query(e.to_string()))?
        {
            records.push(record_from_row(&row)?);
        }

        tracing::debug!("Query returned {} records", records.len());
        Ok(records)
    }
}

/// Decode one result row into a field-name to JSON map. Nodes become
/// their property maps.
fn record_from_row(row: &Row) -> Result<Record, ExecutionError> {
    row.to::<Record>()
        .map_err(|e| ExecutionError::Query(format!("Failed to decode row: {}", e)))
}
