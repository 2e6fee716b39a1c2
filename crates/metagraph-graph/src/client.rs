//! Neo4j connection client.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{BoltList, BoltMap, BoltNull, BoltString, BoltType, ConfigBuilder, Graph, Query, Txn};
use serde::Deserialize;
use tracing::{debug, info};

use metagraph_core::{MetagraphError, MetagraphResult, Statement, Value};

use crate::engine::{GraphEngine, GraphTransaction, Row};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
    pub fetch_size: usize,
    /// Deadline for each engine call; unbounded when absent.
    pub statement_timeout_secs: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "neo4j".to_string(),
            database: "neo4j".to_string(),
            max_connections: 16,
            fetch_size: 200,
            statement_timeout_secs: Some(30),
        }
    }
}

impl GraphConfig {
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_secs.map(Duration::from_secs)
    }
}

/// Pooled Neo4j client; clones share the pool.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
    timeout: Option<Duration>,
}

impl GraphClient {
    /// Create a new GraphClient from config.
    ///
    /// `Graph::connect` only builds the pool, so a `RETURN 1` ping forces a
    /// real handshake and an unreachable server fails here.
    pub async fn connect(config: &GraphConfig) -> MetagraphResult<Self> {
        let neo4j_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(MetagraphError::engine)?;

        let graph = Graph::connect(neo4j_config).await.map_err(MetagraphError::engine)?;
        let client = Self {
            graph,
            timeout: config.statement_timeout(),
        };

        client.run(Statement::new("RETURN 1 AS ok")).await?;
        info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");

        Ok(client)
    }

    /// Create a new GraphClient with default configuration.
    pub async fn connect_default() -> MetagraphResult<Self> {
        Self::connect(&GraphConfig::default()).await
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}

#[async_trait]
impl GraphEngine for GraphClient {
    type Transaction = GraphTxn;

    async fn run(&self, statement: Statement) -> MetagraphResult<Vec<Row>> {
        debug!(statement = %statement.text(), "running statement");
        let query = to_query(&statement);
        bounded(self.timeout, async {
            let mut stream = self.graph.execute(query).await.map_err(MetagraphError::engine)?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await.map_err(MetagraphError::engine)? {
                rows.push(decode_row(&row)?);
            }
            Ok(rows)
        })
        .await
    }

    async fn begin(&self) -> MetagraphResult<GraphTxn> {
        let txn = bounded(self.timeout, async {
            self.graph.start_txn().await.map_err(MetagraphError::engine)
        })
        .await?;
        Ok(GraphTxn {
            txn,
            timeout: self.timeout,
        })
    }
}

/// An explicit Neo4j transaction.
pub struct GraphTxn {
    txn: Txn,
    timeout: Option<Duration>,
}

#[async_trait]
impl GraphTransaction for GraphTxn {
    async fn run(&mut self, statement: Statement) -> MetagraphResult<Vec<Row>> {
        debug!(statement = %statement.text(), "running statement in transaction");
        let query = to_query(&statement);
        let txn = &mut self.txn;
        bounded(self.timeout, async move {
            let mut stream = txn.execute(query).await.map_err(MetagraphError::engine)?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next(txn.handle()).await.map_err(MetagraphError::engine)? {
                rows.push(decode_row(&row)?);
            }
            Ok(rows)
        })
        .await
    }

    async fn commit(self) -> MetagraphResult<()> {
        bounded(self.timeout, async move {
            self.txn.commit().await.map_err(MetagraphError::engine)
        })
        .await
    }

    async fn rollback(self) -> MetagraphResult<()> {
        bounded(self.timeout, async move {
            self.txn.rollback().await.map_err(MetagraphError::engine)
        })
        .await
    }
}

async fn bounded<T>(
    limit: Option<Duration>,
    call: impl Future<Output = MetagraphResult<T>>,
) -> MetagraphResult<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| MetagraphError::EngineTimeout(limit))?,
        None => call.await,
    }
}

fn to_query(statement: &Statement) -> Query {
    statement
        .params()
        .iter()
        .fold(Query::new(statement.text().to_string()), |query, (key, value)| {
            query.param(key, to_bolt(value))
        })
}

fn decode_row(row: &neo4rs::Row) -> MetagraphResult<Row> {
    row.to::<BTreeMap<String, Value>>()
        .map(Row::new)
        .map_err(|e| MetagraphError::decode(e.to_string()))
}

/// Timestamps are sent as RFC 3339 strings; statements wrap them in `datetime()`.
fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Boolean(b) => BoltType::from(*b),
        Value::Integer(i) => BoltType::from(*i),
        Value::Float(x) => BoltType::from(*x),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::Timestamp(ts) => BoltType::from(ts.to_rfc3339()),
        Value::List(items) => BoltType::List(BoltList {
            value: items.iter().map(to_bolt).collect(),
        }),
        Value::Map(map) => BoltType::Map(BoltMap {
            value: map
                .iter()
                .map(|(k, v)| (BoltString::from(k.as_str()), to_bolt(v)))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_bolt_keeps_shape() {
        let value = Value::List(vec![Value::Integer(1), Value::from("a"), Value::Null]);
        match to_bolt(&value) {
            BoltType::List(list) => {
                assert_eq!(list.value.len(), 3);
                assert!(matches!(list.value[0], BoltType::Integer(_)));
                assert!(matches!(list.value[1], BoltType::String(_)));
                assert!(matches!(list.value[2], BoltType::Null(_)));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_sent_as_string() {
        let ts = chrono::DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert!(matches!(to_bolt(&Value::Timestamp(ts)), BoltType::String(_)));
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let err = bounded(Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, MetagraphError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, MetagraphError::EngineTimeout(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.database, "neo4j");
        assert_eq!(config.statement_timeout(), Some(Duration::from_secs(30)));
    }
}
