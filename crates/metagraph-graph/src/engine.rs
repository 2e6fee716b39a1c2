//! Storage-engine capability the store is written against.
//!
//! [`GraphClient`](crate::GraphClient) implements it over Neo4j; tests use a
//! scripted in-memory engine.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use metagraph_core::{MetagraphError, MetagraphResult, Statement, Value};

/// One result row, already decoded to tagged values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(BTreeMap<String, Value>);

impl Row {
    pub fn new(columns: BTreeMap<String, Value>) -> Self {
        Self(columns)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Remove and return a column, `Null` if absent.
    pub fn take(&mut self, column: &str) -> Value {
        self.0.remove(column).unwrap_or_default()
    }

    pub fn string(&self, column: &str) -> MetagraphResult<String> {
        self.opt_string(column)?
            .ok_or_else(|| MetagraphError::decode(format!("column '{column}' is null")))
    }

    pub fn opt_string(&self, column: &str) -> MetagraphResult<Option<String>> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(column, "string", other)),
        }
    }

    pub fn int(&self, column: &str) -> MetagraphResult<i64> {
        match self.get(column) {
            Some(Value::Integer(i)) => Ok(*i),
            Some(other) => Err(self.mismatch(column, "integer", other)),
            None => Err(MetagraphError::decode(format!("missing column '{column}'"))),
        }
    }

    pub fn bool_or(&self, column: &str, default: bool) -> MetagraphResult<bool> {
        match self.get(column) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_bool()
                .ok_or_else(|| self.mismatch(column, "boolean", value)),
        }
    }

    pub fn timestamp(&self, column: &str) -> MetagraphResult<DateTime<Utc>> {
        match self.get(column) {
            Some(value) => value
                .as_timestamp()
                .ok_or_else(|| self.mismatch(column, "timestamp", value)),
            None => Err(MetagraphError::decode(format!("missing column '{column}'"))),
        }
    }

    /// A list column whose items are all strings.
    pub fn strings(&self, column: &str) -> MetagraphResult<Vec<String>> {
        let Some(value) = self.get(column) else {
            return Err(MetagraphError::decode(format!("missing column '{column}'")));
        };
        let items = value
            .as_list()
            .ok_or_else(|| self.mismatch(column, "list", value))?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.mismatch(column, "list of strings", item))
            })
            .collect()
    }

    /// A map column, e.g. `properties(n)`.
    pub fn map(&mut self, column: &str) -> MetagraphResult<BTreeMap<String, Value>> {
        let value = self.take(column);
        let got = value.type_name();
        value.into_map().ok_or_else(|| {
            MetagraphError::decode(format!("column '{column}': expected map, got {got}"))
        })
    }

    fn mismatch(&self, column: &str, expected: &str, got: &Value) -> MetagraphError {
        MetagraphError::decode(format!(
            "column '{column}': expected {expected}, got {}",
            got.type_name()
        ))
    }
}

impl From<BTreeMap<String, Value>> for Row {
    fn from(columns: BTreeMap<String, Value>) -> Self {
        Self(columns)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Runs parameterised statements and opens transactions.
#[async_trait]
pub trait GraphEngine: Send + Sync {
    type Transaction: GraphTransaction;

    /// Run one statement in its own auto-commit transaction.
    async fn run(&self, statement: Statement) -> MetagraphResult<Vec<Row>>;

    /// Open an explicit transaction.
    async fn begin(&self) -> MetagraphResult<Self::Transaction>;
}

/// An open engine transaction. Dropping it without commit discards its writes.
#[async_trait]
pub trait GraphTransaction: Send {
    async fn run(&mut self, statement: Statement) -> MetagraphResult<Vec<Row>>;

    async fn commit(self) -> MetagraphResult<()>;

    async fn rollback(self) -> MetagraphResult<()>;
}

/// Commit `txn` when `outcome` succeeded, roll it back otherwise.
///
/// The outcome's error wins over a failed rollback.
pub async fn finish<Tx, T>(txn: Tx, outcome: MetagraphResult<T>) -> MetagraphResult<T>
where
    Tx: GraphTransaction,
    T: Send,
{
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "rolling back transaction");
            if let Err(rollback_err) = txn.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
