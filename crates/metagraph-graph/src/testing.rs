//! Scripted in-memory engine for store tests.
//!
//! Every call is recorded, so tests can assert on the statements issued and
//! on transaction boundaries. Rows come from a handler closure that sees
//! each statement.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use metagraph_core::{MetagraphResult, Statement, Value};

use crate::engine::{GraphEngine, GraphTransaction, Row};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Run { statement: Statement, in_txn: bool },
    Begin,
    Commit,
    Rollback,
}

type Handler = Box<dyn Fn(&Statement) -> MetagraphResult<Vec<Row>> + Send + Sync>;

struct Inner {
    handler: Handler,
    events: Mutex<Vec<Event>>,
}

#[derive(Clone)]
pub struct FakeEngine {
    inner: Arc<Inner>,
}

impl FakeEngine {
    pub fn new(
        handler: impl Fn(&Statement) -> MetagraphResult<Vec<Row>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                handler: Box::new(handler),
                events: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Engine that answers every statement with no rows.
    pub fn empty() -> Self {
        Self::new(|_| Ok(Vec::new()))
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.events.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Run { statement, .. } => Some(statement),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) {
        self.inner.events.lock().unwrap().push(event);
    }

    fn answer(&self, statement: Statement, in_txn: bool) -> MetagraphResult<Vec<Row>> {
        let rows = (self.inner.handler)(&statement);
        self.record(Event::Run { statement, in_txn });
        rows
    }
}

#[async_trait]
impl GraphEngine for FakeEngine {
    type Transaction = FakeTxn;

    async fn run(&self, statement: Statement) -> MetagraphResult<Vec<Row>> {
        self.answer(statement, false)
    }

    async fn begin(&self) -> MetagraphResult<FakeTxn> {
        self.record(Event::Begin);
        Ok(FakeTxn {
            engine: self.clone(),
        })
    }
}

pub struct FakeTxn {
    engine: FakeEngine,
}

#[async_trait]
impl GraphTransaction for FakeTxn {
    async fn run(&mut self, statement: Statement) -> MetagraphResult<Vec<Row>> {
        self.engine.answer(statement, true)
    }

    async fn commit(self) -> MetagraphResult<()> {
        self.engine.record(Event::Commit);
        Ok(())
    }

    async fn rollback(self) -> MetagraphResult<()> {
        self.engine.record(Event::Rollback);
        Ok(())
    }
}

/// Build a row from `(column, value)` pairs.
pub fn row<const N: usize>(columns: [(&str, Value); N]) -> Row {
    columns.into_iter().collect()
}
