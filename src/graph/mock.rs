//! Scripted in-process connector for unit tests.
//!
//! Responses are consumed in order, one per executed statement. Every
//! statement and its parameters are recorded for assertions.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{Connection, Connector, CypherExecutor, GraphClient, Transaction};

#[derive(Default)]
struct State {
    responses: Mutex<VecDeque<Result<Vec<Row>, String>>>,
    calls: Mutex<Vec<(String, Params)>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    fail_close: AtomicBool,
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<State>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the rows returned by the next statement.
    pub fn respond(self, rows: Vec<Row>) -> Self {
        self.state.responses.lock().unwrap().push_back(Ok(rows));
        self
    }

    /// Queues a store failure for the next statement.
    pub fn fail_with(self, message: &str) -> Self {
        self.state
            .responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Makes every `close` fail.
    pub fn fail_close(self) -> Self {
        self.state.fail_close.store(true, Ordering::SeqCst);
        self
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.state.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.state.rollbacks.load(Ordering::SeqCst)
    }

    /// All recorded (cypher, params) pairs in execution order.
    pub fn calls(&self) -> Vec<(String, Params)> {
        self.state.calls.lock().unwrap().clone()
    }

    fn next(&self, cypher: &str, params: Params) -> Result<Vec<Row>, AppError> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push((cypher.to_string(), params));
        match self.state.responses.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(AppError::Query {
                message,
                query: cypher.to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl CypherExecutor for ScriptedConnector {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let rows = self.next(cypher, params)?;
        Ok(Box::pin(futures::stream::iter(rows.into_iter().map(Ok))))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.next(cypher, params).map(|_| ())
    }
}

#[async_trait]
impl Connection for ScriptedConnector {
    async fn close(&self) -> Result<(), AppError> {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_close.load(Ordering::SeqCst) {
            return Err(AppError::Internal("close failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, AppError> {
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl GraphClient for ScriptedConnector {
    type Tx<'a> = ScriptedTransaction;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        Ok(ScriptedTransaction {
            inner: self.clone(),
        })
    }
}

/// Transaction sharing the connector's script; counts commits and rollbacks.
pub struct ScriptedTransaction {
    inner: ScriptedConnector,
}

#[async_trait]
impl CypherExecutor for ScriptedTransaction {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        self.inner.execute_cypher(cypher, params).await
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.inner.run_cypher(cypher, params).await
    }
}

#[async_trait]
impl Transaction for ScriptedTransaction {
    async fn commit(self) -> Result<(), AppError> {
        self.inner.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        self.inner.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
