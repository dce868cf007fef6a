//! Core traits for graph database abstraction.
//!
//! - [`CypherExecutor`] - Run Cypher against a store (required for all backends)
//! - [`Transaction`] - Commit/rollback of an explicit transaction
//! - [`GraphClient`] - An executor that can also begin transactions
//! - [`Connection`] / [`Connector`] - Per-session acquisition and release

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};

/// Executes Cypher queries against a graph database.
#[async_trait]
pub trait CypherExecutor: Send + Sync {
    /// Executes a Cypher query and returns a stream of result rows.
    ///
    /// Use this for queries that return data (MATCH ... RETURN).
    async fn execute_cypher(&self, cypher: &str, params: Params)
        -> Result<RowStream<'_>, AppError>;

    /// Executes a Cypher query without returning results.
    ///
    /// Use this for mutations (CREATE, MERGE, SET) and schema statements.
    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError>;
}

/// Transaction lifecycle management.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Commits the transaction, making all changes permanent.
    async fn commit(self) -> Result<(), AppError>;

    /// Rolls back the transaction, discarding all changes.
    async fn rollback(self) -> Result<(), AppError>;
}

/// A graph database client that can begin transactions.
///
/// Queries issued directly on the client auto-commit; explicit
/// transactions come from [`begin`](GraphClient::begin).
#[async_trait]
pub trait GraphClient: CypherExecutor {
    /// The transaction type returned by this client.
    type Tx<'a>: Transaction + CypherExecutor
    where
        Self: 'a;

    /// Begins a new transaction.
    ///
    /// ```ignore
    /// let txn = client.begin().await?;
    /// txn.run_cypher("CREATE INDEX mission_name IF NOT EXISTS FOR (m:Mission) ON (m.name)", params).await?;
    /// txn.commit().await?;
    /// ```
    async fn begin(&self) -> Result<Self::Tx<'_>, AppError>;
}

/// An open connection owned by exactly one session.
#[async_trait]
pub trait Connection: CypherExecutor {
    /// Releases the connection. Called once, when the session ends.
    async fn close(&self) -> Result<(), AppError>;
}

/// Opens connections for the session provider.
///
/// Implementations read connection parameters when `connect` is called,
/// so configuration changes apply to the next session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a new connection to the store.
    async fn connect(&self) -> Result<Box<dyn Connection>, AppError>;
}
