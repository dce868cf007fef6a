//! Neo4j backend implementation over the Bolt protocol (neo4rs).
//!
//! ```ignore
//! use missionindex::graph::backends::neo4j::Neo4jConnector;
//! use missionindex::graph::{QueryExt, SessionProvider};
//!
//! let sessions = SessionProvider::new(Neo4jConnector::new(&config));
//! let count = sessions
//!     .with_session(|session| async move {
//!         let rows = session.query("MATCH (m:Mission) RETURN count(m) AS n").fetch_all().await?;
//!         Ok(rows.len())
//!     })
//!     .await?;
//! ```
//!
//! Parameters travel as typed Bolt values, never interpolated into the
//! Cypher text. Result rows are converted to JSON, so queries should project
//! nodes into maps (`{id: id(n), name: n.name}`) rather than return raw nodes.

use std::collections::HashMap;

use async_stream::try_stream;
use async_trait::async_trait;
use neo4rs::{BoltMap, BoltNull, BoltString, BoltType, ConfigBuilder, Graph, Txn};
use serde_json::Value as JsonValue;
use tokio::sync::{Mutex, OnceCell};

use crate::config::{Config, Neo4jConfig, SessionConfig};
use crate::error::AppError;
use crate::graph::row::{Params, Row, RowStream};
use crate::graph::traits::{Connection, Connector, CypherExecutor, GraphClient, Transaction};

/// Opens Neo4j connections from configuration.
///
/// By default every session gets its own driver, which is dropped when the
/// session closes. With `session.reuse_connection` a single driver (and its
/// internal pool) is shared by all sessions.
pub struct Neo4jConnector {
    neo4j: Neo4jConfig,
    session: SessionConfig,
    shared: OnceCell<Graph>,
}

impl Neo4jConnector {
    /// Creates a connector; no connection is made until a session opens.
    pub fn new(config: &Config) -> Self {
        Self {
            neo4j: config.neo4j.clone(),
            session: config.session.clone(),
            shared: OnceCell::new(),
        }
    }

    /// Opens a client that can also begin explicit transactions.
    pub async fn open_client(&self) -> Result<Neo4jConnection, AppError> {
        if self.session.reuse_connection {
            let graph = self
                .shared
                .get_or_try_init(|| self.open_graph())
                .await?
                .clone();
            Ok(Neo4jConnection::new(graph, true))
        } else {
            Ok(Neo4jConnection::new(self.open_graph().await?, false))
        }
    }

    async fn open_graph(&self) -> Result<Graph, AppError> {
        tracing::debug!(uri = %self.neo4j.uri, user = %self.neo4j.user, "connecting to Neo4j");
        let mut builder = ConfigBuilder::default()
            .uri(self.neo4j.uri.as_str())
            .user(self.neo4j.user.as_str())
            .password(self.neo4j.password.as_deref().unwrap_or(""))
            .max_connections(self.session.max_connections);
        if let Some(database) = &self.neo4j.database {
            builder = builder.db(database.as_str());
        }
        let graph = Graph::connect(builder.build()?).await?;
        Ok(graph)
    }
}

#[async_trait]
impl Connector for Neo4jConnector {
    async fn connect(&self) -> Result<Box<dyn Connection>, AppError> {
        Ok(Box::new(self.open_client().await?))
    }
}

/// A Neo4j driver handle used by one session.
///
/// [`Connection::close`] drops the handle; later queries fail. A per-session
/// driver is released with it, while a shared driver stays with the connector.
pub struct Neo4jConnection {
    graph: Mutex<Option<Graph>>,
    shared: bool,
}

impl Neo4jConnection {
    fn new(graph: Graph, shared: bool) -> Self {
        Self {
            graph: Mutex::new(Some(graph)),
            shared,
        }
    }

    async fn graph(&self) -> Result<Graph, AppError> {
        self.graph.lock().await.clone().ok_or_else(closed)
    }
}

fn closed() -> AppError {
    AppError::Internal("connection already closed".into())
}

#[async_trait]
impl CypherExecutor for Neo4jConnection {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let mut stream = self.graph().await?.execute(bolt_query(cypher, params)).await?;
        let cypher = cypher.to_string();

        Ok(Box::pin(try_stream! {
            while let Some(row) = stream.next().await.map_err(AppError::from)? {
                yield convert_row(&row, &cypher)?;
            }
        }))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.graph().await?.run(bolt_query(cypher, params)).await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for Neo4jConnection {
    async fn close(&self) -> Result<(), AppError> {
        let graph = self.graph.lock().await.take().ok_or_else(closed)?;
        if self.shared {
            tracing::trace!("returning shared Neo4j driver");
        } else {
            tracing::trace!("releasing Neo4j driver");
        }
        drop(graph);
        Ok(())
    }
}

#[async_trait]
impl GraphClient for Neo4jConnection {
    type Tx<'a> = Neo4jTransaction;

    async fn begin(&self) -> Result<Self::Tx<'_>, AppError> {
        let txn = self.graph().await?.start_txn().await?;
        Ok(Neo4jTransaction {
            txn: Mutex::new(Some(txn)),
        })
    }
}

/// An explicit Neo4j transaction.
///
/// Must be committed or rolled back; dropping it unfinished leaves the
/// server to roll it back when the connection returns to the pool.
pub struct Neo4jTransaction {
    txn: Mutex<Option<Txn>>,
}

impl Neo4jTransaction {
    fn finished() -> AppError {
        AppError::Internal("transaction already finished".into())
    }
}

#[async_trait]
impl CypherExecutor for Neo4jTransaction {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        let mut guard = self.txn.lock().await;
        let txn = guard.as_mut().ok_or_else(Self::finished)?;

        // Results are buffered: the stream cannot outlive the lock.
        let mut stream = txn.execute(bolt_query(cypher, params)).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(txn.handle()).await? {
            rows.push(convert_row(&row, cypher));
        }
        Ok(Box::pin(futures::stream::iter(rows)))
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        let mut guard = self.txn.lock().await;
        let txn = guard.as_mut().ok_or_else(Self::finished)?;
        txn.run(bolt_query(cypher, params)).await?;
        Ok(())
    }
}

#[async_trait]
impl Transaction for Neo4jTransaction {
    async fn commit(self) -> Result<(), AppError> {
        let txn = self.txn.lock().await.take().ok_or_else(Self::finished)?;
        txn.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), AppError> {
        let txn = self.txn.lock().await.take().ok_or_else(Self::finished)?;
        txn.rollback().await?;
        Ok(())
    }
}

impl Drop for Neo4jTransaction {
    fn drop(&mut self) {
        if self.txn.get_mut().is_some() {
            tracing::warn!("Neo4jTransaction dropped without commit or rollback");
        }
    }
}

/// Builds a Bolt query with every JSON parameter converted to a Bolt value.
fn bolt_query(cypher: &str, params: Params) -> neo4rs::Query {
    params
        .into_iter()
        .fold(neo4rs::query(cypher), |query, (name, value)| {
            query.param(&name, json_to_bolt(value))
        })
}

/// Converts a JSON parameter value into its Bolt equivalent.
///
/// Integral numbers stay integers so that `id(n) = $id` comparisons match.
fn json_to_bolt(value: JsonValue) -> BoltType {
    match value {
        JsonValue::Null => BoltType::Null(BoltNull),
        JsonValue::Bool(b) => b.into(),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        JsonValue::String(s) => s.into(),
        JsonValue::Array(items) => {
            BoltType::from(items.into_iter().map(json_to_bolt).collect::<Vec<BoltType>>())
        }
        JsonValue::Object(map) => BoltType::Map(BoltMap::from_iter(
            map.into_iter()
                .map(|(k, v)| (BoltString::from(k), json_to_bolt(v))),
        )),
    }
}

/// Converts a Bolt row into a JSON row keyed by column name.
fn convert_row(row: &neo4rs::Row, cypher: &str) -> Result<Row, AppError> {
    row.to::<HashMap<String, JsonValue>>()
        .map(Row::new)
        .map_err(|e| AppError::Query {
            message: format!("failed to decode row: {}", e),
            query: cypher.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_bolt_scalars() {
        assert_eq!(json_to_bolt(json!(42)), BoltType::from(42_i64));
        assert_eq!(json_to_bolt(json!("Save Earth")), BoltType::from("Save Earth"));
        assert_eq!(json_to_bolt(json!(true)), BoltType::from(true));
        assert_eq!(json_to_bolt(JsonValue::Null), BoltType::Null(BoltNull));
    }

    #[test]
    fn test_json_to_bolt_float_stays_float() {
        assert_eq!(json_to_bolt(json!(7.5)), BoltType::from(7.5_f64));
    }

    #[test]
    fn test_json_to_bolt_nested() {
        let bolt = json_to_bolt(json!({"ids": [1, 2]}));
        match bolt {
            BoltType::Map(map) => assert_eq!(map.value.len(), 1),
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_connector_defers_connection() {
        // Constructing a connector must not touch the network.
        let connector = Neo4jConnector::new(&Config::default());
        assert!(connector.shared.get().is_none());
    }
}
