//! Graph abstraction layer for backend-agnostic database access.
//!
//! # Architecture
//!
//! - [`CypherExecutor`] - Execute Cypher queries (required for all graph backends)
//! - [`Transaction`] - Transaction lifecycle (commit/rollback)
//! - [`GraphClient`] - An executor that can begin explicit transactions
//! - [`Connection`] / [`Connector`] - Connection acquisition and release
//! - [`SessionProvider`] - Scoped sessions, one per unit of work
//!
//! # Usage
//!
//! ```ignore
//! use missionindex::graph::{QueryExt, SessionProvider};
//! use missionindex::graph::backends::neo4j::Neo4jConnector;
//!
//! let sessions = SessionProvider::new(Neo4jConnector::new(&config));
//!
//! let rows = sessions
//!     .with_session(|session| async move {
//!         session
//!             .query("MATCH (m:Mission) WHERE id(m) = $id RETURN m.name AS name")
//!             .param("id", mission_id)
//!             .fetch_all()
//!             .await
//!     })
//!     .await?;
//! ```

mod query;
mod row;
mod session;
mod traits;

pub mod backends;

#[cfg(test)]
pub(crate) mod mock;

// Re-export core types
pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use session::{Session, SessionProvider};
pub use traits::{Connection, Connector, CypherExecutor, GraphClient, Transaction};
