//! Backend implementations for graph databases.
//!
//! Each backend implements the core traits from [`crate::graph`]:
//!
//! - [`CypherExecutor`](crate::graph::CypherExecutor) and
//!   [`Connection`](crate::graph::Connection) for the per-session handle
//! - [`Connector`](crate::graph::Connector) to open those handles
//! - [`GraphClient`](crate::graph::GraphClient) and
//!   [`Transaction`](crate::graph::Transaction) for explicit transactions
//!
//! | Backend | Module |
//! |---------|--------|
//! | Neo4j (Bolt) | [`neo4j`] |

pub mod neo4j;
