//! Scoped graph sessions.
//!
//! Every repository operation runs inside [`SessionProvider::with_session`]:
//! one connection is opened, handed to the work closure as a [`Session`], and
//! closed afterwards on every exit path.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::graph::row::{Params, RowStream};
use crate::graph::traits::{Connection, Connector, CypherExecutor};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A single logical unit of work against the store.
///
/// Cheap to clone; all clones share the connection. The connection is
/// released by the provider once the work closure has finished.
#[derive(Clone)]
pub struct Session {
    id: u64,
    conn: Arc<dyn Connection>,
}

impl Session {
    /// Session id, unique within the process.
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[async_trait]
impl CypherExecutor for Session {
    async fn execute_cypher(
        &self,
        cypher: &str,
        params: Params,
    ) -> Result<RowStream<'_>, AppError> {
        self.conn.execute_cypher(cypher, params).await
    }

    async fn run_cypher(&self, cypher: &str, params: Params) -> Result<(), AppError> {
        self.conn.run_cypher(cypher, params).await
    }
}

/// Opens and releases sessions through a [`Connector`].
#[derive(Clone)]
pub struct SessionProvider {
    connector: Arc<dyn Connector>,
}

impl SessionProvider {
    /// Creates a provider around the given connector.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
        }
    }

    /// Runs `work` with a freshly opened session and always releases it.
    ///
    /// The result of `work` is returned unchanged. A failure while closing
    /// is returned only when `work` itself succeeded; otherwise it is logged
    /// and the original error wins.
    ///
    /// ```ignore
    /// let names = sessions
    ///     .with_session(|session| async move {
    ///         let rows = session.query("MATCH (m:Mission) RETURN m.name AS name").fetch_all().await?;
    ///         rows.iter().map(|r| r.get::<String>("name")).collect::<Result<Vec<_>, _>>()
    ///     })
    ///     .await?;
    /// ```
    pub async fn with_session<F, Fut, T>(&self, work: F) -> Result<T, AppError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let conn: Arc<dyn Connection> = Arc::from(self.connector.connect().await?);
        let session = Session {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            conn,
        };
        let session_id = session.id;
        let release = session.conn.clone();
        tracing::debug!(session = session_id, "session opened");

        let result = work(session).await;
        let closed = release.close().await;

        match (result, closed) {
            (Ok(value), Ok(())) => {
                tracing::debug!(session = session_id, "session closed");
                Ok(value)
            }
            (Ok(_), Err(close_err)) => {
                tracing::warn!(session = session_id, error = %close_err, "failed to close session");
                Err(close_err)
            }
            (Err(work_err), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(
                        session = session_id,
                        error = %close_err,
                        "failed to close session after error"
                    );
                }
                tracing::debug!(session = session_id, error = %work_err, "session closed with error");
                Err(work_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::ScriptedConnector;
    use crate::graph::QueryExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_session_released_on_success() {
        let connector = ScriptedConnector::new().respond(vec![[("n", json!(1))].into()]);
        let sessions = SessionProvider::new(connector.clone());

        let n: i64 = sessions
            .with_session(|session| async move {
                let row = session.query("RETURN 1 AS n").fetch_one().await?;
                row.map(|r| r.get("n")).transpose().map(|n| n.unwrap_or(0))
            })
            .await
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_session_released_on_failure_and_error_propagates() {
        let connector = ScriptedConnector::new().fail_with("store unavailable");
        let sessions = SessionProvider::new(connector.clone());

        let result: Result<(), AppError> = sessions
            .with_session(|session| async move { session.query("RETURN 1").run().await })
            .await;

        match result {
            Err(AppError::Query { message, .. }) => assert_eq!(message, "store unavailable"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_work_error() {
        let connector = ScriptedConnector::new().fail_close();
        let sessions = SessionProvider::new(connector.clone());

        let result: Result<(), AppError> = sessions
            .with_session(|_session| async move { Err(AppError::Internal("work failed".into())) })
            .await;

        assert!(matches!(result, Err(AppError::Internal(ref m)) if m == "work failed"));
    }

    #[tokio::test]
    async fn test_close_failure_after_success_is_reported() {
        let connector = ScriptedConnector::new().fail_close();
        let sessions = SessionProvider::new(connector.clone());

        let result = sessions.with_session(|_session| async move { Ok(7) }).await;

        assert!(result.is_err());
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_each_call_opens_fresh_session() {
        let connector = ScriptedConnector::new();
        let sessions = SessionProvider::new(connector.clone());

        let first = sessions.with_session(|s| async move { Ok(s.id()) }).await.unwrap();
        let second = sessions.with_session(|s| async move { Ok(s.id()) }).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(connector.opened(), 2);
        assert_eq!(connector.closed(), 2);
    }
}
