//! Application context providing dependency injection root.

use std::sync::Arc;

use crate::config::Config;
use crate::di::Context as ContextDerive;
use crate::graph::backends::neo4j::Neo4jConnector;
use crate::graph::SessionProvider;
use crate::marker::LocalVoteMarker;

/// Root application context for dependency injection.
///
/// The Context holds all shared dependencies and uses `#[derive(Context)]`
/// to generate `FromRef` implementations for each field, enabling
/// compile-time dependency resolution.
#[derive(ContextDerive, Clone)]
pub struct Context {
    /// Opens one graph session per repository operation.
    pub sessions: SessionProvider,
    /// Application configuration.
    pub config: Arc<Config>,
    /// Profile-local vote marker.
    pub marker: LocalVoteMarker,
}

impl Context {
    /// Creates a context with explicit dependencies.
    pub fn new(sessions: SessionProvider, config: Config, marker: LocalVoteMarker) -> Self {
        Self {
            sessions,
            config: Arc::new(config),
            marker,
        }
    }

    /// Creates the production context: Neo4j sessions and the configured marker.
    ///
    /// No connection is opened until the first session.
    pub fn from_config(config: Config) -> Self {
        let sessions = SessionProvider::new(Neo4jConnector::new(&config));
        let marker = LocalVoteMarker::from_config(&config.marker);
        Self::new(sessions, config, marker)
    }

    /// Resolves any `FromContext` type, e.g. a repository or service.
    pub fn resolve<T: crate::di::FromRef<Self>>(&self) -> T {
        T::from_ref(self)
    }
}
