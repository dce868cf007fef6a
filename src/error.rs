//! Application error types.

use thiserror::Error;

/// Application-level errors for Mission Index.
///
/// Lookups that find nothing and writes whose anchor node is missing are not
/// errors: repositories return `None` for those. Store failures are carried
/// unchanged in [`AppError::Store`]; rows the store returns in an unexpected
/// shape surface as [`AppError::Query`].
#[derive(Error, Debug)]
pub enum AppError {
    // Neo4j errors
    #[error("Neo4j error: {0}")]
    Store(#[from] neo4rs::Error),

    #[error("Neo4j query error: {message}")]
    Query { message: String, query: String },

    // Boundary errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Local profile errors
    #[error("Vote marker error: {0}")]
    Marker(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Store(_) => "STORE_ERROR",
            AppError::Query { .. } => "QUERY_ERROR",
            AppError::Validation(_) => "INVALID_INPUT",
            AppError::Marker(_) => "MARKER_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true when the error came from the graph store.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, AppError::Store(_) | AppError::Query { .. })
    }
}
