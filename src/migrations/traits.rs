//! Migration trait and registry.

use futures::future::BoxFuture;

use crate::error::AppError;
use crate::graph::{CypherExecutor, GraphClient, Transaction as _};

/// A versioned, idempotent schema migration.
///
/// Uses BoxFuture to avoid `'static` requirements from `#[async_trait]`.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    fn version(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up<'a>(&'a self, ctx: &'a (dyn CypherExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>>;
}

/// Ordered set of migrations.
pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Iterate over migrations.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Highest version known to this register.
    pub fn latest_version(&self) -> u32 {
        self.iter().map(|m| m.version()).max().unwrap_or(0)
    }

    /// Migrations above `current_version`, in registration order.
    pub fn pending(&self, current_version: u32) -> impl Iterator<Item = &dyn Migration> {
        self.iter().filter(move |m| m.version() > current_version)
    }

    /// Applies one migration in its own transaction.
    ///
    /// The transaction is rolled back and the error returned when `up` fails.
    pub async fn apply<C>(client: &C, migration: &dyn Migration) -> Result<(), AppError>
    where
        C: GraphClient,
    {
        tracing::info!(
            "Applying migration {} (v{}): {}",
            migration.id(),
            migration.version(),
            migration.description()
        );

        let txn = client.begin().await?;
        match migration.up(&txn).await {
            Ok(()) => txn.commit().await,
            Err(e) => {
                tracing::error!("Migration {} failed, rolling back: {}", migration.id(), e);
                txn.rollback().await?;
                Err(e)
            }
        }
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}
