//! Migration runner with version tracking on a `:SchemaVersion` node.

use crate::error::AppError;
use crate::graph::{GraphClient, QueryExt};
use crate::migrations::{M001Schema, Register};

/// Result of running migrations.
#[derive(Debug, Clone, serde::Serialize)]
pub struct MigrationResult {
    /// Schema version before migrations ran.
    pub previous_version: u32,
    /// Schema version after migrations ran.
    pub current_version: u32,
    /// List of migration IDs that were applied.
    pub applied_migrations: Vec<String>,
}

/// All migrations in version order.
pub fn create_register() -> Register {
    Register::new().register(M001Schema)
}

/// Run all pending migrations.
///
/// Only migrations with a version higher than the stored schema version are
/// applied. Each migration runs in its own transaction, and the stored
/// version is bumped right after that transaction commits, so a later
/// failure keeps the record of earlier migrations.
pub async fn run_migrations<C: GraphClient>(client: &C) -> Result<MigrationResult, AppError> {
    run_register(client, &create_register()).await
}

pub(crate) async fn run_register<C: GraphClient>(
    client: &C,
    register: &Register,
) -> Result<MigrationResult, AppError> {
    ensure_schema_version(client).await?;
    let previous_version = get_schema_version(client).await?;

    let mut current_version = previous_version;
    let mut applied_migrations = Vec::new();
    for migration in register.pending(previous_version) {
        Register::apply(client, migration).await?;
        update_schema_version(client, migration.version(), migration.id()).await?;
        current_version = migration.version();
        applied_migrations.push(migration.id().to_string());
    }

    Ok(MigrationResult {
        previous_version,
        current_version,
        applied_migrations,
    })
}

async fn ensure_schema_version<C: GraphClient>(client: &C) -> Result<(), AppError> {
    client
        .query(
            "MERGE (sv:SchemaVersion {id: 1})
               ON CREATE SET sv.version = 0, sv.applied_migrations = [], sv.createdAt = $now",
        )
        .param("now", chrono::Utc::now().to_rfc3339())
        .run()
        .await
}

/// Returns 0 for a fresh database.
async fn get_schema_version<C: GraphClient>(client: &C) -> Result<u32, AppError> {
    let row = client
        .query("MATCH (sv:SchemaVersion {id: 1}) RETURN sv.version AS version")
        .fetch_one()
        .await?;

    let stored = match row {
        Some(row) => row.get_opt::<i64>("version")?.unwrap_or(0),
        None => 0,
    };
    u32::try_from(stored)
        .map_err(|_| AppError::Internal(format!("invalid stored schema version: {}", stored)))
}

async fn update_schema_version<C: GraphClient>(
    client: &C,
    version: u32,
    migration_id: &str,
) -> Result<(), AppError> {
    client
        .query(
            "MATCH (sv:SchemaVersion {id: 1})
             SET sv.version = $version,
                 sv.applied_migrations = sv.applied_migrations + [$migration_id],
                 sv.lastAppliedAt = $now",
        )
        .param("version", version as i64)
        .param("migration_id", migration_id)
        .param("now", chrono::Utc::now().to_rfc3339())
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::ScriptedConnector;
    use crate::graph::{CypherExecutor, Query, Row};
    use crate::migrations::Migration;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use serde_json::json;

    fn version_row(version: i64) -> Row {
        [("version", json!(version))].into()
    }

    #[tokio::test]
    async fn test_fresh_database_applies_schema() {
        let client = ScriptedConnector::new()
            .respond(vec![])
            .respond(vec![version_row(0)]);

        let result = run_migrations(&client).await.unwrap();

        assert_eq!(result.previous_version, 0);
        assert_eq!(result.current_version, 1);
        assert_eq!(result.applied_migrations, vec!["m001_schema"]);
        assert_eq!(client.commits(), 1);

        let calls = client.calls();
        assert!(calls.iter().any(|(c, _)| c.contains("user_email_unique")));
        let (last, params) = calls.last().unwrap();
        assert!(last.contains("SET sv.version = $version"));
        assert_eq!(params.get("version"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_up_to_date_database_is_untouched() {
        let client = ScriptedConnector::new()
            .respond(vec![])
            .respond(vec![version_row(1)]);

        let result = run_migrations(&client).await.unwrap();

        assert!(result.applied_migrations.is_empty());
        assert_eq!(result.current_version, 1);
        assert_eq!(client.commits(), 0);
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_migration_rolls_back() {
        let client = ScriptedConnector::new()
            .respond(vec![])
            .respond(vec![version_row(0)])
            .fail_with("constraint already exists with different shape");

        let err = run_migrations(&client).await.unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(client.rollbacks(), 1);
        assert_eq!(client.commits(), 0);
        assert!(!client
            .calls()
            .iter()
            .any(|(_, params)| params.contains_key("version")));
    }

    struct Step {
        id: &'static str,
        version: u32,
    }

    impl Migration for Step {
        fn id(&self) -> &'static str {
            self.id
        }

        fn version(&self) -> u32 {
            self.version
        }

        fn description(&self) -> &'static str {
            "test step"
        }

        fn up<'a>(
            &'a self,
            ctx: &'a (dyn CypherExecutor + Sync),
        ) -> BoxFuture<'a, Result<(), AppError>> {
            async move { Query::new(ctx, "CREATE (:Step)").run().await }.boxed()
        }
    }

    #[tokio::test]
    async fn test_committed_migrations_are_recorded_before_a_later_failure() {
        let register = Register::new()
            .register(Step { id: "m001_first", version: 1 })
            .register(Step { id: "m002_second", version: 2 });
        let client = ScriptedConnector::new()
            .respond(vec![])
            .respond(vec![version_row(0)])
            .respond(vec![])
            .respond(vec![])
            .fail_with("disk full");

        let err = run_register(&client, &register).await.unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(client.commits(), 1);
        assert_eq!(client.rollbacks(), 1);
        let recorded: Vec<_> = client
            .calls()
            .into_iter()
            .filter_map(|(_, params)| params.get("version").cloned())
            .collect();
        assert_eq!(recorded, vec![json!(1)]);
    }

    #[tokio::test]
    async fn test_negative_stored_version_is_rejected() {
        let client = ScriptedConnector::new()
            .respond(vec![])
            .respond(vec![version_row(-3)]);

        let err = run_migrations(&client).await.unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(client.commits(), 0);
    }
}
