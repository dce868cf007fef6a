//! Init command handler.

use color_eyre::Result;

use crate::config::Config;
use crate::graph::backends::neo4j::Neo4jConnector;
use crate::migrations::run_migrations;

use super::App;

impl App {
    /// Run the init command to apply schema migrations.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load()?;

        tracing::info!("Connecting to Neo4j at {}", config.neo4j.uri);
        let client = Neo4jConnector::new(&config)
            .open_client()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;

        tracing::info!("Running migrations...");
        let result = run_migrations(&client)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Migration failed: {}", e))?;

        if result.applied_migrations.is_empty() {
            tracing::info!(
                "Database already at v{}, no migrations needed",
                result.current_version
            );
        } else {
            tracing::info!(
                "Migrations complete: v{} -> v{}, applied: {:?}",
                result.previous_version,
                result.current_version,
                result.applied_migrations
            );
        }

        super::print_json(&result)
    }
}
