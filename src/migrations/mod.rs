//! Schema migrations for Neo4j with version tracking.
//!
//! Migrations are:
//! - **Idempotent**: Use `IF NOT EXISTS` and `MERGE` - required for safe retries
//! - **Additive-only**: Never delete properties, nodes, relationships, or constraints
//! - **Forward-only**: No rollback support - create compensating migrations if needed
//! - **Version-tracked**: Schema version stored on the `:SchemaVersion {id: 1}` node
//! - **Explicit**: Applied by `missionindex init`

mod m001_schema;
mod runner;
mod traits;

pub use m001_schema::M001Schema;
pub use runner::{create_register, run_migrations, MigrationResult};
pub use traits::{Migration, Register};
