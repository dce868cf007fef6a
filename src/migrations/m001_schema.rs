//! Schema migration - constraints and lookup indexes.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::AppError;
use crate::graph::{CypherExecutor, Query};
use crate::migrations::Migration;

/// Constraint on user emails and indexes for name/website lookups.
pub struct M001Schema;

const STATEMENTS: &[&str] = &[
    "CREATE CONSTRAINT user_email_unique IF NOT EXISTS FOR (u:User) REQUIRE u.email IS UNIQUE",
    "CREATE INDEX mission_name IF NOT EXISTS FOR (m:Mission) ON (m.name)",
    "CREATE INDEX organization_name IF NOT EXISTS FOR (o:Organization) ON (o.name)",
    "CREATE INDEX organization_website IF NOT EXISTS FOR (o:Organization) ON (o.website)",
];

impl Migration for M001Schema {
    fn id(&self) -> &'static str {
        "m001_schema"
    }

    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "User email constraint, Mission/Organization lookup indexes"
    }

    fn up<'a>(&'a self, ctx: &'a (dyn CypherExecutor + Sync)) -> BoxFuture<'a, Result<(), AppError>> {
        async move {
            for statement in STATEMENTS {
                Query::new(ctx, statement).run().await?;
            }
            Ok(())
        }
        .boxed()
    }
}
