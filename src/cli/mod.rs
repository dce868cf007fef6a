//! CLI module for Mission Index.
//!
//! Subcommands:
//! - `init`: Apply schema migrations
//! - `missions`: Rankings, mission sets, DOT graphs, cycle check
//! - `orgs`: List, show, find and register organizations
//! - `votes`: List and cast votes
//!
//! Results are printed to stdout as JSON (DOT for `missions graph`);
//! logs go to stderr.

mod init;
mod missions;
mod orgs;
mod votes;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;

use crate::config::Config;
use crate::context::Context;

pub use missions::MissionsCommand;
pub use orgs::OrgsCommand;
pub use votes::VotesCommand;

/// Mission Index - organizations, missions and votes over a Neo4j graph
#[derive(Parser)]
#[command(name = "missionindex")]
#[command(about = "Query and update the mission graph")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply pending schema migrations
    Init,

    /// Browse missions
    Missions {
        #[command(subcommand)]
        command: MissionsCommand,
    },

    /// Browse and register organizations
    Orgs {
        #[command(subcommand)]
        command: OrgsCommand,
    },

    /// List and cast votes
    Votes {
        #[command(subcommand)]
        command: VotesCommand,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> Result<()> {
        match &self.command {
            Command::Init => self.run_init().await,
            Command::Missions { command } => command.run(&Self::context()?).await,
            Command::Orgs { command } => command.run(&Self::context()?).await,
            Command::Votes { command } => command.run(&Self::context()?).await,
        }
    }

    fn context() -> Result<Context> {
        let config = Config::load()?;
        tracing::debug!(uri = %config.neo4j.uri, "loaded configuration");
        Ok(Context::from_config(config))
    }
}

/// Prints a value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_vote_cast() {
        let app = App::try_parse_from([
            "missionindex",
            "votes",
            "cast",
            "--org",
            "10",
            "--rating",
            "8",
            "--email",
            "ada@example.org",
            "--newsletter",
        ])
        .unwrap();

        match app.command {
            Command::Votes {
                command: VotesCommand::Cast { org, rating, newsletter, .. },
            } => {
                assert_eq!(org, 10);
                assert_eq!(rating, 8);
                assert!(newsletter);
            }
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn test_parses_filtered_org_list() {
        let app = App::try_parse_from(["missionindex", "-v", "orgs", "list", "--mission", "3"]).unwrap();
        assert!(app.verbose);
        assert!(matches!(
            app.command,
            Command::Orgs {
                command: OrgsCommand::List { mission: Some(3) }
            }
        ));
    }

    #[test]
    fn test_rejects_non_numeric_id() {
        assert!(App::try_parse_from(["missionindex", "missions", "sets", "abc"]).is_err());
    }
}
