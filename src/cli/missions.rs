//! Mission subcommands.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};

use crate::context::Context;
use crate::repositories::MissionRepository;
use crate::services::MissionService;

use super::print_json;

#[derive(Subcommand)]
pub enum MissionsCommand {
    /// List missions ranked by number of contributing missions
    List,

    /// Show the missions around one mission
    Sets {
        /// Mission id
        id: i64,
    },

    /// Render the hierarchy (or one mission's neighbourhood) as DOT
    Graph {
        /// Only the neighbourhood of this mission
        #[arg(long)]
        mission: Option<i64>,
    },

    /// Fail on CONTRIBUTES_TO cycles or inconsistent rankings
    Check,
}

impl MissionsCommand {
    pub async fn run(&self, ctx: &Context) -> Result<()> {
        match self {
            MissionsCommand::List => {
                let missions = ctx.resolve::<MissionRepository>().list_missions().await?;
                print_json(&missions)
            }
            MissionsCommand::Sets { id } => {
                let sets = ctx.resolve::<MissionRepository>().get_mission_sets(*id).await?;
                print_json(&sets)
            }
            MissionsCommand::Graph { mission: Some(id) } => {
                let overview = ctx.resolve::<MissionService>().overview(Some(*id)).await?;
                let dot = overview
                    .dot
                    .ok_or_else(|| eyre!("mission {} not found", id))?;
                println!("{}", dot);
                Ok(())
            }
            MissionsCommand::Graph { mission: None } => {
                println!("{}", ctx.resolve::<MissionService>().hierarchy_dot().await?);
                Ok(())
            }
            MissionsCommand::Check => {
                let report = ctx.resolve::<MissionService>().check_hierarchy().await?;
                if report.is_healthy() {
                    tracing::info!("mission hierarchy is acyclic and rankings agree");
                    return Ok(());
                }
                print_json(&report)?;
                match &report.cycle {
                    Some(cycle) => {
                        let names: Vec<_> = cycle.iter().map(|m| m.name.as_str()).collect();
                        Err(eyre!("mission hierarchy has a cycle: {}", names.join(" -> ")))
                    }
                    None => Err(eyre!(
                        "{} mission ranking(s) disagree with the hierarchy",
                        report.count_mismatches.len()
                    )),
                }
            }
        }
    }
}
