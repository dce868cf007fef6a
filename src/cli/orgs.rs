//! Organization subcommands.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};

use crate::context::Context;
use crate::models::NewOrganization;
use crate::repositories::OrganizationRepository;
use crate::services::OrganizationService;

use super::print_json;

#[derive(Subcommand)]
pub enum OrgsCommand {
    /// List organizations with their missions
    List {
        /// Only organizations whose missions contribute to this mission
        #[arg(long)]
        mission: Option<i64>,
    },

    /// Show an organization with its missions and votes
    Show {
        /// Organization id
        id: i64,
    },

    /// Look up an organization by name or website
    Find {
        #[arg(long, conflicts_with = "website", required_unless_present = "website")]
        name: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },

    /// Register an organization under an existing mission
    Create {
        #[arg(long)]
        name: String,
        /// Name of the mission the organization fills
        #[arg(long)]
        mission: String,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
}

impl OrgsCommand {
    pub async fn run(&self, ctx: &Context) -> Result<()> {
        match self {
            OrgsCommand::List { mission } => {
                let orgs = ctx
                    .resolve::<OrganizationRepository>()
                    .list_organizations_with_missions(*mission)
                    .await?;
                print_json(&orgs)
            }
            OrgsCommand::Show { id } => {
                let profile = ctx
                    .resolve::<OrganizationService>()
                    .profile(*id)
                    .await?
                    .ok_or_else(|| eyre!("organization {} not found", id))?;
                print_json(&profile)
            }
            OrgsCommand::Find { name, website } => {
                let repo = ctx.resolve::<OrganizationRepository>();
                let found = match (name, website) {
                    (Some(name), _) => repo.get_organization_by_name(name).await?,
                    (None, Some(website)) => repo.get_organization_by_website(website).await?,
                    (None, None) => None,
                };
                print_json(&found)
            }
            OrgsCommand::Create {
                name,
                mission,
                website,
                description,
            } => {
                let input = NewOrganization {
                    name: name.clone(),
                    mission_name: mission.clone(),
                    website: website.clone(),
                    description: description.clone(),
                };
                let created = ctx
                    .resolve::<OrganizationService>()
                    .register(input)
                    .await?
                    .ok_or_else(|| eyre!("no mission named '{}'", mission))?;
                print_json(&created)
            }
        }
    }
}
