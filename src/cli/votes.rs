//! Vote subcommands.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};

use crate::context::Context;
use crate::models::NewVote;
use crate::repositories::VoteRepository;
use crate::services::VoteService;

use super::print_json;

#[derive(Subcommand)]
pub enum VotesCommand {
    /// List votes for an organization, newest first
    List {
        /// Organization id
        #[arg(required_unless_present = "org_name")]
        org: Option<i64>,
        /// Organization name instead of id
        #[arg(long, conflicts_with = "org")]
        org_name: Option<String>,
    },

    /// Cast a vote for an organization
    Cast {
        /// Organization id
        #[arg(long)]
        org: i64,
        /// Rating from 1 to 10
        #[arg(long)]
        rating: i64,
        #[arg(long)]
        email: String,
        /// How the organization fills its mission
        #[arg(long, default_value = "")]
        comment: String,
        /// Subscribe to the newsletter
        #[arg(long)]
        newsletter: bool,
    },
}

impl VotesCommand {
    pub async fn run(&self, ctx: &Context) -> Result<()> {
        match self {
            VotesCommand::List { org, org_name } => {
                let repo = ctx.resolve::<VoteRepository>();
                let votes = match (org, org_name) {
                    (Some(id), _) => repo.list_votes_for_organization(*id).await?,
                    (None, Some(name)) => repo.list_votes_for_organization_name(name).await?,
                    (None, None) => Vec::new(),
                };
                print_json(&votes)
            }
            VotesCommand::Cast {
                org,
                rating,
                email,
                comment,
                newsletter,
            } => {
                let service = ctx.resolve::<VoteService>();
                if service.has_voted(*org) {
                    tracing::warn!(organization_id = *org, "already voted from this profile");
                }
                let vote = service
                    .submit(NewVote {
                        organization_id: *org,
                        rating: *rating,
                        how_fills_mission: comment.clone(),
                        email: email.clone(),
                        newsletter: *newsletter,
                    })
                    .await?
                    .ok_or_else(|| eyre!("organization {} not found", org))?;
                print_json(&vote)
            }
        }
    }
}
