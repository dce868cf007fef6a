//! Vote service: input validation and the local "has voted" marker.

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::marker::LocalVoteMarker;
use crate::models::{NewVote, Vote};
use crate::repositories::VoteRepository;

/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 10;

/// Service for casting votes.
#[derive(FromContext, Clone)]
pub struct VoteService {
    votes: VoteRepository,
    marker: LocalVoteMarker,
}

impl VoteService {
    pub fn new(votes: VoteRepository, marker: LocalVoteMarker) -> Self {
        Self { votes, marker }
    }

    /// Validates and records a vote, then marks the organization locally.
    ///
    /// Returns `None` when the organization does not exist.
    pub async fn submit(&self, input: NewVote) -> Result<Option<Vote>, AppError> {
        let input = Self::validate(input)?;
        let vote = self.votes.create_vote(&input).await?;

        if vote.is_some() {
            if let Err(e) = self.marker.mark_voted(input.organization_id) {
                tracing::warn!(organization_id = input.organization_id, error = %e, "vote recorded but not marked locally");
            }
        }
        Ok(vote)
    }

    /// Whether this profile already voted for the organization.
    pub fn has_voted(&self, organization_id: i64) -> bool {
        self.marker.has_voted(organization_id)
    }

    fn validate(input: NewVote) -> Result<NewVote, AppError> {
        if !(MIN_RATING..=MAX_RATING).contains(&input.rating) {
            return Err(AppError::Validation(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, input.rating
            )));
        }

        let email = input.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation(format!("invalid email: '{}'", email)));
        }

        Ok(NewVote {
            email: email.to_string(),
            how_fills_mission: input.how_fills_mission.trim().to_string(),
            ..input
        })
    }
}
