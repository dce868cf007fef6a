//! Vote repository: VOTED edges between users and organizations.

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::graph::{QueryExt, SessionProvider};
use crate::models::{NewVote, Vote};

/// Repository for Vote edges and the User nodes that cast them.
#[derive(FromContext, Clone)]
pub struct VoteRepository {
    sessions: SessionProvider,
}

impl VoteRepository {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }

    /// Votes cast for an organization, newest first.
    pub async fn list_votes_for_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Vote>, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (:User)-[v:VOTED]->(o:Organization)
                         WHERE id(o) = $organization_id
                         RETURN id(v) AS id, v.rating AS rating, v.howFillsMission AS how_fills_mission,
                                v.mission AS mission, v.needs AS needs, v.createdAt AS created_at
                         ORDER BY created_at DESC, id DESC",
                    )
                    .param("organization_id", organization_id)
                    .fetch_all()
                    .await
            })
            .await?;

        rows.iter().map(|r| r.to::<Vote>()).collect()
    }

    /// Votes cast for every organization with the given name, newest first.
    pub async fn list_votes_for_organization_name(
        &self,
        name: &str,
    ) -> Result<Vec<Vote>, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (:User)-[v:VOTED]->(o:Organization {name: $name})
                         RETURN id(v) AS id, v.rating AS rating, v.howFillsMission AS how_fills_mission,
                                v.mission AS mission, v.needs AS needs, v.createdAt AS created_at
                         ORDER BY created_at DESC, id DESC",
                    )
                    .param("name", name)
                    .fetch_all()
                    .await
            })
            .await?;

        rows.iter().map(|r| r.to::<Vote>()).collect()
    }

    /// Records a vote.
    ///
    /// The user is merged by email and always takes the submitted newsletter
    /// preference. Every call creates a new VOTED edge. Returns `None`,
    /// writing nothing, when the organization does not exist.
    pub async fn create_vote(&self, input: &NewVote) -> Result<Option<Vote>, AppError> {
        let now = chrono::Utc::now().to_rfc3339();

        let row = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (o:Organization) WHERE id(o) = $organization_id
                         MERGE (u:User {email: $email})
                           ON CREATE SET u.newsletter = $newsletter
                           ON MATCH SET u.newsletter = $newsletter
                         CREATE (u)-[v:VOTED {rating: $rating, howFillsMission: $how_fills_mission, createdAt: $now}]->(o)
                         RETURN id(v) AS id, v.rating AS rating, v.howFillsMission AS how_fills_mission,
                                v.mission AS mission, v.needs AS needs, v.createdAt AS created_at",
                    )
                    .param("organization_id", input.organization_id)
                    .param("email", &input.email)
                    .param("newsletter", input.newsletter)
                    .param("rating", input.rating)
                    .param("how_fills_mission", &input.how_fills_mission)
                    .param("now", &now)
                    .fetch_one()
                    .await
            })
            .await?;

        match row {
            Some(row) => {
                let vote: Vote = row.to()?;
                tracing::info!(
                    id = vote.id,
                    organization_id = input.organization_id,
                    rating = vote.rating,
                    "vote recorded"
                );
                Ok(Some(vote))
            }
            None => {
                tracing::debug!(
                    organization_id = input.organization_id,
                    "organization not found, vote not recorded"
                );
                Ok(None)
            }
        }
    }
}
