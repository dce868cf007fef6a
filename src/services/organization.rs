//! Organization service: registration and profile pages.

use serde::Serialize;

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::marker::LocalVoteMarker;
use crate::models::{Mission, NewOrganization, Organization, Vote};
use crate::repositories::{MissionRepository, OrganizationRepository, VoteRepository};

/// Everything shown on an organization's page.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationProfile {
    pub organization: Organization,
    pub missions: Vec<Mission>,
    pub votes: Vec<Vote>,
    /// Mean rating over `votes`, if any.
    pub average_rating: Option<f64>,
    /// Whether this profile already voted locally.
    pub has_voted: bool,
}

/// Service for organization registration and lookup.
#[derive(FromContext, Clone)]
pub struct OrganizationService {
    organizations: OrganizationRepository,
    missions: MissionRepository,
    votes: VoteRepository,
    marker: LocalVoteMarker,
}

impl OrganizationService {
    pub fn new(
        organizations: OrganizationRepository,
        missions: MissionRepository,
        votes: VoteRepository,
        marker: LocalVoteMarker,
    ) -> Self {
        Self {
            organizations,
            missions,
            votes,
            marker,
        }
    }

    /// Validates and registers an organization under an existing mission.
    ///
    /// Returns `None` when the mission does not exist.
    pub async fn register(&self, input: NewOrganization) -> Result<Option<Organization>, AppError> {
        let input = Self::validate(input)?;
        self.organizations.create_organization(&input).await
    }

    /// Loads an organization with its missions, votes and local vote flag.
    pub async fn profile(&self, id: i64) -> Result<Option<OrganizationProfile>, AppError> {
        let Some(organization) = self.organizations.get_organization_by_id(id).await? else {
            return Ok(None);
        };
        let missions = self.missions.list_missions_for_organization(id).await?;
        let votes = self.votes.list_votes_for_organization(id).await?;

        Ok(Some(OrganizationProfile {
            average_rating: average_rating(&votes),
            has_voted: self.marker.has_voted(id),
            organization,
            missions,
            votes,
        }))
    }

    fn validate(input: NewOrganization) -> Result<NewOrganization, AppError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("organization name is required".into()));
        }
        let mission_name = input.mission_name.trim();
        if mission_name.is_empty() {
            return Err(AppError::Validation("mission name is required".into()));
        }

        Ok(NewOrganization {
            name: name.to_string(),
            mission_name: mission_name.to_string(),
            website: non_blank(input.website),
            description: non_blank(input.description),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn average_rating(votes: &[Vote]) -> Option<f64> {
    if votes.is_empty() {
        return None;
    }
    let total: i64 = votes.iter().map(|v| v.rating).sum();
    Some(total as f64 / votes.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::ScriptedConnector;
    use crate::graph::SessionProvider;
    use serde_json::json;

    fn service(connector: &ScriptedConnector) -> OrganizationService {
        let sessions = SessionProvider::new(connector.clone());
        OrganizationService::new(
            OrganizationRepository::new(sessions.clone()),
            MissionRepository::new(sessions.clone()),
            VoteRepository::new(sessions),
            LocalVoteMarker::detached(),
        )
    }

    #[tokio::test]
    async fn test_register_requires_names() {
        let connector = ScriptedConnector::new();
        let service = service(&connector);

        let err = service
            .register(NewOrganization {
                name: "  ".into(),
                mission_name: "Save Earth".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .register(NewOrganization {
                name: "Ocean Cleanup".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(connector.opened(), 0);
    }

    #[tokio::test]
    async fn test_register_treats_blank_optionals_as_absent() {
        let connector = ScriptedConnector::new().respond(vec![]);
        let service = service(&connector);

        let created = service
            .register(NewOrganization {
                name: " Ocean Cleanup ".into(),
                mission_name: "Clean Oceans".into(),
                website: Some("   ".into()),
                description: Some(" Removes plastic ".into()),
            })
            .await
            .unwrap();

        assert!(created.is_none());
        let (_, params) = &connector.calls()[0];
        assert_eq!(params.get("name"), Some(&json!("Ocean Cleanup")));
        assert_eq!(params.get("website"), Some(&json!("")));
        assert_eq!(params.get("description"), Some(&json!("Removes plastic")));
    }

    #[tokio::test]
    async fn test_profile_aggregates() {
        let connector = ScriptedConnector::new()
            .respond(vec![[
                ("id", json!(10)),
                ("name", json!("Ocean Cleanup")),
                ("website", json!("https://ocean.example")),
                ("description", json!("")),
                ("created_at", serde_json::Value::Null),
            ]
            .into()])
            .respond(vec![[("id", json!(3)), ("name", json!("Clean Oceans"))].into()])
            .respond(vec![
                [("id", json!(1)), ("rating", json!(8))].into(),
                [("id", json!(2)), ("rating", json!(5))].into(),
            ]);
        let service = service(&connector);

        let profile = service.profile(10).await.unwrap().unwrap();

        assert_eq!(profile.organization.website.as_deref(), Some("https://ocean.example"));
        assert_eq!(profile.missions.len(), 1);
        assert_eq!(profile.votes.len(), 2);
        assert_eq!(profile.average_rating, Some(6.5));
        assert!(!profile.has_voted);
        assert_eq!(connector.closed(), 3);
    }

    #[tokio::test]
    async fn test_profile_missing_organization() {
        let connector = ScriptedConnector::new();
        let service = service(&connector);

        assert!(service.profile(1).await.unwrap().is_none());
        assert_eq!(connector.opened(), 1);
    }
}
