//! Organization repository for reads and merge-style creation.

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::graph::{QueryExt, Row, SessionProvider};
use crate::models::{Mission, NewOrganization, Organization, OrganizationWithMissions};

/// Repository for Organization nodes and their FILLS edges.
#[derive(FromContext, Clone)]
pub struct OrganizationRepository {
    sessions: SessionProvider,
}

impl OrganizationRepository {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }

    /// All organizations, by name.
    pub async fn list_organizations(&self) -> Result<Vec<Organization>, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (o:Organization)
                         RETURN id(o) AS id, o.name AS name, o.website AS website,
                                o.description AS description, o.createdAt AS created_at
                         ORDER BY name ASC, id ASC",
                    )
                    .fetch_all()
                    .await
            })
            .await?;

        rows.iter().map(|r| r.to::<Organization>()).collect()
    }

    /// Organizations annotated with missions.
    ///
    /// Without a filter, every organization is returned with all missions it
    /// directly FILLS (possibly none). With a filter, only organizations whose
    /// FILLS mission reaches the filter mission through zero or more
    /// CONTRIBUTES_TO hops are returned, and `missions` holds just those FILLS
    /// missions, not the filter mission.
    pub async fn list_organizations_with_missions(
        &self,
        mission_filter: Option<i64>,
    ) -> Result<Vec<OrganizationWithMissions>, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                let query = match mission_filter {
                    None => session.query(
                        "MATCH (o:Organization)
                         OPTIONAL MATCH (o)-[:FILLS]->(m:Mission)
                         WITH o, collect(DISTINCT m) AS filled
                         RETURN id(o) AS id, o.name AS name, o.website AS website,
                                o.description AS description, o.createdAt AS created_at,
                                [x IN filled | {id: id(x), name: x.name}] AS missions
                         ORDER BY name ASC, id ASC",
                    ),
                    Some(mission_id) => session
                        .query(
                            "MATCH (target:Mission) WHERE id(target) = $mission_id
                             MATCH (o:Organization)-[:FILLS]->(m:Mission)-[:CONTRIBUTES_TO*0..]->(target)
                             WITH o, collect(DISTINCT m) AS filled
                             RETURN id(o) AS id, o.name AS name, o.website AS website,
                                    o.description AS description, o.createdAt AS created_at,
                                    [x IN filled | {id: id(x), name: x.name}] AS missions
                             ORDER BY name ASC, id ASC",
                        )
                        .param("mission_id", mission_id),
                };
                query.fetch_all().await
            })
            .await?;

        rows.iter().map(Self::row_to_organization_with_missions).collect()
    }

    /// Find an organization by id.
    pub async fn get_organization_by_id(&self, id: i64) -> Result<Option<Organization>, AppError> {
        let row = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (o:Organization) WHERE id(o) = $id
                         RETURN id(o) AS id, o.name AS name, o.website AS website,
                                o.description AS description, o.createdAt AS created_at",
                    )
                    .param("id", id)
                    .fetch_one()
                    .await
            })
            .await?;

        row.map(|r| r.to::<Organization>()).transpose()
    }

    /// Find an organization by name.
    ///
    /// Names are not unique; the oldest node wins.
    pub async fn get_organization_by_name(
        &self,
        name: &str,
    ) -> Result<Option<Organization>, AppError> {
        let row = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (o:Organization {name: $name})
                         RETURN id(o) AS id, o.name AS name, o.website AS website,
                                o.description AS description, o.createdAt AS created_at
                         ORDER BY id ASC
                         LIMIT 1",
                    )
                    .param("name", name)
                    .fetch_one()
                    .await
            })
            .await?;

        row.map(|r| r.to::<Organization>()).transpose()
    }

    /// Find an organization by its exact website.
    pub async fn get_organization_by_website(
        &self,
        website: &str,
    ) -> Result<Option<Organization>, AppError> {
        let website = website.trim();
        if website.is_empty() {
            return Ok(None);
        }

        let row = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (o:Organization {website: $website})
                         RETURN id(o) AS id, o.name AS name, o.website AS website,
                                o.description AS description, o.createdAt AS created_at
                         ORDER BY id ASC
                         LIMIT 1",
                    )
                    .param("website", website)
                    .fetch_one()
                    .await
            })
            .await?;

        row.map(|r| r.to::<Organization>()).transpose()
    }

    /// Merge an organization and attach it to an existing mission.
    ///
    /// The merge key is `(name, website, description)`; absent values are
    /// stored as empty strings so identical input always hits the same node.
    /// Returns `None`, creating nothing, when no mission has `mission_name`.
    pub async fn create_organization(
        &self,
        input: &NewOrganization,
    ) -> Result<Option<Organization>, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        let website = NewOrganization::key_value(&input.website);
        let description = NewOrganization::key_value(&input.description);

        let row = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (m:Mission {name: $mission_name})
                         WITH m ORDER BY id(m) ASC LIMIT 1
                         MERGE (o:Organization {name: $name, website: $website, description: $description})
                           ON CREATE SET o.createdAt = $now
                         MERGE (o)-[:FILLS]->(m)
                         RETURN id(o) AS id, o.name AS name, o.website AS website,
                                o.description AS description, o.createdAt AS created_at",
                    )
                    .param("mission_name", &input.mission_name)
                    .param("name", &input.name)
                    .param("website", website)
                    .param("description", description)
                    .param("now", &now)
                    .fetch_one()
                    .await
            })
            .await?;

        match row {
            Some(row) => {
                let organization: Organization = row.to()?;
                tracing::info!(
                    id = organization.id,
                    name = %organization.name,
                    mission = %input.mission_name,
                    "organization merged"
                );
                Ok(Some(organization))
            }
            None => {
                tracing::debug!(mission = %input.mission_name, "mission not found, organization not created");
                Ok(None)
            }
        }
    }

    fn row_to_organization_with_missions(row: &Row) -> Result<OrganizationWithMissions, AppError> {
        let mut missions: Vec<Mission> = row.get_opt("missions")?.unwrap_or_default();
        missions.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(OrganizationWithMissions {
            organization: row.to()?,
            missions,
        })
    }
}
