//! Mission repository: rankings and local neighbourhoods of the mission graph.

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::graph::{QueryExt, Row, SessionProvider};
use crate::models::{Mission, MissionGraph, MissionSet, MissionWithSubMissions};

/// Repository for Mission reads.
#[derive(FromContext, Clone)]
pub struct MissionRepository {
    sessions: SessionProvider,
}

impl MissionRepository {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }

    /// Every mission with its count of distinct transitive contributors.
    ///
    /// Ordered by count descending, then name, then id. Missions nobody
    /// contributes to are included with a count of zero.
    pub async fn list_missions(&self) -> Result<Vec<MissionWithSubMissions>, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (m:Mission)
                         OPTIONAL MATCH (m)<-[:CONTRIBUTES_TO*1..]-(c:Mission)
                         WHERE c <> m
                         RETURN id(m) AS id, m.name AS name, count(DISTINCT c) AS sub_missions
                         ORDER BY sub_missions DESC, name ASC, id ASC",
                    )
                    .fetch_all()
                    .await
            })
            .await?;

        let mut missions = rows
            .iter()
            .map(|row| row.to::<MissionWithSubMissions>())
            .collect::<Result<Vec<_>, _>>()?;
        missions.sort_by(MissionWithSubMissions::rank_cmp);
        Ok(missions)
    }

    /// Contributor/next-mission triples around `mission_id`.
    ///
    /// Empty when the mission does not exist or nothing contributes to it.
    pub async fn get_mission_sets(&self, mission_id: i64) -> Result<Vec<MissionSet>, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (target:Mission)<-[:CONTRIBUTES_TO]-(second:Mission)
                         WHERE id(target) = $mission_id
                         OPTIONAL MATCH (target)-[:CONTRIBUTES_TO]->(next:Mission)
                         RETURN {id: id(target), name: target.name} AS target_mission,
                                {id: id(second), name: second.name} AS second_mission,
                                CASE WHEN next IS NULL THEN null
                                     ELSE {id: id(next), name: next.name} END AS next_mission
                         ORDER BY second.name ASC, id(second) ASC",
                    )
                    .param("mission_id", mission_id)
                    .fetch_all()
                    .await
            })
            .await?;

        rows.iter().map(Self::row_to_mission_set).collect()
    }

    /// Find a mission by id.
    pub async fn get_mission_by_id(&self, id: i64) -> Result<Option<Mission>, AppError> {
        let row = self
            .sessions
            .with_session(|session| async move {
                session
                    .query("MATCH (m:Mission) WHERE id(m) = $id RETURN id(m) AS id, m.name AS name")
                    .param("id", id)
                    .fetch_one()
                    .await
            })
            .await?;

        row.map(|r| r.to::<Mission>()).transpose()
    }

    /// Missions an organization directly FILLS, by name.
    pub async fn list_missions_for_organization(
        &self,
        organization_id: i64,
    ) -> Result<Vec<Mission>, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (o:Organization)-[:FILLS]->(m:Mission)
                         WHERE id(o) = $organization_id
                         RETURN DISTINCT id(m) AS id, m.name AS name
                         ORDER BY name ASC, id ASC",
                    )
                    .param("organization_id", organization_id)
                    .fetch_all()
                    .await
            })
            .await?;

        rows.iter().map(|r| r.to::<Mission>()).collect()
    }

    /// Loads every mission and CONTRIBUTES_TO edge for in-process traversal.
    pub async fn load_hierarchy(&self) -> Result<MissionGraph, AppError> {
        let rows = self
            .sessions
            .with_session(|session| async move {
                session
                    .query(
                        "MATCH (m:Mission)
                         OPTIONAL MATCH (m)-[:CONTRIBUTES_TO]->(t:Mission)
                         RETURN id(m) AS id, m.name AS name, collect(id(t)) AS contributes_to",
                    )
                    .fetch_all()
                    .await
            })
            .await?;

        let mut missions = Vec::with_capacity(rows.len());
        let mut edges = Vec::new();
        for row in &rows {
            let mission: Mission = row.to()?;
            let targets: Vec<i64> = row.get("contributes_to")?;
            edges.extend(targets.into_iter().map(|to| (mission.id, to)));
            missions.push(mission);
        }

        let graph = MissionGraph::from_parts(missions, edges);
        tracing::debug!(missions = graph.len(), "loaded mission hierarchy");
        Ok(graph)
    }

    fn row_to_mission_set(row: &Row) -> Result<MissionSet, AppError> {
        Ok(MissionSet {
            target_mission: row.get("target_mission")?,
            second_mission: row.get("second_mission")?,
            next_mission: row.get_opt("next_mission")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::mock::ScriptedConnector;
    use serde_json::json;

    fn mission_row(id: i64, name: &str, sub_missions: u64) -> Row {
        [
            ("id", json!(id)),
            ("name", json!(name)),
            ("sub_missions", json!(sub_missions)),
        ]
        .into()
    }

    #[tokio::test]
    async fn test_list_missions_orders_by_count_then_name() {
        let connector = ScriptedConnector::new().respond(vec![
            mission_row(2, "Reduce CO2", 0),
            mission_row(1, "Save Earth", 1),
            mission_row(3, "Clean Oceans", 0),
        ]);
        let repo = MissionRepository::new(SessionProvider::new(connector.clone()));

        let missions = repo.list_missions().await.unwrap();

        let names: Vec<_> = missions.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Save Earth", "Clean Oceans", "Reduce CO2"]);
        assert_eq!(missions[0].sub_missions, 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_list_missions_empty_graph() {
        let connector = ScriptedConnector::new();
        let repo = MissionRepository::new(SessionProvider::new(connector.clone()));

        assert!(repo.list_missions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_missions_propagates_store_failure_and_releases() {
        let connector = ScriptedConnector::new().fail_with("connection refused");
        let repo = MissionRepository::new(SessionProvider::new(connector.clone()));

        let err = repo.list_missions().await.unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn test_mission_sets_binds_id_and_maps_absent_next() {
        let connector = ScriptedConnector::new().respond(vec![[
            ("target_mission", json!({"id": 1, "name": "Save Earth"})),
            ("second_mission", json!({"id": 2, "name": "Reduce CO2"})),
            ("next_mission", serde_json::Value::Null),
        ]
        .into()]);
        let repo = MissionRepository::new(SessionProvider::new(connector.clone()));

        let sets = repo.get_mission_sets(1).await.unwrap();

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].target_mission.name, "Save Earth");
        assert_eq!(sets[0].second_mission.id, 2);
        assert!(sets[0].next_mission.is_none());

        let calls = connector.calls();
        assert_eq!(calls[0].1.get("mission_id"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_mission_sets_unknown_id_is_empty() {
        let connector = ScriptedConnector::new().respond(vec![]);
        let repo = MissionRepository::new(SessionProvider::new(connector));

        assert!(repo.get_mission_sets(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_mission_by_id_absent() {
        let connector = ScriptedConnector::new();
        let repo = MissionRepository::new(SessionProvider::new(connector));

        assert_eq!(repo.get_mission_by_id(5).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_hierarchy_builds_graph() {
        let connector = ScriptedConnector::new().respond(vec![
            [
                ("id", json!(1)),
                ("name", json!("Save Earth")),
                ("contributes_to", json!([])),
            ]
            .into(),
            [
                ("id", json!(2)),
                ("name", json!("Reduce CO2")),
                ("contributes_to", json!([1])),
            ]
            .into(),
        ]);
        let repo = MissionRepository::new(SessionProvider::new(connector));

        let graph = repo.load_hierarchy().await.unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.sub_mission_count(1), 1);
        assert!(graph.to_dot().contains("\"Reduce CO2\" -> \"Save Earth\";"));
    }
}
