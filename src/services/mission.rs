//! Mission service: page-shaped mission overviews and hierarchy checks.

use std::collections::HashMap;

use serde::Serialize;

use crate::context::Context;
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{dot_quote, Mission, MissionSet, MissionWithSubMissions};
use crate::repositories::MissionRepository;

/// Ranked missions plus the neighbourhood of a selected mission.
#[derive(Debug, Clone, Serialize)]
pub struct MissionOverview {
    pub missions: Vec<MissionWithSubMissions>,
    /// The selected mission, when the id matched one.
    pub selected: Option<Mission>,
    pub mission_sets: Vec<MissionSet>,
    /// DOT rendering of `mission_sets`; absent without a selection.
    pub dot: Option<String>,
}

/// A ranking whose listed count disagrees with an in-process traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub mission: Mission,
    /// Count reported by `list_missions`.
    pub listed: u64,
    /// Count from walking the loaded hierarchy.
    pub traversed: u64,
}

/// Outcome of `missions check`.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyReport {
    pub cycle: Option<Vec<Mission>>,
    pub count_mismatches: Vec<CountMismatch>,
}

impl HierarchyReport {
    pub fn is_healthy(&self) -> bool {
        self.cycle.is_none() && self.count_mismatches.is_empty()
    }
}

/// Service for mission browsing.
#[derive(FromContext, Clone)]
pub struct MissionService {
    missions: MissionRepository,
}

impl MissionService {
    pub fn new(missions: MissionRepository) -> Self {
        Self { missions }
    }

    /// Builds the mission overview, optionally focused on one mission.
    pub async fn overview(&self, mission_id: Option<i64>) -> Result<MissionOverview, AppError> {
        let missions = self.missions.list_missions().await?;

        let Some(mission_id) = mission_id else {
            return Ok(MissionOverview {
                missions,
                selected: None,
                mission_sets: Vec::new(),
                dot: None,
            });
        };

        let selected = missions
            .iter()
            .find(|m| m.id == mission_id)
            .map(|m| Mission {
                id: m.id,
                name: m.name.clone(),
            });
        let mission_sets = if selected.is_some() {
            self.missions.get_mission_sets(mission_id).await?
        } else {
            Vec::new()
        };
        let dot = selected.as_ref().map(|_| render_dot(&mission_sets));

        Ok(MissionOverview {
            missions,
            selected,
            mission_sets,
            dot,
        })
    }

    /// Checks the hierarchy for cycles and cross-checks the ranking.
    ///
    /// Every count from `list_missions` is compared with a breadth-first walk
    /// of the loaded hierarchy. Missions created between the two reads are
    /// skipped.
    pub async fn check_hierarchy(&self) -> Result<HierarchyReport, AppError> {
        let graph = self.missions.load_hierarchy().await?;
        let listed = self.missions.list_missions().await?;

        let cycle = graph.find_cycle();
        if let Some(cycle) = &cycle {
            let names: Vec<_> = cycle.iter().map(|m| m.name.as_str()).collect();
            tracing::warn!(cycle = ?names, "mission hierarchy contains a cycle");
        }

        let traversed: HashMap<i64, u64> = graph
            .ranked()
            .into_iter()
            .map(|m| (m.id, m.sub_missions))
            .collect();
        let count_mismatches: Vec<_> = listed
            .into_iter()
            .filter_map(|m| {
                let &counted = traversed.get(&m.id)?;
                (counted != m.sub_missions).then(|| CountMismatch {
                    mission: Mission {
                        id: m.id,
                        name: m.name,
                    },
                    listed: m.sub_missions,
                    traversed: counted,
                })
            })
            .collect();
        for mismatch in &count_mismatches {
            tracing::warn!(
                mission = %mismatch.mission.name,
                listed = mismatch.listed,
                traversed = mismatch.traversed,
                "sub-mission count disagrees with traversal"
            );
        }

        Ok(HierarchyReport {
            cycle,
            count_mismatches,
        })
    }

    /// DOT rendering of the whole mission hierarchy.
    pub async fn hierarchy_dot(&self) -> Result<String, AppError> {
        Ok(self.missions.load_hierarchy().await?.to_dot())
    }
}

/// Renders mission sets as a DOT digraph.
///
/// Each set contributes `"second" -> "target";` and, when present,
/// `"target" -> "next";`. Repeated rules are written once.
pub fn render_dot(sets: &[MissionSet]) -> String {
    let mut rules: Vec<String> = Vec::new();
    let mut push = |rule: String| {
        if !rules.contains(&rule) {
            rules.push(rule);
        }
    };

    for set in sets {
        let target = dot_quote(&set.target_mission.name);
        push(format!(
            "{} -> {};",
            dot_quote(&set.second_mission.name),
            target
        ));
        if let Some(next) = &set.next_mission {
            push(format!("{} -> {};", target, dot_quote(&next.name)));
        }
    }

    let mut dot = String::from("digraph {\n");
    for rule in rules {
        dot.push_str("  ");
        dot.push_str(&rule);
        dot.push('\n');
    }
    dot.push('}');
    dot
}
