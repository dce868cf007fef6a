//! Mission models.

use serde::{Deserialize, Serialize};

/// A goal node. Missions form a directed graph through CONTRIBUTES_TO edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mission {
    /// Store-assigned node identity.
    pub id: i64,
    pub name: String,
}

/// A mission with the number of distinct missions that contribute to it,
/// directly or transitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionWithSubMissions {
    pub id: i64,
    pub name: String,
    pub sub_missions: u64,
}

impl MissionWithSubMissions {
    /// Ranking order: most sub-missions first, then name, then id.
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .sub_missions
            .cmp(&self.sub_missions)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// A local neighbourhood around a target mission.
///
/// `second_mission` contributes directly to `target_mission`;
/// `next_mission` is what the target contributes to, absent for roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionSet {
    pub target_mission: Mission,
    pub second_mission: Mission,
    pub next_mission: Option<Mission>,
}
