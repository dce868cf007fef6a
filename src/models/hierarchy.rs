//! In-process view of the mission hierarchy.
//!
//! [`MissionGraph`] holds every mission and CONTRIBUTES_TO edge. Transitive
//! questions are answered by explicit traversal with a visited set, so
//! cyclic data terminates.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::models::{Mission, MissionWithSubMissions};

/// Missions plus CONTRIBUTES_TO adjacency in both directions.
#[derive(Debug, Clone, Default)]
pub struct MissionGraph {
    missions: BTreeMap<i64, Mission>,
    /// mission -> missions it contributes to
    outgoing: HashMap<i64, BTreeSet<i64>>,
    /// mission -> missions contributing to it
    incoming: HashMap<i64, BTreeSet<i64>>,
}

impl MissionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from missions and `(from, to)` CONTRIBUTES_TO pairs.
    ///
    /// Edges whose endpoints are unknown are ignored.
    pub fn from_parts(
        missions: impl IntoIterator<Item = Mission>,
        edges: impl IntoIterator<Item = (i64, i64)>,
    ) -> Self {
        let mut graph = Self::new();
        for mission in missions {
            graph.add_mission(mission);
        }
        for (from, to) in edges {
            graph.add_contribution(from, to);
        }
        graph
    }

    pub fn add_mission(&mut self, mission: Mission) {
        self.missions.insert(mission.id, mission);
    }

    /// Records that `from` contributes to `to`.
    pub fn add_contribution(&mut self, from: i64, to: i64) -> bool {
        if !self.missions.contains_key(&from) || !self.missions.contains_key(&to) {
            tracing::debug!(from, to, "ignoring edge with unknown endpoint");
            return false;
        }
        self.outgoing.entry(from).or_default().insert(to);
        self.incoming.entry(to).or_default().insert(from);
        true
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    fn contributors(&self, id: i64) -> impl Iterator<Item = i64> + '_ {
        self.incoming.get(&id).into_iter().flatten().copied()
    }

    fn targets(&self, id: i64) -> impl Iterator<Item = i64> + '_ {
        self.outgoing.get(&id).into_iter().flatten().copied()
    }

    /// Number of distinct missions reaching `id` through one or more
    /// CONTRIBUTES_TO hops, not counting `id` itself.
    pub fn sub_mission_count(&self, id: i64) -> u64 {
        let mut visited = HashSet::from([id]);
        let mut queue: VecDeque<i64> = self.contributors(id).collect();
        let mut count = 0;

        while let Some(next) = queue.pop_front() {
            if !visited.insert(next) {
                continue;
            }
            count += 1;
            queue.extend(self.contributors(next));
        }
        count
    }

    /// Every mission with its sub-mission count, most contributed-to first.
    pub fn ranked(&self) -> Vec<MissionWithSubMissions> {
        let mut ranked: Vec<_> = self
            .missions
            .values()
            .map(|m| MissionWithSubMissions {
                id: m.id,
                name: m.name.clone(),
                sub_missions: self.sub_mission_count(m.id),
            })
            .collect();
        ranked.sort_by(MissionWithSubMissions::rank_cmp);
        ranked
    }

    /// Returns one CONTRIBUTES_TO cycle if the hierarchy has any.
    ///
    /// The cycle is listed in edge order and starts at its smallest id.
    pub fn find_cycle(&self) -> Option<Vec<Mission>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<i64, Mark> = HashMap::new();

        for &start in self.missions.keys() {
            if marks.contains_key(&start) {
                continue;
            }
            // Iterative DFS; stack[i] holds the unvisited targets of path[i].
            let mut path: Vec<i64> = vec![start];
            let mut stack: Vec<Vec<i64>> = vec![self.targets(start).collect()];
            marks.insert(start, Mark::Visiting);

            while let Some(pending) = stack.last_mut() {
                match pending.pop() {
                    Some(next) => match marks.get(&next) {
                        Some(Mark::Visiting) => {
                            let pos = path.iter().position(|&p| p == next).unwrap_or(0);
                            return Some(self.normalize_cycle(&path[pos..]));
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(next, Mark::Visiting);
                            path.push(next);
                            stack.push(self.targets(next).collect());
                        }
                    },
                    None => {
                        stack.pop();
                        if let Some(done) = path.pop() {
                            marks.insert(done, Mark::Done);
                        }
                    }
                }
            }
        }
        None
    }

    fn normalize_cycle(&self, cycle: &[i64]) -> Vec<Mission> {
        let start = cycle
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| **id)
            .map(|(i, _)| i)
            .unwrap_or(0);
        cycle[start..]
            .iter()
            .chain(&cycle[..start])
            .filter_map(|id| self.missions.get(id).cloned())
            .collect()
    }

    /// DOT rendering of the whole hierarchy; isolated missions appear as nodes.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph {\n");
        for mission in self.missions.values() {
            let isolated = self.contributors(mission.id).next().is_none()
                && self.targets(mission.id).next().is_none();
            if isolated {
                out.push_str(&format!("  {};\n", dot_quote(&mission.name)));
            }
        }
        for (from, mission) in &self.missions {
            for to in self.targets(*from) {
                if let Some(target) = self.missions.get(&to) {
                    out.push_str(&format!(
                        "  {} -> {};\n",
                        dot_quote(&mission.name),
                        dot_quote(&target.name)
                    ));
                }
            }
        }
        out.push('}');
        out
    }
}

/// Quotes a name as a DOT identifier.
pub fn dot_quote(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}
