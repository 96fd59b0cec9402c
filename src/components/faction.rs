use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Agent, AgentId, Position, Resource};

pub type FactionId = usize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    pub color: String,
    pub leader: Option<AgentId>,
    pub members: Vec<AgentId>,
    pub territories: Vec<Position>,
    pub resources: BTreeMap<Resource, u64>,
    pub reputation: i32,
}

impl Faction {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            leader: None,
            members: Vec::new(),
            territories: Vec::new(),
            resources: Resource::ALL.into_iter().map(|r| (r, 0)).collect(),
            reputation: 0,
        }
    }

    pub fn add_member(&mut self, agent: AgentId) {
        self.members.push(agent);
    }

    /// Adds one gold per inventory slot held by each member. Slot counts are
    /// taken, not quantities, so every member contributes the same amount.
    /// Member ids with no matching agent contribute nothing.
    pub fn collect_taxes(&mut self, agents: &[Agent]) -> u64 {
        let total: u64 = self
            .members
            .iter()
            .filter_map(|id| agents.get(*id))
            .map(|agent| agent.inventory.len() as u64)
            .sum();
        *self.resources.entry(Resource::Gold).or_insert(0) += total;
        total
    }
}
