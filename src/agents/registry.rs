//! Shared agent registry.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use super::base::Agent;

/// Maps agent ids to agents.
///
/// Constructed once at start-up and handed to every agent. Agents keep a
/// weak reference, so dropping the registry tears the system down.
/// Iteration is in ascending id order.
#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<BTreeMap<String, Arc<dyn Agent>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `agent`, returning the agent previously registered under its id.
    pub fn register(&self, agent: Arc<dyn Agent>) -> Option<Arc<dyn Agent>> {
        let id = agent.id().to_string();
        let agent_type = agent.agent_type().to_string();
        let previous = self
            .agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), agent);
        if previous.is_some() {
            warn!(event = "agent.replaced", agent_id = %id, agent_type = %agent_type);
        } else {
            info!(event = "agent.registered", agent_id = %id, agent_type = %agent_type);
        }
        previous
    }

    pub fn unregister(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(agent_id)
    }

    pub fn get(&self, agent_id: &str) -> Option<Arc<dyn Agent>> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(agent_id)
            .cloned()
    }

    pub fn find_by_type(&self, agent_type: &str) -> Vec<Arc<dyn Agent>> {
        self.filter(|agent| agent.agent_type() == agent_type)
    }

    pub fn find_by_capability(&self, capability: &str) -> Vec<Arc<dyn Agent>> {
        self.filter(|agent| agent.core().has_capability(capability))
    }

    pub fn ids(&self) -> Vec<String> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shuts every agent down and empties the registry.
    pub fn shutdown_all(&self) {
        let agents: Vec<Arc<dyn Agent>> = std::mem::take(
            &mut *self.agents.write().unwrap_or_else(PoisonError::into_inner),
        )
        .into_values()
        .collect();
        for agent in agents {
            agent.shutdown();
        }
    }

    // Snapshot first; the predicate may take agent locks.
    fn filter(&self, predicate: impl Fn(&Arc<dyn Agent>) -> bool) -> Vec<Arc<dyn Agent>> {
        let agents: Vec<Arc<dyn Agent>> = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        agents.into_iter().filter(|agent| predicate(agent)).collect()
    }
}
