//! Agent selection policy for delegation.

use std::sync::Arc;

use serde_json::Value;

use super::base::{Agent, AgentStatus};

/// Picks the agent a director delegates a task to.
///
/// `candidates` are the director's own active specialized agents in
/// ascending id order. Plain closures implement this trait.
pub trait AgentSelector: Send + Sync {
    fn select(&self, task_type: &str, parameters: &Value, candidates: &[Arc<dyn Agent>]) -> Option<String>;
}

impl<F> AgentSelector for F
where
    F: Fn(&str, &Value, &[Arc<dyn Agent>]) -> Option<String> + Send + Sync,
{
    fn select(&self, task_type: &str, parameters: &Value, candidates: &[Arc<dyn Agent>]) -> Option<String> {
        self(task_type, parameters, candidates)
    }
}

/// Default policy: most specific capability first, lowest id on ties.
///
/// For a task of type `t` the capabilities tried are `t:{sport}` (from
/// `sport` or `schedule.sport`), `t:{algorithm}` (from `algorithmType`),
/// then `t`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilitySelector;

impl CapabilitySelector {
    pub fn preferred_capabilities(task_type: &str, parameters: &Value) -> Vec<String> {
        let mut preferred = Vec::with_capacity(3);

        let sport = parameters
            .get("sport")
            .and_then(Value::as_str)
            .or_else(|| parameters.pointer("/schedule/sport").and_then(Value::as_str));
        if let Some(sport) = sport {
            preferred.push(format!("{task_type}:{}", sport.trim().to_ascii_lowercase()));
        }

        let algorithm = ["algorithmType", "algorithm_type", "algorithm"]
            .iter()
            .find_map(|key| parameters.get(*key).and_then(Value::as_str));
        if let Some(algorithm) = algorithm {
            preferred.push(format!("{task_type}:{algorithm}"));
        }

        preferred.push(task_type.to_string());
        preferred
    }
}

impl AgentSelector for CapabilitySelector {
    fn select(&self, task_type: &str, parameters: &Value, candidates: &[Arc<dyn Agent>]) -> Option<String> {
        let mut active: Vec<&Arc<dyn Agent>> = candidates
            .iter()
            .filter(|agent| agent.status() == AgentStatus::Active)
            .collect();
        active.sort_by(|a, b| a.id().cmp(b.id()));

        Self::preferred_capabilities(task_type, parameters)
            .iter()
            .find_map(|capability| {
                active
                    .iter()
                    .find(|agent| agent.core().has_capability(capability))
                    .map(|agent| agent.id().to_string())
            })
    }
}
