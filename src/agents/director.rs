//! Director agent: task bookkeeping and capability-based delegation.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::base::{Agent, AgentCore, AgentStatus};
use super::error::{AgentError, AgentResult};
use super::message::{
    types, DelegateTask, DelegationStatus, ExecuteTask, RegisterAgent, TaskStatusUpdate,
};
use super::registry::AgentRegistry;
use super::selection::{AgentSelector, CapabilitySelector};

/// Agent type of [`DirectorAgent`].
pub const DIRECTOR_AGENT_TYPE: &str = "director";

/// A director's own record of a task it delegates.
///
/// Independent of the task manager's tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorTask {
    pub id: String,
    pub task_type: String,
    pub description: Option<String>,
    pub parameters: Value,
    pub status: DelegationStatus,
    pub assigned_agent: Option<String>,
    /// Last status reported by the executing agent through `task_status`.
    pub reported_status: Option<DelegationStatus>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creates tasks and routes them to its specialized agents.
///
/// Handles `delegate_task`, `task_status` and `register_agent`.
pub struct DirectorAgent {
    core: AgentCore,
    specialized: RwLock<BTreeSet<String>>,
    tasks: RwLock<HashMap<String, DirectorTask>>,
    selector: Box<dyn AgentSelector>,
    this: Weak<DirectorAgent>,
}

impl DirectorAgent {
    /// A director with a generated id and the [`CapabilitySelector`].
    pub fn new(registry: &Arc<AgentRegistry>) -> Arc<Self> {
        Self::build(AgentCore::new(DIRECTOR_AGENT_TYPE, registry), Box::new(CapabilitySelector))
    }

    pub fn with_id(id: impl Into<String>, registry: &Arc<AgentRegistry>) -> Arc<Self> {
        Self::build(
            AgentCore::with_id(id, DIRECTOR_AGENT_TYPE, registry),
            Box::new(CapabilitySelector),
        )
    }

    /// A director using a custom selection policy.
    pub fn with_selector<S>(id: impl Into<String>, registry: &Arc<AgentRegistry>, selector: S) -> Arc<Self>
    where
        S: AgentSelector + 'static,
    {
        Self::build(
            AgentCore::with_id(id, DIRECTOR_AGENT_TYPE, registry),
            Box::new(selector),
        )
    }

    fn build(core: AgentCore, selector: Box<dyn AgentSelector>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            core.add_capability("task_delegation");
            core.add_capability("agent_coordination");

            let weak = this.clone();
            core.register_handler(types::DELEGATE_TASK, move |message| {
                let director = upgrade(&weak)?;
                let request: DelegateTask = message.parse()?;
                director.assign(&request.task_type, request.description.as_deref(), request.parameters)
            });

            let weak = this.clone();
            core.register_handler(types::TASK_STATUS, move |message| {
                let director = upgrade(&weak)?;
                let update: TaskStatusUpdate = message.parse()?;
                director.record_status(update)
            });

            let weak = this.clone();
            core.register_handler(types::REGISTER_AGENT, move |message| {
                let director = upgrade(&weak)?;
                let request: RegisterAgent = message.parse()?;
                director.add_specialized(&request.agent_id)?;
                Ok(json!({ "registered": request.agent_id }))
            });

            Self {
                core,
                specialized: RwLock::new(BTreeSet::new()),
                tasks: RwLock::new(HashMap::new()),
                selector,
                this: this.clone(),
            }
        })
    }

    /// Opens a record in status `created` and returns its id.
    pub fn create_task(&self, task_type: &str, description: Option<&str>, parameters: Value) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let task = DirectorTask {
            id: id.clone(),
            task_type: task_type.to_string(),
            description: description.map(str::to_string),
            parameters,
            status: DelegationStatus::Created,
            assigned_agent: None,
            reported_status: None,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };
        self.tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), task);
        info!(event = "director.task_created", director_id = %self.id(), task_id = %id, task_type = %task_type);
        id
    }

    pub fn get_task(&self, task_id: &str) -> Option<DirectorTask> {
        self.tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_id)
            .cloned()
    }

    /// All records, oldest first.
    pub fn tasks(&self) -> Vec<DirectorTask> {
        let mut tasks: Vec<DirectorTask> = self
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    /// Ids of the specialized agents that joined this director, ascending.
    pub fn specialized_agents(&self) -> Vec<String> {
        self.specialized
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Adds a registered agent to this director's set.
    pub fn add_specialized(&self, agent_id: &str) -> AgentResult<()> {
        if self.core.registry()?.get(agent_id).is_none() {
            return Err(AgentError::AgentNotFound(agent_id.to_string()));
        }
        let added = self
            .specialized
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent_id.to_string());
        if added {
            info!(event = "director.agent_joined", director_id = %self.id(), agent_id = %agent_id);
        }
        Ok(())
    }

    pub fn remove_specialized(&self, agent_id: &str) -> bool {
        self.specialized
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(agent_id)
    }

    /// Picks one of this director's agents for a task, if any fits.
    pub fn select_agent_for_task(&self, task_type: &str, parameters: &Value) -> Option<String> {
        let registry = self.core.registry().ok()?;
        let candidates: Vec<Arc<dyn Agent>> = self
            .specialized_agents()
            .iter()
            .filter_map(|id| registry.get(id))
            .collect();
        self.selector.select(task_type, parameters, &candidates)
    }

    /// Sends the task to `agent_id` as `execute_task` and returns the
    /// agent's result.
    ///
    /// The record becomes `delegated` on success unless the agent already
    /// reported a final status. On any failure it goes back to `created`.
    pub fn delegate_task(&self, task_id: &str, agent_id: &str) -> AgentResult<Value> {
        let content = {
            let tasks = self.tasks.read().unwrap_or_else(PoisonError::into_inner);
            let task = tasks
                .get(task_id)
                .ok_or_else(|| AgentError::TaskNotFound(task_id.to_string()))?;
            ExecuteTask {
                task_id: task.id.clone(),
                task_type: task.task_type.clone(),
                description: task.description.clone(),
                parameters: task.parameters.clone(),
            }
        };
        let content = serde_json::to_value(content)?;

        // The recipient may report back through task_status while this call
        // is in flight, so no lock is held here.
        let outcome = match self.core.send_message(agent_id, types::EXECUTE_TASK, content) {
            Ok(response) => response.into_result(),
            Err(err) => Err(err.to_string()),
        };

        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| AgentError::TaskNotFound(task_id.to_string()))?;
        task.updated_at = Utc::now();
        match outcome {
            Ok(payload) => {
                if task.status == DelegationStatus::Created {
                    task.status = DelegationStatus::Delegated;
                }
                task.assigned_agent = Some(agent_id.to_string());
                if task.result.is_none() {
                    task.result = Some(payload.clone());
                }
                info!(event = "director.delegated", director_id = %self.id(), task_id = %task_id, agent_id = %agent_id);
                Ok(payload)
            }
            Err(error) => {
                task.status = DelegationStatus::Created;
                task.assigned_agent = None;
                warn!(event = "director.delegation_failed", director_id = %self.id(), task_id = %task_id, agent_id = %agent_id, error = %error);
                let err = AgentError::Delegation(format!("agent {agent_id} failed task {task_id}: {error}"));
                task.error = Some(error);
                Err(err)
            }
        }
    }

    /// Creates a task, selects an agent and delegates to it.
    pub fn assign(&self, task_type: &str, description: Option<&str>, parameters: Value) -> AgentResult<Value> {
        let agent_id = self.select_agent_for_task(task_type, &parameters);
        let task_id = self.create_task(task_type, description, parameters);
        let Some(agent_id) = agent_id else {
            warn!(event = "director.no_agent", director_id = %self.id(), task_id = %task_id, task_type = %task_type);
            return Err(AgentError::Delegation(format!(
                "no specialized agent available for task type {task_type}"
            )));
        };
        self.delegate_task(&task_id, &agent_id)
    }

    fn record_status(&self, update: TaskStatusUpdate) -> AgentResult<Value> {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let task = tasks
            .get_mut(&update.task_id)
            .ok_or_else(|| AgentError::TaskNotFound(update.task_id.clone()))?;
        task.status = update.status;
        task.reported_status = Some(update.status);
        if update.result.is_some() {
            task.result = update.result;
        }
        if update.error.is_some() {
            task.error = update.error;
        }
        task.updated_at = Utc::now();
        info!(event = "director.task_status", director_id = %self.core.id(), task_id = %update.task_id, status = ?update.status);
        Ok(json!({ "task_id": update.task_id, "status": update.status }))
    }
}

fn upgrade(weak: &Weak<DirectorAgent>) -> AgentResult<Arc<DirectorAgent>> {
    weak.upgrade()
        .ok_or_else(|| AgentError::Handler("director is no longer alive".to_string()))
}

impl Agent for DirectorAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    /// Registers the director and marks it active.
    fn initialize(&self) -> AgentResult<()> {
        let registry = match self.core.registry() {
            Ok(registry) => registry,
            Err(err) => {
                self.core.set_status(AgentStatus::Error);
                return Err(err);
            }
        };
        if let Some(this) = self.this.upgrade() {
            registry.register(this);
        }
        self.core.set_status(AgentStatus::Active);
        Ok(())
    }
}
