//! Specialized agents: executors for concrete task types.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::{info, warn};

use super::base::{panic_message, Agent, AgentCore, AgentStatus};
use super::error::{AgentError, AgentResult};
use super::message::{types, DelegationStatus, ExecuteTask, RegisterAgent, TaskStatusUpdate};
use super::registry::AgentRegistry;
use crate::schedule::{
    OptimizeScheduleRequest, RoundRobinGenerator, ScheduleGenerator, ScheduleOptimizationService,
    OPTIMIZE_SCHEDULE,
};

/// Executes one task type.
pub type TaskHandler = Arc<dyn Fn(&ExecuteTask) -> AgentResult<Value> + Send + Sync>;

/// Agent that executes tasks from an explicit task-type table.
///
/// The table is fixed at construction. Every task type it holds is also
/// advertised as a capability.
pub struct SpecializedAgent {
    core: AgentCore,
    specialization: String,
    director_id: Option<String>,
    task_handlers: HashMap<String, TaskHandler>,
    this: Weak<SpecializedAgent>,
}

/// Builder for [`SpecializedAgent`].
pub struct SpecializedAgentBuilder {
    agent_type: String,
    specialization: String,
    id: Option<String>,
    director_id: Option<String>,
    capabilities: Vec<String>,
    task_handlers: HashMap<String, TaskHandler>,
}

impl SpecializedAgentBuilder {
    pub fn new(agent_type: impl Into<String>, specialization: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            specialization: specialization.into(),
            id: None,
            director_id: None,
            capabilities: Vec::new(),
            task_handlers: HashMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Director to join on initialization and to report task status to.
    pub fn with_director(mut self, director_id: impl Into<String>) -> Self {
        self.director_id = Some(director_id.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Sets the handler for `task_type`; a later call for the same type wins.
    pub fn with_task_handler<F>(mut self, task_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&ExecuteTask) -> AgentResult<Value> + Send + Sync + 'static,
    {
        self.task_handlers.insert(task_type.into(), Arc::new(handler));
        self
    }

    pub fn build(self, registry: &Arc<AgentRegistry>) -> Arc<SpecializedAgent> {
        let core = match self.id {
            Some(id) => AgentCore::with_id(id, self.agent_type, registry),
            None => AgentCore::new(self.agent_type, registry),
        };
        core.add_capability(self.specialization.clone());
        for capability in self.capabilities {
            core.add_capability(capability);
        }
        for task_type in self.task_handlers.keys() {
            core.add_capability(task_type.clone());
        }

        Arc::new_cyclic(|this: &Weak<SpecializedAgent>| {
            let weak = this.clone();
            core.register_handler(types::EXECUTE_TASK, move |message| {
                let agent = weak
                    .upgrade()
                    .ok_or_else(|| AgentError::Handler("agent is no longer alive".to_string()))?;
                let task: ExecuteTask = message.parse()?;
                agent.execute_task(&task)
            });

            SpecializedAgent {
                core,
                specialization: self.specialization,
                director_id: self.director_id,
                task_handlers: self.task_handlers,
                this: this.clone(),
            }
        })
    }
}

impl SpecializedAgent {
    pub fn builder(agent_type: impl Into<String>, specialization: impl Into<String>) -> SpecializedAgentBuilder {
        SpecializedAgentBuilder::new(agent_type, specialization)
    }

    pub fn specialization(&self) -> &str {
        &self.specialization
    }

    pub fn director_id(&self) -> Option<&str> {
        self.director_id.as_deref()
    }

    /// Task types with a handler, sorted.
    pub fn supported_tasks(&self) -> Vec<String> {
        let mut tasks: Vec<String> = self.task_handlers.keys().cloned().collect();
        tasks.sort();
        tasks
    }

    /// Runs the handler for `task.task_type` and reports the outcome to the
    /// director, if one is known.
    ///
    /// A task type without a handler yields [`AgentError::UnsupportedTask`].
    pub fn execute_task(&self, task: &ExecuteTask) -> AgentResult<Value> {
        let result = match self.task_handlers.get(&task.task_type) {
            None => Err(AgentError::UnsupportedTask(task.task_type.clone())),
            Some(handler) => {
                let handler = Arc::clone(handler);
                catch_unwind(AssertUnwindSafe(|| handler(task))).unwrap_or_else(|payload| {
                    Err(AgentError::Handler(format!(
                        "{} handler panicked: {}",
                        task.task_type,
                        panic_message(&*payload)
                    )))
                })
            }
        };

        match &result {
            Ok(_) => info!(event = "agent.task_completed", agent_id = %self.id(), task_id = %task.task_id, task_type = %task.task_type),
            Err(err) => warn!(event = "agent.task_failed", agent_id = %self.id(), task_id = %task.task_id, task_type = %task.task_type, error = %err),
        }
        self.report(&task.task_id, &result);
        result
    }

    fn report(&self, task_id: &str, result: &AgentResult<Value>) {
        let Some(director_id) = &self.director_id else {
            return;
        };
        let update = match result {
            Ok(payload) => TaskStatusUpdate {
                task_id: task_id.to_string(),
                status: DelegationStatus::Completed,
                result: Some(payload.clone()),
                error: None,
            },
            Err(err) => TaskStatusUpdate {
                task_id: task_id.to_string(),
                status: DelegationStatus::Failed,
                result: None,
                error: Some(err.to_string()),
            },
        };
        let delivered = serde_json::to_value(update)
            .map_err(AgentError::from)
            .and_then(|content| self.core.send_message(director_id, types::TASK_STATUS, content));
        match delivered {
            Ok(response) if response.success => {}
            Ok(response) => {
                warn!(event = "agent.report_rejected", agent_id = %self.id(), director_id = %director_id, task_id = %task_id, error = ?response.error);
            }
            Err(err) => {
                warn!(event = "agent.report_failed", agent_id = %self.id(), director_id = %director_id, task_id = %task_id, error = %err);
            }
        }
    }

    fn join(&self) -> AgentResult<()> {
        let registry = self.core.registry()?;
        if let Some(this) = self.this.upgrade() {
            registry.register(this);
        }
        if let Some(director_id) = &self.director_id {
            let content = serde_json::to_value(RegisterAgent {
                agent_id: self.id().to_string(),
                agent_type: self.agent_type().to_string(),
                capabilities: self.capabilities(),
            })?;
            self.core
                .send_message(director_id, types::REGISTER_AGENT, content)?
                .into_result()
                .map_err(AgentError::Delegation)?;
        }
        Ok(())
    }
}

impl Agent for SpecializedAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    /// Registers with the registry, then joins the director.
    fn initialize(&self) -> AgentResult<()> {
        match self.join() {
            Ok(()) => {
                self.core.set_status(AgentStatus::Active);
                info!(event = "agent.initialized", agent_id = %self.id(), specialization = %self.specialization);
                Ok(())
            }
            Err(err) => {
                self.core.set_status(AgentStatus::Error);
                warn!(event = "agent.initialize_failed", agent_id = %self.id(), error = %err);
                Err(err)
            }
        }
    }
}

/// Agent type of the schedule optimization agent.
pub const SCHEDULE_OPTIMIZATION_AGENT_TYPE: &str = "schedule_optimizer";
/// Specialization of the schedule optimization agent.
pub const SCHEDULE_OPTIMIZATION: &str = "schedule_optimization";

/// Preset for the agent that runs `optimize_schedule` tasks through the
/// [`ScheduleOptimizationService`].
///
/// Advertises `optimize_schedule` plus `optimize_schedule:{algorithm}` for
/// every algorithm the service's factory knows. Add
/// `optimize_schedule:{sport}` capabilities on the returned builder to make
/// the agent preferred for a sport.
pub struct ScheduleOptimizationAgent;

impl ScheduleOptimizationAgent {
    pub fn builder(service: ScheduleOptimizationService) -> SpecializedAgentBuilder {
        Self::builder_with_generator(service, Arc::new(RoundRobinGenerator))
    }

    /// `generator` builds the starting schedule when a task only lists teams.
    pub fn builder_with_generator(
        service: ScheduleOptimizationService,
        generator: Arc<dyn ScheduleGenerator>,
    ) -> SpecializedAgentBuilder {
        let algorithms = service.factory().get_available_algorithms();
        let builder = SpecializedAgentBuilder::new(SCHEDULE_OPTIMIZATION_AGENT_TYPE, SCHEDULE_OPTIMIZATION)
            .with_task_handler(OPTIMIZE_SCHEDULE, move |task| {
                let request: OptimizeScheduleRequest = serde_json::from_value(task.parameters.clone())?;
                let optimized = service.optimize_request(&request, generator.as_ref())?;
                Ok(serde_json::to_value(optimized)?)
            });
        algorithms.into_iter().fold(builder, |builder, algorithm| {
            builder.with_capability(format!("{OPTIMIZE_SCHEDULE}:{algorithm}"))
        })
    }
}
