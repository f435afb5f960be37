//! Multi-agent delegation layer.
//!
//! Agents are addressable actors with a capability set and a table of
//! message handlers. A [`DirectorAgent`] keeps its own task records and
//! delegates each task to one of its [`SpecializedAgent`]s, chosen by an
//! [`AgentSelector`]. Messages are delivered synchronously through the
//! shared [`AgentRegistry`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use league_opt::agents::{Agent, AgentRegistry, DirectorAgent, SpecializedAgent};
//!
//! let registry = Arc::new(AgentRegistry::new());
//! let director = DirectorAgent::with_id("director", &registry);
//! director.initialize().unwrap();
//!
//! let greeter = SpecializedAgent::builder("greeter", "greetings")
//!     .with_director("director")
//!     .with_task_handler("greet", |task| Ok(serde_json::json!(format!("hello {}", task.parameters["name"]))))
//!     .build(&registry);
//! greeter.initialize().unwrap();
//!
//! let reply = director.assign("greet", None, serde_json::json!({"name": "league"})).unwrap();
//! assert_eq!(reply, "hello \"league\"");
//! ```

mod base;
mod director;
mod error;
mod message;
mod registry;
mod selection;
mod specialized;

pub(crate) use base::panic_message;
pub use base::{call_chain, Agent, AgentCore, AgentStatus, MessageHandler, MAX_CALL_DEPTH};
pub use director::{DirectorAgent, DirectorTask, DIRECTOR_AGENT_TYPE};
pub use error::{AgentError, AgentResult};
pub use message::{
    types, DelegateTask, DelegationStatus, ExecuteTask, Message, RegisterAgent, Response,
    TaskStatusUpdate,
};
pub use registry::AgentRegistry;
pub use selection::{AgentSelector, CapabilitySelector};
pub use specialized::{
    ScheduleOptimizationAgent, SpecializedAgent, SpecializedAgentBuilder, TaskHandler,
    SCHEDULE_OPTIMIZATION, SCHEDULE_OPTIMIZATION_AGENT_TYPE,
};
