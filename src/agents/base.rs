//! Agent core: identity, capabilities, memory and message dispatch.
//!
//! Message passing is a synchronous call: [`AgentCore::send_message`]
//! resolves the recipient through the registry and runs its handler on the
//! caller's thread. Nesting is bounded by a per-thread call chain of at most
//! [`MAX_CALL_DEPTH`] deliveries, and no agent lock is held while a message
//! is in flight.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{AgentError, AgentResult};
use super::message::{Message, Response};
use super::registry::AgentRegistry;

/// Deepest synchronous message nesting allowed on one thread.
pub const MAX_CALL_DEPTH: usize = 8;

thread_local! {
    static CALL_CHAIN: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Ids of the agents currently handling a message on this thread,
/// outermost first.
pub fn call_chain() -> Vec<String> {
    CALL_CHAIN.with(|chain| chain.borrow().clone())
}

/// Pops the call chain entry pushed by [`CallGuard::enter`].
struct CallGuard;

impl CallGuard {
    fn enter(agent_id: &str) -> AgentResult<Self> {
        CALL_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain.len() >= MAX_CALL_DEPTH {
                return Err(AgentError::CallDepthExceeded {
                    depth: chain.len() + 1,
                    max: MAX_CALL_DEPTH,
                });
            }
            chain.push(agent_id.to_string());
            Ok(CallGuard)
        })
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        CALL_CHAIN.with(|chain| {
            chain.borrow_mut().pop();
        });
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handler for one message type.
pub type MessageHandler = Arc<dyn Fn(&Message) -> AgentResult<Value> + Send + Sync>;

/// Lifecycle of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Initialized,
    Active,
    Inactive,
    Error,
}

/// State shared by every agent kind.
pub struct AgentCore {
    id: String,
    agent_type: String,
    capabilities: RwLock<BTreeSet<String>>,
    status: RwLock<AgentStatus>,
    memory: RwLock<HashMap<String, Value>>,
    handlers: RwLock<HashMap<String, MessageHandler>>,
    registry: Weak<AgentRegistry>,
}

impl AgentCore {
    /// A core with a generated id of the form `{agent_type}-{uuid}`.
    pub fn new(agent_type: impl Into<String>, registry: &Arc<AgentRegistry>) -> Self {
        let agent_type = agent_type.into();
        let id = format!("{agent_type}-{}", Uuid::new_v4());
        Self::with_id(id, agent_type, registry)
    }

    pub fn with_id(
        id: impl Into<String>,
        agent_type: impl Into<String>,
        registry: &Arc<AgentRegistry>,
    ) -> Self {
        Self {
            id: id.into(),
            agent_type: agent_type.into(),
            capabilities: RwLock::new(BTreeSet::new()),
            status: RwLock::new(AgentStatus::Initialized),
            memory: RwLock::new(HashMap::new()),
            handlers: RwLock::new(HashMap::new()),
            registry: Arc::downgrade(registry),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent_type(&self) -> &str {
        &self.agent_type
    }

    /// Capabilities, sorted.
    pub fn capabilities(&self) -> Vec<String> {
        self.capabilities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(capability)
    }

    /// Capabilities only grow; there is no removal.
    pub fn add_capability(&self, capability: impl Into<String>) {
        self.capabilities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(capability.into());
    }

    pub fn status(&self) -> AgentStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_status(&self, status: AgentStatus) {
        let mut current = self.status.write().unwrap_or_else(PoisonError::into_inner);
        let previous = *current;
        if previous != status {
            debug!(event = "agent.status", agent_id = %self.id, from = ?previous, to = ?status);
            *current = status;
        }
    }

    pub fn remember(&self, key: impl Into<String>, value: Value) {
        self.memory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    pub fn recall(&self, key: &str) -> Option<Value> {
        self.memory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn forget(&self, key: &str) -> Option<Value> {
        self.memory
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Registers the handler for `message_type`, returning the one it
    /// replaces.
    pub fn register_handler<F>(&self, message_type: impl Into<String>, handler: F) -> Option<MessageHandler>
    where
        F: Fn(&Message) -> AgentResult<Value> + Send + Sync + 'static,
    {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message_type.into(), Arc::new(handler))
    }

    pub fn handles(&self, message_type: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(message_type)
    }

    pub fn registry(&self) -> AgentResult<Arc<AgentRegistry>> {
        self.registry.upgrade().ok_or(AgentError::RegistryUnavailable)
    }

    /// Dispatches `message` to its handler.
    ///
    /// Never panics: missing types, unknown types, handler errors and
    /// handler panics all come back as `success: false`.
    pub fn handle_message(&self, message: &Message) -> Response {
        Response::from(self.dispatch(message))
    }

    fn dispatch(&self, message: &Message) -> AgentResult<Value> {
        if message.message_type.trim().is_empty() {
            warn!(event = "message.rejected", agent_id = %self.id, sender_id = %message.sender_id, reason = "missing type");
            return Err(AgentError::MissingMessageType);
        }

        let _guard = CallGuard::enter(&self.id).inspect_err(|err| {
            warn!(event = "message.rejected", agent_id = %self.id, message_type = %message.message_type, error = %err);
        })?;

        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.message_type)
            .cloned();
        let Some(handler) = handler else {
            warn!(event = "message.unsupported", agent_id = %self.id, message_type = %message.message_type);
            return Err(AgentError::UnsupportedMessage(message.message_type.clone()));
        };

        debug!(event = "message.dispatch", agent_id = %self.id, message_type = %message.message_type, sender_id = %message.sender_id);
        let result = catch_unwind(AssertUnwindSafe(|| handler(message))).unwrap_or_else(|payload| {
            Err(AgentError::Handler(format!(
                "{} handler panicked: {}",
                message.message_type,
                panic_message(&*payload)
            )))
        });
        if let Err(err) = &result {
            warn!(event = "message.failed", agent_id = %self.id, message_type = %message.message_type, error = %err);
        }
        result
    }

    /// Delivers a message to `recipient_id` and waits for its handler.
    ///
    /// `Err` means the message could not be delivered; a delivered message
    /// whose handler failed comes back as `Ok` with `success: false`.
    pub fn send_message(&self, recipient_id: &str, message_type: &str, content: Value) -> AgentResult<Response> {
        let registry = self.registry()?;
        let recipient = registry
            .get(recipient_id)
            .ok_or_else(|| AgentError::AgentNotFound(recipient_id.to_string()))?;
        let message = Message::new(message_type, self.id.as_str(), recipient_id, content);
        Ok(recipient.handle_message(&message))
    }
}

impl std::fmt::Debug for AgentCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentCore")
            .field("id", &self.id)
            .field("agent_type", &self.agent_type)
            .field("status", &self.status())
            .field("capabilities", &self.capabilities())
            .finish_non_exhaustive()
    }
}

/// An addressable actor.
///
/// Implementors expose their [`AgentCore`]; everything else has a default.
pub trait Agent: Send + Sync {
    fn core(&self) -> &AgentCore;

    fn id(&self) -> &str {
        self.core().id()
    }

    fn agent_type(&self) -> &str {
        self.core().agent_type()
    }

    fn status(&self) -> AgentStatus {
        self.core().status()
    }

    fn capabilities(&self) -> Vec<String> {
        self.core().capabilities()
    }

    fn initialize(&self) -> AgentResult<()> {
        self.core().set_status(AgentStatus::Active);
        Ok(())
    }

    fn shutdown(&self) {
        self.core().set_status(AgentStatus::Inactive);
    }

    fn handle_message(&self, message: &Message) -> Response {
        self.core().handle_message(message)
    }

    fn send_message(&self, recipient_id: &str, message_type: &str, content: Value) -> AgentResult<Response> {
        self.core().send_message(recipient_id, message_type, content)
    }
}
