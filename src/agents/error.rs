//! Error types for the agent hierarchy.

use crate::optimizer::OptimizerError;

/// Errors produced while exchanging messages between agents.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("message has no type")]
    MissingMessageType,

    #[error("unsupported message type: {0}")]
    UnsupportedMessage(String),

    #[error("unsupported task type: {0}")]
    UnsupportedTask(String),

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("delegation failed: {0}")]
    Delegation(String),

    #[error("message call depth {depth} exceeds the limit of {max}")]
    CallDepthExceeded { depth: usize, max: usize },

    #[error("agent registry is no longer available")]
    RegistryUnavailable,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("handler failed: {0}")]
    Handler(String),

    #[error("invalid message content: {0}")]
    Validation(String),
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<OptimizerError> for AgentError {
    fn from(err: OptimizerError) -> Self {
        Self::Handler(err.to_string())
    }
}

/// Result type for agent operations.
pub type AgentResult<T> = std::result::Result<T, AgentError>;
