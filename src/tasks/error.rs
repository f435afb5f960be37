//! Error types for the task manager.

use super::types::TaskStatus;
use crate::agents::AgentError;
use crate::optimizer::OptimizerError;

/// Errors produced while creating, submitting or running tasks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskError {
    #[error("invalid task: {0}")]
    Validation(String),

    #[error("no handler registered for task type {0}")]
    NoHandler(String),

    #[error("{0}")]
    Execution(String),

    #[error("invalid task status transition {from:?} -> {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("task manager is not running")]
    NotRunning,

    #[error("task payload (de)serialization failed: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for TaskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

impl From<AgentError> for TaskError {
    fn from(err: AgentError) -> Self {
        Self::Execution(err.to_string())
    }
}

impl From<OptimizerError> for TaskError {
    fn from(err: OptimizerError) -> Self {
        Self::Execution(err.to_string())
    }
}

/// Result type for task operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;
