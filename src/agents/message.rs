//! Message envelope and protocol payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{AgentError, AgentResult};

/// Message types understood by the built-in agents.
pub mod types {
    pub const DELEGATE_TASK: &str = "delegate_task";
    pub const TASK_STATUS: &str = "task_status";
    pub const REGISTER_AGENT: &str = "register_agent";
    pub const EXECUTE_TASK: &str = "execute_task";
}

/// Envelope delivered to [`Agent::handle_message`](super::Agent::handle_message).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Empty when the sender left it out; such messages are rejected.
    #[serde(rename = "type", default)]
    pub message_type: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub content: Value,
}

impl Message {
    pub fn new(
        message_type: impl Into<String>,
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        content: Value,
    ) -> Self {
        Self {
            message_type: message_type.into(),
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            timestamp: Utc::now(),
            content,
        }
    }

    /// Deserializes the content into a protocol payload.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> AgentResult<T> {
        serde_json::from_value(self.content.clone())
            .map_err(|e| AgentError::Validation(format!("{} content: {e}", self.message_type)))
    }
}

/// Outcome of a delivered message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn err(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.to_string()),
        }
    }

    /// The payload, or the error message.
    pub fn into_result(self) -> Result<Value, String> {
        if self.success {
            Ok(self.payload.unwrap_or(Value::Null))
        } else {
            Err(self.error.unwrap_or_else(|| "unknown error".to_string()))
        }
    }
}

impl From<AgentResult<Value>> for Response {
    fn from(result: AgentResult<Value>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(err) => Self::err(err),
        }
    }
}

/// Status of a task in a director's delegation bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Created,
    Delegated,
    Completed,
    Failed,
}

/// `delegate_task` content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegateTask {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Value,
}

/// `task_status` content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusUpdate {
    pub task_id: String,
    pub status: DelegationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `register_agent` content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterAgent {
    pub agent_id: String,
    pub agent_type: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// `execute_task` content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteTask {
    pub task_id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Value,
}
