//! Error types for the optimizer framework.

/// Errors produced by the engines, the factory and the optimization service.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("invalid {engine} configuration: {reason}")]
    InvalidConfig { engine: String, reason: String },

    #[error("unknown optimization algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("optimization failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Schedule(#[from] crate::schedule::ScheduleError),

    #[error("configuration (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

impl OptimizerError {
    pub(crate) fn config(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            engine: engine.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;
