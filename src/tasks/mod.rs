//! Asynchronous task execution.
//!
//! A [`TaskManager`] keeps every task in a shared registry, queues submitted
//! tasks and runs them on a fixed pool of worker threads through handlers
//! registered per task type. Task status only moves forward:
//! `pending -> processing -> {completed, failed}`.

mod config;
mod error;
pub mod handlers;
mod manager;
mod types;

pub use config::{RetentionPolicy, TaskManagerConfig, MAX_TASKS_ENV, TASK_TTL_ENV, WORKERS_ENV};
pub use error::{TaskError, TaskResult};
pub use manager::{TaskHandlerFn, TaskManager, STOPPED_BEFORE_EXECUTION};
pub use types::{Task, TaskFilter, TaskStatus};
