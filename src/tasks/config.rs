//! Task manager configuration.

use std::time::Duration;

use tracing::warn;

use super::error::{TaskError, TaskResult};

/// Worker count variable.
pub const WORKERS_ENV: &str = "LEAGUE_OPT_WORKERS";
/// Retention TTL of finished tasks, in seconds.
pub const TASK_TTL_ENV: &str = "LEAGUE_OPT_TASK_TTL_SECS";
/// Cap on retained finished tasks.
pub const MAX_TASKS_ENV: &str = "LEAGUE_OPT_MAX_TASKS";

const DEFAULT_WORKERS: usize = 4;

/// Eviction of finished tasks.
///
/// Pending and processing tasks are never evicted. The default keeps
/// everything for the lifetime of the manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Finished tasks older than this are dropped.
    pub ttl: Option<Duration>,
    /// At most this many finished tasks are kept, oldest dropped first.
    pub max_retained: Option<usize>,
}

impl RetentionPolicy {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_retained(mut self, n: usize) -> Self {
        self.max_retained = Some(n);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.ttl.is_none() && self.max_retained.is_none()
    }
}

/// Configuration for [`TaskManager`](super::TaskManager).
///
/// ```
/// use std::time::Duration;
/// use league_opt::tasks::TaskManagerConfig;
///
/// let config = TaskManagerConfig::default()
///     .with_worker_count(2)
///     .with_dequeue_timeout(Duration::from_millis(50));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskManagerConfig {
    /// Worker threads. At least 1.
    pub worker_count: usize,
    /// How long an idle worker blocks on the queue before checking for
    /// shutdown.
    pub dequeue_timeout: Duration,
    /// Upper bound on joining the workers in `stop`.
    pub shutdown_timeout: Duration,
    pub retention: RetentionPolicy,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKERS,
            dequeue_timeout: Duration::from_millis(250),
            shutdown_timeout: Duration::from_secs(5),
            retention: RetentionPolicy::default(),
        }
    }
}

impl TaskManagerConfig {
    pub fn with_worker_count(mut self, n: usize) -> Self {
        self.worker_count = n;
        self
    }

    pub fn with_dequeue_timeout(mut self, timeout: Duration) -> Self {
        self.dequeue_timeout = timeout;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Reads `LEAGUE_OPT_WORKERS`, `LEAGUE_OPT_TASK_TTL_SECS` and
    /// `LEAGUE_OPT_MAX_TASKS`. Unparseable values fall back to the default
    /// with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(workers) = parse_var::<usize>(&lookup, WORKERS_ENV) {
            if workers >= 1 {
                config.worker_count = workers;
            } else {
                warn!(event = "config.invalid", variable = WORKERS_ENV, value = workers, fallback = DEFAULT_WORKERS);
            }
        }
        if let Some(secs) = parse_var::<u64>(&lookup, TASK_TTL_ENV) {
            config.retention.ttl = Some(Duration::from_secs(secs));
        }
        if let Some(max) = parse_var::<usize>(&lookup, MAX_TASKS_ENV) {
            config.retention.max_retained = Some(max);
        }
        config
    }

    pub fn validate(&self) -> TaskResult<()> {
        if self.worker_count == 0 {
            return Err(TaskError::Validation("worker_count must be at least 1".into()));
        }
        if self.dequeue_timeout.is_zero() {
            return Err(TaskError::Validation("dequeue_timeout must be positive".into()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(event = "config.invalid", variable = key, value = %raw, "ignoring unparseable value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TaskManagerConfig::default();
        assert_eq!(config.worker_count, 4);
        assert!(config.retention.is_unbounded());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = TaskManagerConfig::from_lookup(lookup(&[
            (WORKERS_ENV, "8"),
            (TASK_TTL_ENV, "60"),
            (MAX_TASKS_ENV, "1000"),
        ]));
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.retention.ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.retention.max_retained, Some(1000));
    }

    #[test]
    fn test_invalid_env_falls_back() {
        let config = TaskManagerConfig::from_lookup(lookup(&[(WORKERS_ENV, "lots"), (TASK_TTL_ENV, "-5")]));
        assert_eq!(config.worker_count, 4);
        assert!(config.retention.ttl.is_none());

        let config = TaskManagerConfig::from_lookup(lookup(&[(WORKERS_ENV, "0")]));
        assert_eq!(config.worker_count, 4);
    }

    #[test]
    fn test_validate() {
        assert!(TaskManagerConfig::default().with_worker_count(0).validate().is_err());
        assert!(TaskManagerConfig::default()
            .with_dequeue_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }
}
