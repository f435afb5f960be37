//! Tracing setup and run-scoped spans.
//!
//! Library code only emits `tracing` events. Embedding binaries call
//! [`init_tracing`] once at start-up to install a subscriber.
//!
//! * `LEAGUE_OPT_LOG` is an `EnvFilter` directive (default `info`).
//! * `LEAGUE_OPT_LOG_FORMAT=json` switches to newline-delimited JSON.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive variable.
pub const LOG_ENV: &str = "LEAGUE_OPT_LOG";
/// Output format variable, `json` or anything else for text.
pub const LOG_FORMAT_ENV: &str = "LEAGUE_OPT_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global subscriber from the environment.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init_tracing() {
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    init_tracing_with(json, DEFAULT_DIRECTIVE);
}

/// Installs the global subscriber with an explicit format and fallback
/// directive. `LEAGUE_OPT_LOG` still takes precedence when set.
pub fn init_tracing_with(json: bool, default_directive: &str) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

/// RAII guard entering a task-scoped span.
///
/// Everything logged while the guard lives carries the `task_id` field.
///
/// ```
/// use league_opt::telemetry::TaskSpan;
///
/// let _span = TaskSpan::enter("7f3c", "optimize_schedule");
/// tracing::info!(event = "handler.progress");
/// ```
pub struct TaskSpan {
    _span: tracing::span::EnteredSpan,
}

impl TaskSpan {
    pub fn enter(task_id: &str, task_type: &str) -> Self {
        let span = tracing::info_span!("league_opt.task", task_id = %task_id, task_type = %task_type);
        Self {
            _span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing_with(true, "debug");
    }

    #[test]
    fn test_task_span_enter() {
        let _span = TaskSpan::enter("task-1", "noop");
        tracing::debug!(event = "inside.span");
    }
}
