//! Task manager: registry, queue and worker pool.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::{RetentionPolicy, TaskManagerConfig};
use super::error::{TaskError, TaskResult};
use super::types::{Task, TaskFilter, TaskStatus};
use crate::agents::panic_message;
use crate::telemetry::TaskSpan;

/// Runs one task and returns its result payload.
pub type TaskHandlerFn = Arc<dyn Fn(&Task) -> TaskResult<Value> + Send + Sync>;

/// Error recorded on tasks still queued when the manager stops.
pub const STOPPED_BEFORE_EXECUTION: &str = "task manager stopped before execution";

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

enum Job {
    Run(String),
    Stop,
}

/// State shared with the workers.
struct Shared {
    tasks: RwLock<HashMap<String, Task>>,
    handlers: RwLock<HashMap<String, TaskHandlerFn>>,
    retention: RetentionPolicy,
}

impl Shared {
    fn handler(&self, task_type: &str) -> Option<TaskHandlerFn> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_type)
            .cloned()
    }

    /// Runs one dequeued task. Only the worker that moved the task to
    /// `processing` writes it afterwards.
    fn execute(&self, task_id: &str) {
        let task = {
            let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
            let Some(task) = tasks.get_mut(task_id) else {
                warn!(event = "task.missing", task_id = %task_id);
                return;
            };
            if let Err(err) = task.transition(TaskStatus::Processing) {
                warn!(event = "task.skipped", task_id = %task_id, error = %err);
                return;
            }
            task.clone()
        };
        info!(event = "task.started", task_id = %task.id, task_type = %task.task_type);

        let started = Instant::now();
        let outcome = match self.handler(&task.task_type) {
            None => Err(TaskError::NoHandler(task.task_type.clone())),
            Some(handler) => {
                let _span = TaskSpan::enter(&task.id, &task.task_type);
                catch_unwind(AssertUnwindSafe(|| handler(&task))).unwrap_or_else(|payload| {
                    Err(TaskError::Execution(format!(
                        "handler panicked: {}",
                        panic_message(&*payload)
                    )))
                })
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let Some(stored) = tasks.get_mut(task_id) else {
            return;
        };
        let recorded = match outcome {
            Ok(result) => stored.complete(result).map(|()| {
                info!(event = "task.completed", task_id = %task_id, elapsed_ms);
            }),
            Err(err) => {
                warn!(event = "task.failed", task_id = %task_id, elapsed_ms, error = %err);
                stored.fail(err.to_string())
            }
        };
        if let Err(err) = recorded {
            warn!(event = "task.record_failed", task_id = %task_id, error = %err);
        }
    }

    /// Fails a pending task that could not be queued.
    fn fail_unqueued(&self, task_id: &str) {
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = tasks.get_mut(task_id) {
            if task.fail(STOPPED_BEFORE_EXECUTION).is_ok() {
                warn!(event = "task.failed", task_id = %task_id, error = STOPPED_BEFORE_EXECUTION);
            }
        }
    }

    fn purge_expired(&self) -> usize {
        if self.retention.is_unbounded() {
            return 0;
        }
        let now = Utc::now();
        let mut tasks = self.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let before = tasks.len();

        if let Some(ttl) = self.retention.ttl {
            tasks.retain(|_, task| {
                let expired = task.is_terminal()
                    && task
                        .completed_at
                        .is_some_and(|at| (now - at).to_std().unwrap_or_default() > ttl);
                !expired
            });
        }

        if let Some(max) = self.retention.max_retained {
            let mut finished: Vec<(chrono::DateTime<Utc>, String)> = tasks
                .values()
                .filter(|task| task.is_terminal())
                .map(|task| (task.completed_at.unwrap_or(task.updated_at), task.id.clone()))
                .collect();
            if finished.len() > max {
                finished.sort();
                let excess = finished.len() - max;
                for (_, id) in finished.into_iter().take(excess) {
                    tasks.remove(&id);
                }
            }
        }

        let purged = before - tasks.len();
        if purged > 0 {
            debug!(event = "task.purged", count = purged);
        }
        purged
    }
}

/// Owns the task registry, a work queue and a fixed pool of workers.
///
/// Workers start with the manager and run until [`stop`](Self::stop) (or
/// drop). A handler error or panic fails only its own task.
///
/// ```
/// use league_opt::tasks::{TaskManager, TaskManagerConfig, TaskStatus};
/// use std::time::Duration;
///
/// let manager = TaskManager::start(TaskManagerConfig::default().with_worker_count(1)).unwrap();
/// manager.register_handler("double", |task| {
///     let n = task.parameters["n"].as_i64().unwrap_or(0);
///     Ok(serde_json::json!(n * 2))
/// });
/// let task = manager.create_task("caller", "double", serde_json::json!({"n": 21})).unwrap();
/// let id = manager.submit_task(task).unwrap();
/// let done = manager.wait_for(&id, Duration::from_secs(5)).unwrap();
/// assert_eq!(done.status, TaskStatus::Completed);
/// assert_eq!(done.result, Some(serde_json::json!(42)));
/// manager.stop();
/// ```
pub struct TaskManager {
    shared: Arc<Shared>,
    config: TaskManagerConfig,
    running: Arc<AtomicBool>,
    sender: Mutex<Sender<Job>>,
    receiver: Arc<Mutex<Receiver<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskManager {
    /// Validates `config` and spawns the workers.
    pub fn start(config: TaskManagerConfig) -> TaskResult<Self> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel();
        let manager = Self {
            shared: Arc::new(Shared {
                tasks: RwLock::new(HashMap::new()),
                handlers: RwLock::new(HashMap::new()),
                retention: config.retention,
            }),
            running: Arc::new(AtomicBool::new(true)),
            sender: Mutex::new(sender),
            receiver: Arc::new(Mutex::new(receiver)),
            workers: Mutex::new(Vec::with_capacity(config.worker_count)),
            config,
        };

        for index in 0..manager.config.worker_count {
            let shared = Arc::clone(&manager.shared);
            let receiver = Arc::clone(&manager.receiver);
            let running = Arc::clone(&manager.running);
            let dequeue_timeout = manager.config.dequeue_timeout;
            let handle = thread::Builder::new()
                .name(format!("league-opt-worker-{index}"))
                .spawn(move || worker_loop(index, &shared, &receiver, &running, dequeue_timeout))
                .map_err(|e| TaskError::Execution(format!("failed to spawn worker {index}: {e}")))?;
            manager
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handle);
        }
        info!(event = "task_manager.started", workers = manager.config.worker_count);
        Ok(manager)
    }

    /// Starts a manager configured from the environment.
    pub fn from_env() -> TaskResult<Self> {
        Self::start(TaskManagerConfig::from_env())
    }

    pub fn config(&self) -> &TaskManagerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Sets the handler for `task_type`.
    ///
    /// One handler per type; the last registration wins and the replaced
    /// handler is returned.
    pub fn register_handler<F>(&self, task_type: impl Into<String>, handler: F) -> Option<TaskHandlerFn>
    where
        F: Fn(&Task) -> TaskResult<Value> + Send + Sync + 'static,
    {
        let task_type = task_type.into();
        let previous = self
            .shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task_type.clone(), Arc::new(handler));
        if previous.is_some() {
            warn!(event = "task_handler.replaced", task_type = %task_type);
        } else {
            debug!(event = "task_handler.registered", task_type = %task_type);
        }
        previous
    }

    pub fn unregister_handler(&self, task_type: &str) -> Option<TaskHandlerFn> {
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(task_type)
    }

    pub fn has_handler(&self, task_type: &str) -> bool {
        self.shared.handler(task_type).is_some()
    }

    /// Records a new `pending` task.
    pub fn create_task(&self, agent_id: &str, task_type: &str, parameters: Value) -> TaskResult<Task> {
        if task_type.trim().is_empty() {
            return Err(TaskError::Validation("task_type is required".into()));
        }
        self.shared.purge_expired();

        let task = Task::new(agent_id, task_type, parameters);
        self.shared
            .tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(task.id.clone(), task.clone());
        info!(event = "task.created", task_id = %task.id, task_type = %task_type, agent_id = %agent_id);
        Ok(task)
    }

    /// Queues a pending task and returns its id.
    ///
    /// A task the manager already knows is queued from its stored record;
    /// the fields of the submitted copy are ignored. An unknown task must be
    /// untouched (pending, never started, no result or error).
    ///
    /// A task type without a handler fails the task on the spot; it never
    /// enters the queue and the call still returns its id. After
    /// [`stop`](Self::stop) the task is failed and `NotRunning` returned.
    pub fn submit_task(&self, task: Task) -> TaskResult<String> {
        let task_id = task.id.clone();

        {
            let mut tasks = self.shared.tasks.write().unwrap_or_else(PoisonError::into_inner);
            let task_type = match tasks.get(&task_id) {
                Some(stored) if stored.status != TaskStatus::Pending => {
                    return Err(TaskError::Validation(format!(
                        "task {task_id} is already {:?}",
                        stored.status
                    )));
                }
                Some(stored) => stored.task_type.clone(),
                None => {
                    if task.task_type.trim().is_empty() {
                        return Err(TaskError::Validation("task_type is required".into()));
                    }
                    if !task.is_untouched() {
                        return Err(TaskError::Validation(format!(
                            "task {task_id} must be submitted as a new pending task"
                        )));
                    }
                    let task_type = task.task_type.clone();
                    tasks.insert(task_id.clone(), task);
                    task_type
                }
            };

            if self.shared.handler(&task_type).is_none() {
                let err = TaskError::NoHandler(task_type);
                if let Some(stored) = tasks.get_mut(&task_id) {
                    stored.fail(err.to_string())?;
                }
                warn!(event = "task.rejected", task_id = %task_id, error = %err);
                return Ok(task_id);
            }
        }

        // Holding the sender serializes this against `stop`, so nothing is
        // queued after the final drain.
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_running() || sender.send(Job::Run(task_id.clone())).is_err() {
            drop(sender);
            self.shared.fail_unqueued(&task_id);
            return Err(TaskError::NotRunning);
        }
        info!(event = "task.submitted", task_id = %task_id);
        Ok(task_id)
    }

    /// Snapshot of a task.
    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.shared
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_id)
            .cloned()
    }

    /// Snapshots of the matching tasks, oldest first.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .shared
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    /// Polls until the task is finished or `timeout` passes, then returns
    /// the latest snapshot. `None` for unknown ids.
    pub fn wait_for(&self, task_id: &str, timeout: Duration) -> Option<Task> {
        let deadline = Instant::now() + timeout;
        loop {
            let task = self.get_task(task_id)?;
            if task.is_terminal() || Instant::now() >= deadline {
                return Some(task);
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    /// Evicts finished tasks per the retention policy. Returns how many.
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    /// Fails every still-queued task, signals the workers and joins them
    /// within the shutdown timeout. Idempotent.
    pub fn stop(&self) {
        {
            let _sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
            if !self.running.swap(false, Ordering::AcqRel) {
                return;
            }
        }
        info!(event = "task_manager.stopping");

        let drained: Vec<String> = {
            let receiver = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
            receiver
                .try_iter()
                .filter_map(|job| match job {
                    Job::Run(task_id) => Some(task_id),
                    Job::Stop => None,
                })
                .collect()
        };
        if !drained.is_empty() {
            let mut tasks = self.shared.tasks.write().unwrap_or_else(PoisonError::into_inner);
            for task_id in &drained {
                if let Some(task) = tasks.get_mut(task_id) {
                    if task.fail(STOPPED_BEFORE_EXECUTION).is_ok() {
                        warn!(event = "task.failed", task_id = %task_id, error = STOPPED_BEFORE_EXECUTION);
                    }
                }
            }
        }

        let handles = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        {
            let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
            for _ in &handles {
                let _ = sender.send(Job::Stop);
            }
        }

        let deadline = Instant::now() + self.config.shutdown_timeout;
        for handle in handles {
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(WAIT_POLL_INTERVAL);
            }
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!(event = "worker.panicked");
                }
            } else {
                warn!(event = "worker.detached", reason = "shutdown timeout elapsed");
            }
        }
        info!(event = "task_manager.stopped", drained = drained.len());
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    index: usize,
    shared: &Shared,
    receiver: &Mutex<Receiver<Job>>,
    running: &AtomicBool,
    dequeue_timeout: Duration,
) {
    debug!(event = "worker.started", worker = index);
    loop {
        let job = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv_timeout(dequeue_timeout);
        match job {
            Ok(Job::Run(task_id)) => shared.execute(&task_id),
            Ok(Job::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if !running.load(Ordering::Acquire) {
                    break;
                }
            }
        }
    }
    debug!(event = "worker.stopped", worker = index);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn manager(workers: usize) -> TaskManager {
        TaskManager::start(
            TaskManagerConfig::default()
                .with_worker_count(workers)
                .with_dequeue_timeout(Duration::from_millis(20)),
        )
        .unwrap()
    }

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn test_completed_task() {
        let manager = manager(2);
        manager.register_handler("echo", |task| Ok(task.parameters.clone()));
        let task = manager.create_task("a", "echo", json!({"k": "v"})).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);

        let id = manager.submit_task(task).unwrap();
        let done = manager.wait_for(&id, WAIT).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.result, Some(json!({"k": "v"})));
        assert!(done.started_at.is_some());
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_unregistered_type_fails_immediately() {
        let manager = manager(1);
        let task = manager.create_task("a", "mystery", Value::Null).unwrap();
        let id = manager.submit_task(task).unwrap();
        let snapshot = manager.get_task(&id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert!(snapshot.started_at.is_none());
        assert_eq!(
            snapshot.error.as_deref(),
            Some("no handler registered for task type mystery")
        );
    }

    #[test]
    fn test_handler_error_and_panic_do_not_stop_workers() {
        let manager = manager(1);
        manager.register_handler("bad", |_| Err(TaskError::Execution("bad input".into())));
        manager.register_handler("boom", |_| panic!("worker must survive"));
        manager.register_handler("ok", |_| Ok(json!("fine")));

        let bad = manager.submit_task(manager.create_task("a", "bad", Value::Null).unwrap()).unwrap();
        let boom = manager.submit_task(manager.create_task("a", "boom", Value::Null).unwrap()).unwrap();
        let ok = manager.submit_task(manager.create_task("a", "ok", Value::Null).unwrap()).unwrap();

        let bad = manager.wait_for(&bad, WAIT).unwrap();
        assert_eq!(bad.status, TaskStatus::Failed);
        assert_eq!(bad.error.as_deref(), Some("bad input"));

        let boom = manager.wait_for(&boom, WAIT).unwrap();
        assert_eq!(boom.status, TaskStatus::Failed);
        assert!(boom.error.unwrap().contains("worker must survive"));

        assert_eq!(manager.wait_for(&ok, WAIT).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_last_handler_registration_wins() {
        let manager = manager(1);
        assert!(manager.register_handler("t", |_| Ok(json!(1))).is_none());
        assert!(manager.register_handler("t", |_| Ok(json!(2))).is_some());
        let id = manager.submit_task(manager.create_task("a", "t", Value::Null).unwrap()).unwrap();
        assert_eq!(manager.wait_for(&id, WAIT).unwrap().result, Some(json!(2)));
    }

    #[test]
    fn test_resubmitting_finished_task_rejected() {
        let manager = manager(1);
        manager.register_handler("t", |_| Ok(Value::Null));
        let task = manager.create_task("a", "t", Value::Null).unwrap();
        let id = manager.submit_task(task.clone()).unwrap();
        manager.wait_for(&id, WAIT).unwrap();
        assert!(matches!(manager.submit_task(task), Err(TaskError::Validation(_))));
    }

    #[test]
    fn test_empty_task_type_rejected() {
        let manager = manager(1);
        assert!(matches!(
            manager.create_task("a", " ", Value::Null),
            Err(TaskError::Validation(_))
        ));
    }

    #[test]
    fn test_list_tasks_filters() {
        let manager = manager(1);
        manager.register_handler("t", |_| Ok(Value::Null));
        let first = manager.submit_task(manager.create_task("alice", "t", Value::Null).unwrap()).unwrap();
        manager.create_task("bob", "t", Value::Null).unwrap();
        manager.wait_for(&first, WAIT).unwrap();

        assert_eq!(manager.list_tasks(&TaskFilter::default()).len(), 2);
        let pending = manager.list_tasks(&TaskFilter::default().with_status(TaskStatus::Pending));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].agent_id, "bob");
        assert_eq!(manager.list_tasks(&TaskFilter::default().with_agent("alice"))[0].id, first);
    }

    #[test]
    fn test_submit_after_stop() {
        let manager = manager(1);
        manager.register_handler("t", |_| Ok(Value::Null));
        manager.stop();
        assert!(!manager.is_running());
        let task = manager.create_task("a", "t", Value::Null).unwrap();
        let id = task.id.clone();
        assert_eq!(manager.submit_task(task), Err(TaskError::NotRunning));

        let stored = manager.get_task(&id).unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);
        assert_eq!(stored.error.as_deref(), Some(STOPPED_BEFORE_EXECUTION));
        assert!(stored.started_at.is_none());
        manager.stop();
    }

    #[test]
    fn test_submit_uses_stored_record() {
        let manager = manager(1);
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        manager.register_handler("count", move |task| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(task.parameters.clone())
        });
        manager.register_handler("other", |_| Ok(json!("other")));

        let mut task = manager.create_task("a", "count", json!({"n": 1})).unwrap();
        task.status = TaskStatus::Completed;
        task.task_type = "other".into();
        task.parameters = json!({"n": 2});
        task.result = Some(json!("forged"));

        let id = manager.submit_task(task).unwrap();
        let done = manager.wait_for(&id, WAIT).unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.started_at.is_some());
        assert_eq!(done.task_type, "count");
        assert_eq!(done.result, Some(json!({"n": 1})));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_task_must_be_untouched() {
        let manager = manager(1);
        manager.register_handler("t", |_| Ok(Value::Null));

        let mut finished = Task::new("a", "t", Value::Null);
        finished.status = TaskStatus::Completed;
        let id = finished.id.clone();
        assert!(matches!(manager.submit_task(finished), Err(TaskError::Validation(_))));
        assert!(manager.get_task(&id).is_none());

        let mut with_error = Task::new("a", "t", Value::Null);
        with_error.error = Some("early".into());
        assert!(matches!(manager.submit_task(with_error), Err(TaskError::Validation(_))));

        let fresh = Task::new("a", "t", Value::Null);
        let id = manager.submit_task(fresh).unwrap();
        assert_eq!(manager.wait_for(&id, WAIT).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_stop_fails_queued_tasks() {
        let manager = manager(1);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        manager.register_handler("block", move |_| {
            let _ = release_rx
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv_timeout(Duration::from_secs(10));
            Ok(json!("released"))
        });

        let blocking = manager.submit_task(manager.create_task("a", "block", Value::Null).unwrap()).unwrap();
        while manager.get_task(&blocking).unwrap().status == TaskStatus::Pending {
            thread::sleep(Duration::from_millis(5));
        }
        let queued = manager.submit_task(manager.create_task("a", "block", Value::Null).unwrap()).unwrap();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let _ = release_tx.send(());
        });
        manager.stop();
        stopper.join().unwrap();

        assert_eq!(manager.get_task(&blocking).unwrap().status, TaskStatus::Completed);
        let queued = manager.get_task(&queued).unwrap();
        assert_eq!(queued.status, TaskStatus::Failed);
        assert_eq!(queued.error.as_deref(), Some(STOPPED_BEFORE_EXECUTION));
    }

    #[test]
    fn test_max_retained_evicts_oldest_finished() {
        let manager = TaskManager::start(
            TaskManagerConfig::default()
                .with_worker_count(1)
                .with_dequeue_timeout(Duration::from_millis(20))
                .with_retention(RetentionPolicy::default().with_max_retained(2)),
        )
        .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        manager.register_handler("t", move |_| Ok(json!(counter.fetch_add(1, Ordering::SeqCst))));

        let mut ids = Vec::new();
        for _ in 0..3 {
            let id = manager.submit_task(manager.create_task("a", "t", Value::Null).unwrap()).unwrap();
            manager.wait_for(&id, WAIT).unwrap();
            ids.push(id);
        }
        // Creating a task purges first.
        let pending = manager.create_task("a", "t", Value::Null).unwrap();
        assert_eq!(manager.purge_expired(), 0);

        assert!(manager.get_task(&ids[0]).is_none());
        assert!(manager.get_task(&ids[1]).is_some());
        assert!(manager.get_task(&ids[2]).is_some());
        assert!(manager.get_task(&pending.id).is_some());
    }

    #[test]
    fn test_ttl_never_evicts_unfinished() {
        let manager = TaskManager::start(
            TaskManagerConfig::default()
                .with_worker_count(1)
                .with_dequeue_timeout(Duration::from_millis(20))
                .with_retention(RetentionPolicy::default().with_ttl(Duration::ZERO)),
        )
        .unwrap();
        manager.register_handler("t", |_| Ok(Value::Null));
        let done = manager.submit_task(manager.create_task("a", "t", Value::Null).unwrap()).unwrap();
        manager.wait_for(&done, WAIT).unwrap();
        let pending = manager.create_task("a", "other", Value::Null).unwrap();

        thread::sleep(Duration::from_millis(5));
        manager.purge_expired();
        assert!(manager.get_task(&done).is_none());
        assert!(manager.get_task(&pending.id).is_some());
    }
}
