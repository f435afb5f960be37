use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use league_opt::agents::{
    Agent, AgentError, AgentRegistry, DelegationStatus, DirectorAgent, ScheduleOptimizationAgent,
    SpecializedAgent,
};
use league_opt::schedule::{ScheduleOptimizationService, OPTIMIZE_SCHEDULE};
use league_opt::tasks::{handlers, TaskFilter, TaskManager, TaskManagerConfig, TaskStatus};
use serde_json::{json, Value};

const WAIT: Duration = Duration::from_secs(30);

fn manager(workers: usize) -> TaskManager {
    league_opt::telemetry::init_tracing_with(false, "warn");
    TaskManager::start(
        TaskManagerConfig::default()
            .with_worker_count(workers)
            .with_dequeue_timeout(Duration::from_millis(20)),
    )
    .unwrap()
}

fn league(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Team {i}")).collect()
}

#[test]
fn test_optimize_schedule_task_with_genetic_algorithm() {
    let manager = manager(2);
    manager.register_handler(
        OPTIMIZE_SCHEDULE,
        handlers::optimize_schedule(ScheduleOptimizationService::default()),
    );

    let task = manager
        .create_task(
            "league-office",
            OPTIMIZE_SCHEDULE,
            json!({
                "teams": league(6),
                "sport": "basketball",
                "algorithmType": "genetic_algorithm",
                "config": {"population_size": 12, "max_generations": 8, "seed": 11}
            }),
        )
        .unwrap();
    let id = manager.submit_task(task).unwrap();
    let done = manager.wait_for(&id, WAIT).unwrap();

    assert_eq!(done.status, TaskStatus::Completed, "error: {:?}", done.error);
    let result = done.result.unwrap();
    let summary = &result["optimization"];
    assert_eq!(summary["algorithm"], "genetic_algorithm");
    assert!(summary["finalScore"].as_f64().unwrap() >= summary["initialScore"].as_f64().unwrap());
    assert_eq!(result["schedule"]["sport"], "basketball");
    assert_eq!(result["schedule"]["games"].as_array().unwrap().len(), 30);
}

#[test]
fn test_concurrent_tasks_keep_their_own_results() {
    let manager = manager(2);
    manager.register_handler(
        OPTIMIZE_SCHEDULE,
        handlers::optimize_schedule(ScheduleOptimizationService::default()),
    );

    let submit = |teams: Vec<String>, algorithm: &str, config: Value| {
        let task = manager
            .create_task(
                "league-office",
                OPTIMIZE_SCHEDULE,
                json!({"teams": teams, "algorithmType": algorithm, "config": config}),
            )
            .unwrap();
        manager.submit_task(task).unwrap()
    };
    let east = submit(
        league(4),
        "genetic_algorithm",
        json!({"population_size": 10, "max_generations": 5, "seed": 5}),
    );
    let west: Vec<String> = (1..=5).map(|i| format!("West {i}")).collect();
    let west = submit(
        west,
        "simulated_annealing",
        json!({"max_iterations": 500, "seed": 5}),
    );

    let east = manager.wait_for(&east, WAIT).unwrap().result.unwrap();
    let west = manager.wait_for(&west, WAIT).unwrap().result.unwrap();

    let teams_of = |result: &Value| -> HashSet<String> {
        result["schedule"]["teams"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t.as_str().unwrap().to_string())
            .collect()
    };
    assert!(teams_of(&east).is_disjoint(&teams_of(&west)));
    assert_eq!(east["optimization"]["algorithm"], "genetic_algorithm");
    assert_eq!(west["optimization"]["algorithm"], "simulated_annealing");
}

#[test]
fn test_misspelled_option_fails_the_task() {
    let manager = manager(1);
    manager.register_handler(
        OPTIMIZE_SCHEDULE,
        handlers::optimize_schedule(ScheduleOptimizationService::default()),
    );
    let task = manager
        .create_task(
            "league-office",
            OPTIMIZE_SCHEDULE,
            json!({"teams": league(4), "config": {"populaton_size": 10}}),
        )
        .unwrap();
    let id = manager.submit_task(task).unwrap();
    let done = manager.wait_for(&id, WAIT).unwrap();
    assert_eq!(done.status, TaskStatus::Failed);
    assert!(done.error.unwrap().contains("populaton_size"));
}

#[test]
fn test_unregistered_task_type_never_processes() {
    let manager = manager(1);
    let id = manager
        .submit_task(manager.create_task("a", "translate", Value::Null).unwrap())
        .unwrap();

    let task = manager.get_task(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.started_at.is_none());
    assert!(manager
        .list_tasks(&TaskFilter::default().with_status(TaskStatus::Processing))
        .is_empty());
}

#[test]
fn test_director_without_agents_keeps_record_created() {
    let registry = Arc::new(AgentRegistry::new());
    let director = DirectorAgent::with_id("director", &registry);
    director.initialize().unwrap();

    let err = director
        .assign(OPTIMIZE_SCHEDULE, None, json!({"teams": league(4)}))
        .unwrap_err();
    assert!(matches!(err, AgentError::Delegation(_)));

    let records = director.tasks();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, DelegationStatus::Created);
    assert!(records[0].assigned_agent.is_none());
}

#[test]
fn test_unsupported_task_reported_as_failed() {
    let registry = Arc::new(AgentRegistry::new());
    let director = DirectorAgent::with_id("director", &registry);
    director.initialize().unwrap();

    // Advertises the task type but has no handler for it.
    let agent = SpecializedAgent::builder("analyst", "analysis")
        .with_id("analyst-1")
        .with_director("director")
        .with_capability("forecast")
        .build(&registry);
    agent.initialize().unwrap();
    assert_eq!(director.specialized_agents(), vec!["analyst-1".to_string()]);

    let task_id = director.create_task("forecast", None, Value::Null);
    assert!(director.delegate_task(&task_id, "analyst-1").is_err());

    let record = director.get_task(&task_id).unwrap();
    assert_eq!(record.reported_status, Some(DelegationStatus::Failed));
    assert!(record.error.unwrap().contains("forecast"));
}

#[test]
fn test_task_manager_to_schedule_agent() {
    let registry = Arc::new(AgentRegistry::new());
    let director = DirectorAgent::with_id("director", &registry);
    director.initialize().unwrap();

    let agent = ScheduleOptimizationAgent::builder(ScheduleOptimizationService::default())
        .with_id("scheduler-1")
        .with_director("director")
        .build(&registry);
    agent.initialize().unwrap();

    let manager = manager(1);
    manager.register_handler(
        OPTIMIZE_SCHEDULE,
        handlers::delegate_to_director(Arc::clone(&director), OPTIMIZE_SCHEDULE),
    );

    let id = manager
        .submit_task(
            manager
                .create_task(
                    "league-office",
                    OPTIMIZE_SCHEDULE,
                    json!({
                        "teams": league(4),
                        "sport": "soccer",
                        "algorithmType": "simulated_annealing",
                        "config": {"max_iterations": 400, "seed": 2}
                    }),
                )
                .unwrap(),
        )
        .unwrap();
    let done = manager.wait_for(&id, WAIT).unwrap();
    assert_eq!(done.status, TaskStatus::Completed, "error: {:?}", done.error);
    assert_eq!(
        done.result.as_ref().unwrap()["optimization"]["algorithm"],
        "simulated_annealing"
    );

    let record = &director.tasks()[0];
    assert_eq!(record.status, DelegationStatus::Completed);
    assert_eq!(record.assigned_agent.as_deref(), Some("scheduler-1"));
    assert_eq!(record.result, done.result);
}
