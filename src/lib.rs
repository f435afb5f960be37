//! Task execution, agent delegation and metaheuristic optimization for
//! sports-league schedules.
//!
//! - **Search framework** ([`problem`], [`sa`], [`ga`]): generic Simulated
//!   Annealing and Genetic Algorithm engines over a caller-supplied
//!   [`SearchProblem`](problem::SearchProblem). Fitness is maximized.
//! - **Optimizer registry** ([`optimizer`]): builds configured engines by
//!   name, deep-merging JSON overrides onto registered defaults, with
//!   domain-specialized variants.
//! - **Schedule domain** ([`schedule`]): the schedule model, generator and
//!   evaluator contracts with baselines, and the optimization service.
//! - **Agents** ([`agents`]): a director delegating tasks to specialized
//!   agents by capability over synchronous messages.
//! - **Tasks** ([`tasks`]): a task registry with a queue and a fixed worker
//!   pool.
//!
//! # Architecture
//!
//! Control flows from a [`TaskManager`](tasks::TaskManager) worker into a
//! registered handler, optionally through a
//! [`DirectorAgent`](agents::DirectorAgent) to a specialized agent, into the
//! [`ScheduleOptimizationService`](schedule::ScheduleOptimizationService),
//! the factory and finally an engine. Engines keep all search state local
//! to one `optimize` call, so concurrent runs on different workers share
//! nothing.

pub mod agents;
pub mod ga;
pub mod optimizer;
pub mod problem;
pub mod sa;
pub mod schedule;
pub mod tasks;
pub mod telemetry;
