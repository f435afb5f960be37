//! League schedule domain.
//!
//! The schedule model, the generator and evaluator collaborator contracts
//! with their built-in baselines, the schedule-aware search problem and the
//! optimization service that ties them to the optimizer factory.

mod engines;
mod error;
mod generator;
mod model;
mod problem;
mod scoring;
mod service;
mod weights;

pub use engines::{ScheduleAnnealing, ScheduleGenetic, CONSTRAINT_WEIGHTS_KEY};
pub use error::{ScheduleError, ScheduleResult};
pub use generator::{GenerationOptions, RoundRobinGenerator, ScheduleGenerator};
pub use model::{Game, Schedule};
pub use problem::{ScheduleMove, ScheduleProblem};
pub use scoring::{ScheduleEvaluator, Violations, WeightedConstraintEvaluator};
pub use service::{
    resolve_weights, OptimizationSummary, OptimizeScheduleRequest, OptimizedSchedule,
    ScheduleOptimizationService, DEFAULT_ALGORITHM, OPTIMIZE_SCHEDULE,
};
pub use weights::ConstraintWeights;
