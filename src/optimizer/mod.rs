//! Optimizer registry and the object-safe engine interface.
//!
//! Engines are registered by algorithm name together with their default
//! configuration and optional domain-specialized variants. Callers obtain a
//! configured `Box<dyn Optimizer>` from [`OptimizerFactory::create_optimizer`].

mod engines;
mod error;
mod factory;
mod merge;

use serde_json::Value;

use crate::problem::SearchOutcome;
use crate::schedule::Schedule;

pub use error::{OptimizerError, OptimizerResult};
pub use factory::{OptimizerBuilder, OptimizerFactory, OptimizerRegistration};
pub use merge::merge_json;

/// Registry name of the Simulated Annealing engine.
pub const SIMULATED_ANNEALING: &str = "simulated_annealing";
/// Registry name of the Genetic Algorithm engine.
pub const GENETIC_ALGORITHM: &str = "genetic_algorithm";
/// Domain key of the schedule-specialized variants.
pub const SCHEDULE_DOMAIN: &str = "schedule";

/// A configured engine as handed out by the factory.
pub trait Optimizer: Send + Sync + std::fmt::Debug {
    /// Registry name of the algorithm.
    fn algorithm(&self) -> &str;

    /// Domain of a specialized variant, `None` for a base engine.
    fn domain(&self) -> Option<&str> {
        None
    }

    /// The configuration in effect, after defaults and overrides.
    fn effective_config(&self) -> Value;

    /// Improves a league schedule.
    ///
    /// Base engines know nothing about schedules and report
    /// [`OptimizerError::Unsupported`]; build the optimizer with the
    /// `schedule` domain instead.
    fn optimize_schedule(&self, _schedule: &Schedule) -> OptimizerResult<SearchOutcome<Schedule>> {
        Err(OptimizerError::Unsupported(format!(
            "{} has no schedule specialization, create it with domain \"{SCHEDULE_DOMAIN}\"",
            self.algorithm()
        )))
    }
}
