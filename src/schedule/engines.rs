//! Schedule-specialized engine variants.
//!
//! These are what the optimizer factory hands out for the `schedule`
//! domain: the generic engines wired to [`ScheduleProblem`] and a
//! [`ScheduleEvaluator`] with the configured constraint weights.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::model::Schedule;
use super::problem::ScheduleProblem;
use super::scoring::ScheduleEvaluator;
use super::weights::ConstraintWeights;
use crate::ga::{GeneticAlgorithm, GeneticConfig};
use crate::optimizer::{
    Optimizer, OptimizerResult, GENETIC_ALGORITHM, SCHEDULE_DOMAIN, SIMULATED_ANNEALING,
};
use crate::problem::SearchOutcome;
use crate::sa::{AnnealingConfig, SimulatedAnnealing};

/// Config key holding the [`ConstraintWeights`].
pub const CONSTRAINT_WEIGHTS_KEY: &str = "constraint_weights";

fn weights_from(config: &Value) -> OptimizerResult<ConstraintWeights> {
    match config.get(CONSTRAINT_WEIGHTS_KEY) {
        Some(value) if !value.is_null() => Ok(serde_json::from_value(value.clone())?),
        _ => Ok(ConstraintWeights::default()),
    }
}

fn with_weights(mut engine_config: Value, weights: &ConstraintWeights) -> Value {
    if let (Value::Object(map), Ok(weights)) = (&mut engine_config, serde_json::to_value(weights)) {
        map.insert(CONSTRAINT_WEIGHTS_KEY.to_string(), weights);
    }
    engine_config
}

/// Simulated Annealing specialized for league schedules.
pub struct ScheduleAnnealing {
    engine: SimulatedAnnealing,
    weights: ConstraintWeights,
    evaluator: Arc<dyn ScheduleEvaluator>,
}

impl ScheduleAnnealing {
    pub fn new(
        config: AnnealingConfig,
        weights: ConstraintWeights,
        evaluator: Arc<dyn ScheduleEvaluator>,
    ) -> OptimizerResult<Self> {
        Ok(Self {
            engine: SimulatedAnnealing::new(config)?,
            weights,
            evaluator,
        })
    }

    /// Builds from a merged factory configuration.
    pub fn from_config(config: &Value, evaluator: Arc<dyn ScheduleEvaluator>) -> OptimizerResult<Self> {
        let engine_config: AnnealingConfig = serde_json::from_value(config.clone())?;
        Self::new(engine_config, weights_from(config)?, evaluator)
    }
}

impl fmt::Debug for ScheduleAnnealing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleAnnealing")
            .field("config", self.engine.config())
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

impl Optimizer for ScheduleAnnealing {
    fn algorithm(&self) -> &str {
        SIMULATED_ANNEALING
    }

    fn domain(&self) -> Option<&str> {
        Some(SCHEDULE_DOMAIN)
    }

    fn effective_config(&self) -> Value {
        with_weights(self.engine.effective_config(), &self.weights)
    }

    fn optimize_schedule(&self, schedule: &Schedule) -> OptimizerResult<SearchOutcome<Schedule>> {
        let problem = ScheduleProblem::new(schedule.clone(), self.weights, Arc::clone(&self.evaluator));
        self.engine.optimize(schedule.clone(), &problem)
    }
}

/// Genetic Algorithm specialized for league schedules.
pub struct ScheduleGenetic {
    engine: GeneticAlgorithm,
    weights: ConstraintWeights,
    evaluator: Arc<dyn ScheduleEvaluator>,
}

impl ScheduleGenetic {
    pub fn new(
        config: GeneticConfig,
        weights: ConstraintWeights,
        evaluator: Arc<dyn ScheduleEvaluator>,
    ) -> OptimizerResult<Self> {
        Ok(Self {
            engine: GeneticAlgorithm::new(config)?,
            weights,
            evaluator,
        })
    }

    /// Builds from a merged factory configuration.
    pub fn from_config(config: &Value, evaluator: Arc<dyn ScheduleEvaluator>) -> OptimizerResult<Self> {
        let engine_config: GeneticConfig = serde_json::from_value(config.clone())?;
        Self::new(engine_config, weights_from(config)?, evaluator)
    }
}

impl fmt::Debug for ScheduleGenetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleGenetic")
            .field("config", self.engine.config())
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

impl Optimizer for ScheduleGenetic {
    fn algorithm(&self) -> &str {
        GENETIC_ALGORITHM
    }

    fn domain(&self) -> Option<&str> {
        Some(SCHEDULE_DOMAIN)
    }

    fn effective_config(&self) -> Value {
        with_weights(self.engine.effective_config(), &self.weights)
    }

    fn optimize_schedule(&self, schedule: &Schedule) -> OptimizerResult<SearchOutcome<Schedule>> {
        let problem = ScheduleProblem::new(schedule.clone(), self.weights, Arc::clone(&self.evaluator));
        self.engine.optimize(schedule.clone(), &problem)
    }
}
