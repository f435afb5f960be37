//! Schedule optimization service.
//!
//! Resolves constraint weights, builds a `schedule`-domain optimizer
//! through the factory and wraps the outcome in a single result envelope.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::engines::CONSTRAINT_WEIGHTS_KEY;
use super::generator::{GenerationOptions, ScheduleGenerator};
use super::model::Schedule;
use super::scoring::{ScheduleEvaluator, WeightedConstraintEvaluator};
use super::weights::ConstraintWeights;
use crate::optimizer::{
    merge_json, OptimizerError, OptimizerFactory, OptimizerResult, GENETIC_ALGORITHM,
    SCHEDULE_DOMAIN,
};

/// Task type handled by the service.
pub const OPTIMIZE_SCHEDULE: &str = "optimize_schedule";

/// Algorithm used when the caller does not name one.
pub const DEFAULT_ALGORITHM: &str = GENETIC_ALGORITHM;

/// Optimized schedule plus a summary of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedSchedule {
    pub schedule: Schedule,
    pub optimization: OptimizationSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSummary {
    pub algorithm: String,
    pub initial_score: f64,
    pub final_score: f64,
    /// Percent change of the score (absolute delta from a zero score).
    pub improvement: f64,
    /// Engine statistics, tagged with the engine kind.
    pub statistics: Value,
}

/// Parameters of an `optimize_schedule` request.
///
/// Either `schedule` is given, or one is generated from `teams`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeScheduleRequest {
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub algorithm_type: Option<String>,
    /// Engine overrides, optionally with `constraint_weights`.
    #[serde(default)]
    pub config: Value,
}

impl OptimizeScheduleRequest {
    pub fn from_parameters(parameters: &Value) -> OptimizerResult<Self> {
        Ok(serde_json::from_value(parameters.clone())?)
    }

    /// The schedule to start from.
    pub fn initial_schedule(&self, generator: &dyn ScheduleGenerator) -> OptimizerResult<Schedule> {
        if let Some(schedule) = &self.schedule {
            let mut schedule = schedule.clone();
            if schedule.sport.is_none() {
                schedule.sport = self.sport.clone();
            }
            return Ok(schedule);
        }

        let probe = Schedule {
            sport: self.sport.clone(),
            ..Schedule::default()
        };
        let weights = resolve_weights(&probe, &self.config)?;
        let options = GenerationOptions {
            sport: self.sport.clone(),
            season: self.season.clone(),
            ..GenerationOptions::default()
        };
        Ok(generator.generate(&self.teams, &weights, &options)?)
    }
}

/// Entry point used by agents and task handlers to optimize a schedule.
#[derive(Clone)]
pub struct ScheduleOptimizationService {
    factory: Arc<OptimizerFactory>,
}

impl ScheduleOptimizationService {
    pub fn new(factory: Arc<OptimizerFactory>) -> Self {
        Self { factory }
    }

    /// A service over the built-in engines, scoring with `evaluator`.
    pub fn with_evaluator(evaluator: Arc<dyn ScheduleEvaluator>) -> Self {
        Self::new(Arc::new(OptimizerFactory::with_builtin(evaluator)))
    }

    pub fn factory(&self) -> &Arc<OptimizerFactory> {
        &self.factory
    }

    /// Optimizes `schedule` with `algorithm_type` (default
    /// [`DEFAULT_ALGORITHM`]) and the given config overrides.
    pub fn optimize(
        &self,
        schedule: &Schedule,
        algorithm_type: Option<&str>,
        config: &Value,
    ) -> OptimizerResult<OptimizedSchedule> {
        let algorithm = algorithm_type.unwrap_or(DEFAULT_ALGORITHM);
        let mut overrides = match config {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => config.clone(),
            _ => {
                return Err(OptimizerError::config(
                    algorithm,
                    "configuration overrides must be a JSON object",
                ))
            }
        };

        let weights = resolve_weights(schedule, &overrides)?;
        if let Value::Object(map) = &mut overrides {
            map.insert(CONSTRAINT_WEIGHTS_KEY.to_string(), serde_json::to_value(weights)?);
        }

        let optimizer = self
            .factory
            .create_optimizer(algorithm, Some(SCHEDULE_DOMAIN), &overrides)?;

        info!(
            event = "optimization.started",
            algorithm,
            sport = schedule.sport.as_deref().unwrap_or("unspecified"),
            games = schedule.games.len(),
        );
        let outcome = optimizer.optimize_schedule(schedule)?;
        info!(
            event = "optimization.finished",
            algorithm,
            initial_score = outcome.initial_fitness,
            final_score = outcome.fitness,
            improvement = outcome.improvement,
        );

        Ok(OptimizedSchedule {
            optimization: OptimizationSummary {
                algorithm: optimizer.algorithm().to_string(),
                initial_score: outcome.initial_fitness,
                final_score: outcome.fitness,
                improvement: outcome.improvement,
                statistics: serde_json::to_value(&outcome.stats)?,
            },
            schedule: outcome.solution,
        })
    }
}

impl ScheduleOptimizationService {
    /// Resolves the starting schedule of `request` and optimizes it.
    pub fn optimize_request(
        &self,
        request: &OptimizeScheduleRequest,
        generator: &dyn ScheduleGenerator,
    ) -> OptimizerResult<OptimizedSchedule> {
        let schedule = request.initial_schedule(generator)?;
        self.optimize(&schedule, request.algorithm_type.as_deref(), &request.config)
    }
}

impl Default for ScheduleOptimizationService {
    fn default() -> Self {
        Self::with_evaluator(Arc::new(WeightedConstraintEvaluator::default()))
    }
}

/// Weights a run uses.
///
/// Starts from the weights recorded on the schedule (or the baseline),
/// applies the caller's `constraint_weights` override, then the sport
/// overlay. The overlay wins for the sports it covers.
pub fn resolve_weights(schedule: &Schedule, config: &Value) -> OptimizerResult<ConstraintWeights> {
    let mut weights = serde_json::to_value(schedule.constraint_weights.unwrap_or_default())?;
    if let Some(caller) = config.get(CONSTRAINT_WEIGHTS_KEY) {
        merge_json(&mut weights, caller);
    }
    if let Some(overlay) = schedule.sport.as_deref().and_then(ConstraintWeights::for_sport) {
        merge_json(&mut weights, &serde_json::to_value(overlay)?);
    }
    Ok(serde_json::from_value(weights)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::generator::{GenerationOptions, RoundRobinGenerator, ScheduleGenerator};
    use serde_json::json;

    fn league(sport: Option<&str>) -> Schedule {
        let teams: Vec<String> = ["Ajax", "Boca", "Celtic", "Dynamo", "Espanyol"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let options = GenerationOptions {
            sport: sport.map(str::to_string),
            ..GenerationOptions::default()
        };
        RoundRobinGenerator
            .generate(&teams, &ConstraintWeights::default(), &options)
            .unwrap()
    }

    #[test]
    fn test_default_algorithm_is_genetic() {
        let service = ScheduleOptimizationService::default();
        let result = service
            .optimize(&league(None), None, &json!({"max_generations": 5, "seed": 1}))
            .unwrap();
        assert_eq!(result.optimization.algorithm, GENETIC_ALGORITHM);
        assert!(result.optimization.final_score >= result.optimization.initial_score);
        assert_eq!(result.optimization.statistics["engine"], "genetic");
    }

    #[test]
    fn test_envelope_wire_format() {
        let service = ScheduleOptimizationService::default();
        let result = service
            .optimize(
                &league(None),
                Some("simulated_annealing"),
                &json!({"max_iterations": 200, "seed": 2}),
            )
            .unwrap();
        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire["optimization"]["algorithm"], "simulated_annealing");
        assert!(wire["optimization"]["initialScore"].is_number());
        assert!(wire["optimization"]["finalScore"].is_number());
        assert_eq!(wire["optimization"]["statistics"]["engine"], "annealing");
        assert!(wire["schedule"]["games"].is_array());
    }

    #[test]
    fn test_unknown_algorithm() {
        let err = ScheduleOptimizationService::default()
            .optimize(&league(None), Some("ant_colony"), &Value::Null)
            .unwrap_err();
        assert!(matches!(err, OptimizerError::UnknownAlgorithm(_)));
    }

    #[test]
    fn test_non_object_config_rejected() {
        let err = ScheduleOptimizationService::default()
            .optimize(&league(None), None, &json!("fast"))
            .unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_sport_overlay_wins() {
        let weights = resolve_weights(
            &league(Some("Basketball")),
            &json!({"constraint_weights": {"rest_days": 1.0}}),
        )
        .unwrap();
        assert_eq!(weights, ConstraintWeights::for_sport("basketball").unwrap());
    }

    #[test]
    fn test_caller_weights_for_unlisted_sport() {
        let weights = resolve_weights(
            &league(Some("curling")),
            &json!({"constraint_weights": {"rest_days": 1.0}}),
        )
        .unwrap();
        assert_eq!(weights.rest_days, 1.0);
        assert_eq!(weights.travel_distance, 5.0);
    }

    #[test]
    fn test_request_generates_from_teams() {
        let request = OptimizeScheduleRequest::from_parameters(&json!({
            "teams": ["A", "B", "C", "D"],
            "sport": "football",
            "algorithmType": "simulated_annealing",
            "config": {"max_iterations": 100, "seed": 4}
        }))
        .unwrap();
        let result = ScheduleOptimizationService::default()
            .optimize_request(&request, &RoundRobinGenerator)
            .unwrap();
        assert_eq!(result.optimization.algorithm, "simulated_annealing");
        assert_eq!(result.schedule.sport.as_deref(), Some("football"));
        assert_eq!(result.schedule.games.len(), 12);
    }

    #[test]
    fn test_request_without_teams_or_schedule() {
        let err = ScheduleOptimizationService::default()
            .optimize_request(&OptimizeScheduleRequest::default(), &RoundRobinGenerator)
            .unwrap_err();
        assert!(matches!(err, OptimizerError::Schedule(_)));
    }

    #[test]
    fn test_schedule_weights_used_without_override() {
        let mut schedule = league(None);
        schedule.constraint_weights = Some(ConstraintWeights {
            rivalry_games: 9.0,
            ..ConstraintWeights::default()
        });
        let weights = resolve_weights(&schedule, &json!({})).unwrap();
        assert_eq!(weights.rivalry_games, 9.0);
    }
}
