//! Algorithm registry.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::merge::merge_json;
use super::{
    Optimizer, OptimizerError, OptimizerResult, GENETIC_ALGORITHM, SCHEDULE_DOMAIN,
    SIMULATED_ANNEALING,
};
use crate::ga::{GeneticAlgorithm, GeneticConfig};
use crate::sa::{AnnealingConfig, SimulatedAnnealing};
use crate::schedule::{
    ScheduleAnnealing, ScheduleEvaluator, ScheduleGenetic, CONSTRAINT_WEIGHTS_KEY,
};

/// Builds an engine from a fully merged JSON configuration.
pub type OptimizerBuilder =
    Arc<dyn Fn(&Value) -> OptimizerResult<Box<dyn Optimizer>> + Send + Sync>;

/// Registry entry for one algorithm.
#[derive(Clone)]
pub struct OptimizerRegistration {
    /// Builder of the domain-agnostic engine.
    pub engine: OptimizerBuilder,
    /// Builders of specialized variants, by domain.
    pub domains: HashMap<String, OptimizerBuilder>,
    /// Default configuration; overrides are deep-merged onto it.
    pub defaults: Value,
    /// Top-level override keys accepted besides those of `defaults`.
    pub extra_keys: BTreeSet<String>,
}

impl OptimizerRegistration {
    pub fn new<F>(defaults: Value, engine: F) -> Self
    where
        F: Fn(&Value) -> OptimizerResult<Box<dyn Optimizer>> + Send + Sync + 'static,
    {
        Self {
            engine: Arc::new(engine),
            domains: HashMap::new(),
            defaults,
            extra_keys: BTreeSet::new(),
        }
    }

    pub fn with_domain<F>(mut self, domain: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&Value) -> OptimizerResult<Box<dyn Optimizer>> + Send + Sync + 'static,
    {
        self.domains.insert(domain.into(), Arc::new(builder));
        self
    }

    pub fn with_extra_key(mut self, key: impl Into<String>) -> Self {
        self.extra_keys.insert(key.into());
        self
    }

    /// Rejects top-level override keys the algorithm does not know, so a
    /// misspelled option does not silently fall back to its default.
    fn check_keys(&self, algorithm: &str, overrides: &Value) -> OptimizerResult<()> {
        let (Value::Object(overrides), Value::Object(defaults)) = (overrides, &self.defaults) else {
            return Ok(());
        };
        let unknown: Vec<&str> = overrides
            .keys()
            .filter(|key| !defaults.contains_key(*key) && !self.extra_keys.contains(*key))
            .map(String::as_str)
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(OptimizerError::config(
                algorithm,
                format!("unknown option(s): {}", unknown.join(", ")),
            ))
        }
    }
}

/// Maps algorithm names to engines, domain variants and default configs.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use league_opt::optimizer::{OptimizerFactory, SCHEDULE_DOMAIN};
/// use league_opt::schedule::WeightedConstraintEvaluator;
///
/// let factory = OptimizerFactory::with_builtin(Arc::new(WeightedConstraintEvaluator::default()));
/// let optimizer = factory
///     .create_optimizer("genetic_algorithm", Some(SCHEDULE_DOMAIN), &serde_json::json!({"population_size": 20}))
///     .unwrap();
/// assert_eq!(optimizer.effective_config()["population_size"], 20);
/// ```
#[derive(Default)]
pub struct OptimizerFactory {
    registry: RwLock<BTreeMap<String, OptimizerRegistration>>,
}

impl OptimizerFactory {
    /// An empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with Simulated Annealing and the Genetic Algorithm
    /// registered, including their `schedule` variants scored by `evaluator`.
    pub fn with_builtin(evaluator: Arc<dyn ScheduleEvaluator>) -> Self {
        let factory = Self::new();

        let sa_evaluator = Arc::clone(&evaluator);
        factory.register_optimizer(
            SIMULATED_ANNEALING,
            OptimizerRegistration::new(defaults_of(&AnnealingConfig::default()), |config| {
                let config: AnnealingConfig = serde_json::from_value(config.clone())?;
                Ok(Box::new(SimulatedAnnealing::new(config)?))
            })
            .with_domain(SCHEDULE_DOMAIN, move |config| {
                Ok(Box::new(ScheduleAnnealing::from_config(
                    config,
                    Arc::clone(&sa_evaluator),
                )?))
            })
            .with_extra_key(CONSTRAINT_WEIGHTS_KEY),
        );

        let ga_evaluator = evaluator;
        factory.register_optimizer(
            GENETIC_ALGORITHM,
            OptimizerRegistration::new(defaults_of(&GeneticConfig::default()), |config| {
                let config: GeneticConfig = serde_json::from_value(config.clone())?;
                Ok(Box::new(GeneticAlgorithm::new(config)?))
            })
            .with_domain(SCHEDULE_DOMAIN, move |config| {
                Ok(Box::new(ScheduleGenetic::from_config(
                    config,
                    Arc::clone(&ga_evaluator),
                )?))
            })
            .with_extra_key(CONSTRAINT_WEIGHTS_KEY),
        );

        factory
    }

    /// Registers (or replaces) an algorithm at runtime.
    ///
    /// Returns the replaced registration, if any.
    pub fn register_optimizer(
        &self,
        name: impl Into<String>,
        registration: OptimizerRegistration,
    ) -> Option<OptimizerRegistration> {
        let name = name.into();
        let previous = self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), registration);
        if previous.is_some() {
            warn!(event = "optimizer.replaced", algorithm = %name);
        } else {
            debug!(event = "optimizer.registered", algorithm = %name);
        }
        previous
    }

    /// Builds a configured engine.
    ///
    /// `overrides` (a JSON object or `null`) is deep-merged onto the
    /// registered defaults. Top-level keys must be known to the algorithm.
    /// The domain variant is used when one is registered for `domain`,
    /// otherwise the base engine.
    pub fn create_optimizer(
        &self,
        algorithm: &str,
        domain: Option<&str>,
        overrides: &Value,
    ) -> OptimizerResult<Box<dyn Optimizer>> {
        if !(overrides.is_null() || overrides.is_object()) {
            return Err(OptimizerError::config(
                algorithm,
                "configuration overrides must be a JSON object",
            ));
        }

        let registration = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(algorithm)
            .cloned()
            .ok_or_else(|| OptimizerError::UnknownAlgorithm(algorithm.to_string()))?;

        registration.check_keys(algorithm, overrides)?;
        let mut config = registration.defaults;
        merge_json(&mut config, overrides);

        let builder = domain
            .and_then(|d| registration.domains.get(d))
            .unwrap_or(&registration.engine);
        builder(&config)
    }

    /// Registered algorithm names, sorted.
    pub fn get_available_algorithms(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// A copy of the default configuration of `algorithm`.
    pub fn get_algorithm_config(&self, algorithm: &str) -> OptimizerResult<Value> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(algorithm)
            .map(|r| r.defaults.clone())
            .ok_or_else(|| OptimizerError::UnknownAlgorithm(algorithm.to_string()))
    }
}

/// Serializes a default config. Plain config structs always serialize.
fn defaults_of<T: Serialize>(config: &T) -> Value {
    serde_json::to_value(config).unwrap_or_else(|_| Value::Object(Default::default()))
}
