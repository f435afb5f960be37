//! GA configuration.
//!
//! [`GeneticConfig`] holds all parameters that control the evolutionary loop.

use serde::{Deserialize, Serialize};

use crate::optimizer::{OptimizerError, OptimizerResult};

const ENGINE: &str = "genetic_algorithm";

/// Configuration for [`GeneticAlgorithm`](super::GeneticAlgorithm).
///
/// Field names double as the option names accepted by the optimizer
/// factory.
///
/// # Defaults
///
/// ```
/// use league_opt::ga::GeneticConfig;
///
/// let config = GeneticConfig::default();
/// assert_eq!(config.population_size, 50);
/// assert_eq!(config.elite_count, 2);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use league_opt::ga::GeneticConfig;
///
/// let config = GeneticConfig::default()
///     .with_population_size(80)
///     .with_tournament_size(5)
///     .with_elite_count(4)
///     .with_mutation_rate(0.2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Number of individuals in the population. At least 2.
    pub population_size: usize,

    /// Individuals copied unchanged into the next generation.
    ///
    /// With at least one elite the per-generation best fitness never
    /// decreases.
    pub elite_count: usize,

    /// Individuals sampled per tournament.
    pub tournament_size: usize,

    /// Probability of recombining a parent pair (0.0–1.0).
    ///
    /// When crossover is not applied, the parents are cloned.
    pub crossover_rate: f64,

    /// Base probability of mutating an offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Maximum number of generations.
    pub max_generations: usize,

    /// Consecutive generations without a strictly better best fitness
    /// before stopping.
    pub max_no_improvement: usize,

    /// Scale the mutation rate with population diversity.
    pub adaptive_mutation: bool,

    /// Consecutive infeasible candidates tolerated for one population slot
    /// before falling back to a clone of a feasible individual.
    pub max_regeneration_attempts: usize,

    /// Evaluate offspring in parallel (requires the `parallel` feature).
    pub parallel: bool,

    /// RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            elite_count: 2,
            tournament_size: 3,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            max_generations: 100,
            max_no_improvement: 20,
            adaptive_mutation: true,
            max_regeneration_attempts: 100,
            parallel: false,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_max_no_improvement(mut self, n: usize) -> Self {
        self.max_no_improvement = n;
        self
    }

    pub fn with_adaptive_mutation(mut self, enabled: bool) -> Self {
        self.adaptive_mutation = enabled;
        self
    }

    pub fn with_max_regeneration_attempts(mut self, n: usize) -> Self {
        self.max_regeneration_attempts = n;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    ///
    /// Rates outside [0, 1] are rejected rather than clamped so that a typo
    /// in a JSON override surfaces before any work begins.
    pub fn validate(&self) -> OptimizerResult<()> {
        if self.population_size < 2 {
            return Err(OptimizerError::config(ENGINE, "population_size must be at least 2"));
        }
        if self.elite_count >= self.population_size {
            return Err(OptimizerError::config(
                ENGINE,
                format!(
                    "elite_count must be below population_size ({} >= {})",
                    self.elite_count, self.population_size
                ),
            ));
        }
        if self.tournament_size == 0 {
            return Err(OptimizerError::config(ENGINE, "tournament_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(OptimizerError::config(
                ENGINE,
                format!("crossover_rate must be in [0, 1], got {}", self.crossover_rate),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(OptimizerError::config(
                ENGINE,
                format!("mutation_rate must be in [0, 1], got {}", self.mutation_rate),
            ));
        }
        if self.max_generations == 0 {
            return Err(OptimizerError::config(ENGINE, "max_generations must be at least 1"));
        }
        if self.max_no_improvement == 0 {
            return Err(OptimizerError::config(ENGINE, "max_no_improvement must be at least 1"));
        }
        if self.max_regeneration_attempts == 0 {
            return Err(OptimizerError::config(
                ENGINE,
                "max_regeneration_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneticConfig::default();
        assert_eq!(config.population_size, 50);
        assert_eq!(config.elite_count, 2);
        assert_eq!(config.tournament_size, 3);
        assert!((config.crossover_rate - 0.8).abs() < 1e-10);
        assert!((config.mutation_rate - 0.1).abs() < 1e-10);
        assert_eq!(config.max_generations, 100);
        assert_eq!(config.max_no_improvement, 20);
        assert!(config.adaptive_mutation);
        assert!(!config.parallel);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GeneticConfig::default()
            .with_population_size(200)
            .with_max_generations(1000)
            .with_elite_count(10)
            .with_crossover_rate(0.7)
            .with_mutation_rate(0.05)
            .with_max_no_improvement(100)
            .with_adaptive_mutation(false)
            .with_seed(42);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.elite_count, 10);
        assert!((config.crossover_rate - 0.7).abs() < 1e-10);
        assert!((config.mutation_rate - 0.05).abs() < 1e-10);
        assert_eq!(config.max_no_improvement, 100);
        assert!(!config.adaptive_mutation);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_validate_ok() {
        assert!(GeneticConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_population_too_small() {
        let config = GeneticConfig::default().with_population_size(1).with_elite_count(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_elite_fills_population() {
        let config = GeneticConfig::default()
            .with_population_size(10)
            .with_elite_count(10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_elites_allowed() {
        assert!(GeneticConfig::default().with_elite_count(0).validate().is_ok());
    }

    #[test]
    fn test_validate_rates_out_of_range() {
        assert!(GeneticConfig::default().with_crossover_rate(1.5).validate().is_err());
        assert!(GeneticConfig::default().with_mutation_rate(-0.1).validate().is_err());
    }

    #[test]
    fn test_validate_zero_tournament() {
        assert!(GeneticConfig::default().with_tournament_size(0).validate().is_err());
    }

    #[test]
    fn test_validate_zero_generations() {
        assert!(GeneticConfig::default().with_max_generations(0).validate().is_err());
        assert!(GeneticConfig::default().with_max_no_improvement(0).validate().is_err());
    }
}
