//! SA configuration.

use serde::{Deserialize, Serialize};

use crate::optimizer::{OptimizerError, OptimizerResult};

const ENGINE: &str = "simulated_annealing";

/// Configuration for [`SimulatedAnnealing`](super::SimulatedAnnealing).
///
/// Field names double as the option names accepted by the optimizer
/// factory, so a JSON override such as `{"cooling_rate": 0.9}` maps
/// directly onto this struct.
///
/// # Examples
///
/// ```
/// use league_opt::sa::AnnealingConfig;
///
/// let config = AnnealingConfig::default()
///     .with_initial_temperature(50.0)
///     .with_cooling_rate(0.9)
///     .with_iterations_per_temp(20)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Starting temperature. Higher values accept more worsening moves early.
    pub initial_temperature: f64,

    /// Geometric cooling factor in (0, 1): `T_{k+1} = rate * T_k`.
    pub cooling_rate: f64,

    /// Proposals evaluated at each temperature level.
    pub iterations_per_temp: usize,

    /// The run stops once the temperature drops below this.
    pub min_temperature: f64,

    /// Consecutive levels without a new best before the search jumps back
    /// to the best-ever solution and reheats.
    pub restart_threshold: usize,

    /// Hard budget on total proposals.
    pub max_iterations: usize,

    /// Consecutive proposals without a new best before stopping.
    pub early_stopping_threshold: usize,

    /// Adjust the cooling rate from the acceptance ratio of the last level.
    pub adaptive_cooling: bool,

    /// Reheat temperature as a fraction of `initial_temperature`.
    pub reheat_factor: f64,

    /// RNG seed. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            cooling_rate: 0.95,
            iterations_per_temp: 100,
            min_temperature: 0.01,
            restart_threshold: 5,
            max_iterations: 10_000,
            early_stopping_threshold: 1_000,
            adaptive_cooling: true,
            reheat_factor: 0.5,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    pub fn with_iterations_per_temp(mut self, n: usize) -> Self {
        self.iterations_per_temp = n;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_restart_threshold(mut self, levels: usize) -> Self {
        self.restart_threshold = levels;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_early_stopping_threshold(mut self, n: usize) -> Self {
        self.early_stopping_threshold = n;
        self
    }

    pub fn with_adaptive_cooling(mut self, enabled: bool) -> Self {
        self.adaptive_cooling = enabled;
        self
    }

    pub fn with_reheat_factor(mut self, factor: f64) -> Self {
        self.reheat_factor = factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> OptimizerResult<()> {
        if !(self.initial_temperature > 0.0) {
            return Err(OptimizerError::config(ENGINE, "initial_temperature must be positive"));
        }
        if !(self.min_temperature > 0.0) {
            return Err(OptimizerError::config(ENGINE, "min_temperature must be positive"));
        }
        if self.min_temperature >= self.initial_temperature {
            return Err(OptimizerError::config(
                ENGINE,
                "min_temperature must be less than initial_temperature",
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(OptimizerError::config(
                ENGINE,
                format!("cooling_rate must be in (0, 1), got {}", self.cooling_rate),
            ));
        }
        if self.iterations_per_temp == 0 {
            return Err(OptimizerError::config(ENGINE, "iterations_per_temp must be at least 1"));
        }
        if self.restart_threshold == 0 {
            return Err(OptimizerError::config(ENGINE, "restart_threshold must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(OptimizerError::config(ENGINE, "max_iterations must be at least 1"));
        }
        if self.early_stopping_threshold == 0 {
            return Err(OptimizerError::config(
                ENGINE,
                "early_stopping_threshold must be at least 1",
            ));
        }
        if !(self.reheat_factor > 0.0 && self.reheat_factor <= 1.0) {
            return Err(OptimizerError::config(ENGINE, "reheat_factor must be in (0, 1]"));
        }
        Ok(())
    }
}
