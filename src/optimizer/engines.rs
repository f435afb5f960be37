//! [`Optimizer`] impls for the base engines.

use serde_json::Value;

use super::{Optimizer, GENETIC_ALGORITHM, SIMULATED_ANNEALING};
use crate::ga::GeneticAlgorithm;
use crate::sa::SimulatedAnnealing;

impl Optimizer for SimulatedAnnealing {
    fn algorithm(&self) -> &str {
        SIMULATED_ANNEALING
    }

    fn effective_config(&self) -> Value {
        serde_json::to_value(self.config()).unwrap_or_default()
    }
}

impl Optimizer for GeneticAlgorithm {
    fn algorithm(&self) -> &str {
        GENETIC_ALGORITHM
    }

    fn effective_config(&self) -> Value {
        serde_json::to_value(self.config()).unwrap_or_default()
    }
}
