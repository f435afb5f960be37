//! Genetic Algorithm framework.
//!
//! A generic GA over any [`SearchProblem`](crate::problem::SearchProblem).
//! The problem supplies candidate creation, scoring, mutation and optional
//! crossover; the engine owns the population.
//!
//! # Key Types
//!
//! - [`GeneticConfig`]: Algorithm parameters (population, elitism, rates)
//! - [`GeneticAlgorithm`]: Executes the evolutionary loop
//! - [`GeneticStats`] / [`GenerationStats`]: Run and per-generation statistics
//!
//! # Invariants
//!
//! - The population holds exactly `population_size` individuals at the end
//!   of every generation.
//! - With `elite_count >= 1` the per-generation best fitness never decreases.
//! - The returned solution is the best ever seen, so it is never worse than
//!   the initial solution.
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*

mod config;
mod runner;
mod selection;
mod types;

pub use config::GeneticConfig;
pub use runner::{GenerationStats, GeneticAlgorithm, GeneticStats};
pub use selection::{adaptive_mutation_rate, diversity, tournament};
pub use types::Individual;
