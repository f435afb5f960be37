//! Population members.

use std::cmp::Ordering;

/// A (fitness, candidate) pair in the GA population.
///
/// Fitness is computed once, when the individual enters the population.
#[derive(Debug, Clone)]
pub struct Individual<S> {
    pub fitness: f64,
    pub candidate: S,
}

impl<S> Individual<S> {
    pub fn new(candidate: S, fitness: f64) -> Self {
        Self { fitness, candidate }
    }

    /// Orders individuals best-first (descending fitness). NaN sorts last.
    pub(crate) fn best_first(a: &Self, b: &Self) -> Ordering {
        b.fitness.total_cmp(&a.fitness)
    }
}

/// Index of the fittest individual. `None` for an empty population.
pub(crate) fn fittest<S>(population: &[Individual<S>]) -> Option<usize> {
    population
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.fitness.total_cmp(&b.fitness))
        .map(|(i, _)| i)
}

/// Mean fitness of the population.
pub(crate) fn mean_fitness<S>(population: &[Individual<S>]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(|ind| ind.fitness).sum::<f64>() / population.len() as f64
}
