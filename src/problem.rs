//! Search problem contract shared by every engine.
//!
//! An engine only sees a candidate type `S` and a [`SearchProblem<S>`]. The
//! problem decides how candidates are scored, created, perturbed and
//! recombined; the engine owns temperature, population and RNG state for the
//! duration of a single `optimize` call.
//!
//! # Maximization
//!
//! Fitness is a score: **higher is better** everywhere in this crate.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::ga::GeneticStats;
use crate::sa::AnnealingStats;

/// Defines a stochastic search problem over candidates of type `S`.
///
/// The trait is object safe so that engines built by the optimizer factory
/// can be driven through `&dyn SearchProblem<S>`.
pub trait SearchProblem<S>: Send + Sync {
    /// Scores a candidate. Higher is better.
    fn fitness(&self, candidate: &S) -> f64;

    /// Creates a fresh candidate, used to seed a population.
    fn create_candidate(&self, rng: &mut dyn RngCore) -> S;

    /// Produces a neighbor of `candidate`.
    fn mutate(&self, candidate: &S, rng: &mut dyn RngCore) -> S;

    /// Recombines two parents into two offspring.
    ///
    /// Returns `None` when the problem has no crossover; the engine then
    /// clones the parents.
    fn crossover(&self, _parent1: &S, _parent2: &S, _rng: &mut dyn RngCore) -> Option<(S, S)> {
        None
    }

    /// Whether a candidate is feasible. Invalid candidates are discarded
    /// and regenerated.
    fn is_valid(&self, _candidate: &S) -> bool {
        true
    }
}

type FitnessFn<S> = Box<dyn Fn(&S) -> f64 + Send + Sync>;
type CreateFn<S> = Box<dyn Fn(&mut dyn RngCore) -> S + Send + Sync>;
type MutateFn<S> = Box<dyn Fn(&S, &mut dyn RngCore) -> S + Send + Sync>;
type CrossoverFn<S> = Box<dyn Fn(&S, &S, &mut dyn RngCore) -> (S, S) + Send + Sync>;
type ValidFn<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;

/// A [`SearchProblem`] assembled from plain closures.
///
/// # Examples
///
/// ```
/// use league_opt::problem::FnProblem;
/// use rand::Rng;
///
/// let problem = FnProblem::new(
///     |x: &f64| -(x * x),
///     |rng| rng.random_range(-10.0..10.0),
///     |x, rng| x + rng.random_range(-1.0..1.0),
/// )
/// .with_validity(|x| x.abs() <= 10.0);
/// ```
pub struct FnProblem<S> {
    fitness: FitnessFn<S>,
    create: CreateFn<S>,
    mutate: MutateFn<S>,
    crossover: Option<CrossoverFn<S>>,
    is_valid: Option<ValidFn<S>>,
}

impl<S> FnProblem<S> {
    pub fn new<F, C, M>(fitness: F, create: C, mutate: M) -> Self
    where
        F: Fn(&S) -> f64 + Send + Sync + 'static,
        C: Fn(&mut dyn RngCore) -> S + Send + Sync + 'static,
        M: Fn(&S, &mut dyn RngCore) -> S + Send + Sync + 'static,
    {
        Self {
            fitness: Box::new(fitness),
            create: Box::new(create),
            mutate: Box::new(mutate),
            crossover: None,
            is_valid: None,
        }
    }

    pub fn with_crossover<X>(mut self, crossover: X) -> Self
    where
        X: Fn(&S, &S, &mut dyn RngCore) -> (S, S) + Send + Sync + 'static,
    {
        self.crossover = Some(Box::new(crossover));
        self
    }

    pub fn with_validity<V>(mut self, is_valid: V) -> Self
    where
        V: Fn(&S) -> bool + Send + Sync + 'static,
    {
        self.is_valid = Some(Box::new(is_valid));
        self
    }
}

impl<S> SearchProblem<S> for FnProblem<S> {
    fn fitness(&self, candidate: &S) -> f64 {
        (self.fitness)(candidate)
    }

    fn create_candidate(&self, rng: &mut dyn RngCore) -> S {
        (self.create)(rng)
    }

    fn mutate(&self, candidate: &S, rng: &mut dyn RngCore) -> S {
        (self.mutate)(candidate, rng)
    }

    fn crossover(&self, parent1: &S, parent2: &S, rng: &mut dyn RngCore) -> Option<(S, S)> {
        self.crossover.as_ref().map(|f| f(parent1, parent2, rng))
    }

    fn is_valid(&self, candidate: &S) -> bool {
        self.is_valid.as_ref().is_none_or(|f| f(candidate))
    }
}

/// Engine-specific statistics attached to a [`SearchOutcome`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum SearchStats {
    Annealing(AnnealingStats),
    Genetic(GeneticStats),
}

/// Result of a single `optimize` call.
#[derive(Debug, Clone)]
pub struct SearchOutcome<S> {
    /// Best candidate seen during the run.
    pub solution: S,

    /// Fitness of `solution`. Never below `initial_fitness`.
    pub fitness: f64,

    /// Fitness of the caller-supplied initial solution.
    pub initial_fitness: f64,

    /// Relative improvement in percent (absolute delta when the initial
    /// fitness is zero).
    pub improvement: f64,

    pub stats: SearchStats,
}

/// Improvement of `fitness` over `initial`, see [`SearchOutcome::improvement`].
pub fn improvement(initial: f64, fitness: f64) -> f64 {
    if initial.abs() > f64::EPSILON {
        (fitness - initial) / initial.abs() * 100.0
    } else {
        fitness - initial
    }
}

/// Creates the per-run RNG. A fixed seed makes a run reproducible.
pub(crate) fn create_rng(seed: Option<u64>) -> rand::rngs::StdRng {
    use rand::SeedableRng;
    match seed {
        Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
        None => rand::rngs::StdRng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_fn_problem_defaults() {
        let problem = FnProblem::new(|x: &i32| *x as f64, |_| 0, |x, _| x + 1);
        let mut rng = create_rng(Some(1));
        assert!(problem.is_valid(&5));
        assert!(problem.crossover(&1, &2, &mut rng).is_none());
        assert_eq!(problem.mutate(&1, &mut rng), 2);
        assert!((problem.fitness(&3) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_fn_problem_custom_operators() {
        let problem = FnProblem::new(
            |x: &i32| *x as f64,
            |rng| rng.random_range(0..10),
            |x, _| *x,
        )
        .with_crossover(|a, b, _| (*b, *a))
        .with_validity(|x| *x >= 0);

        let mut rng = create_rng(Some(7));
        assert_eq!(problem.crossover(&1, &2, &mut rng), Some((2, 1)));
        assert!(!problem.is_valid(&-1));
        let created = problem.create_candidate(&mut rng);
        assert!((0..10).contains(&created));
    }

    #[test]
    fn test_improvement() {
        assert!((improvement(100.0, 110.0) - 10.0).abs() < 1e-12);
        assert!((improvement(-50.0, -25.0) - 50.0).abs() < 1e-12);
        assert!((improvement(0.0, 3.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = create_rng(Some(42));
        let mut b = create_rng(Some(42));
        let xs: Vec<u32> = (0..5).map(|_| a.random()).collect();
        let ys: Vec<u32> = (0..5).map(|_| b.random()).collect();
        assert_eq!(xs, ys);
    }
}
